//! Persistence: write the question set to disk as pretty-printed JSON.
//!
//! Writes are atomic: the JSON goes to a [`tempfile::NamedTempFile`] in the
//! target directory, then `persist` renames it over the destination, so a
//! crash mid-write never leaves a truncated JSON file behind. Existing
//! files at the target path are overwritten unconditionally, and repeated
//! writes of the same structure are byte-identical — serde_json's pretty
//! printer (2-space indentation) is deterministic and field order is fixed
//! by the structs.

use crate::error::ExtractError;
use crate::output::QuestionSet;
use std::io::Write as _;
use std::path::Path;
use tracing::info;

/// Serialise `question_set` to `path` as pretty-printed JSON.
///
/// Parent directories are created if missing. The file ends with a
/// trailing newline, matching what text tools expect.
pub async fn write_question_set(
    question_set: &QuestionSet,
    path: impl AsRef<Path>,
) -> Result<(), ExtractError> {
    let path = path.as_ref();

    let mut json = serde_json::to_string_pretty(question_set)
        .map_err(|e| ExtractError::Internal(format!("serialise question set: {e}")))?;
    json.push('\n');

    // The temp file must live in the target directory: rename is only
    // atomic within one filesystem.
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(|e| {
        ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        }
    })?;
    tmp.write_all(json.as_bytes())
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
    tmp.persist(path)
        .map_err(|e| ExtractError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    info!("Wrote {} questions to {}", question_set.questions.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> QuestionSet {
        QuestionSet {
            filename: "rfi.docx".into(),
            questions: vec![json!("Q1?"), json!({"section": "Security", "question": "Q2?"})],
        }
    }

    #[tokio::test]
    async fn writes_pretty_json_with_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        write_question_set(&sample(), &path).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("  \"filename\": \"rfi.docx\""));
        assert!(contents.ends_with('\n'));

        let parsed: QuestionSet = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed, sample());
    }

    #[tokio::test]
    async fn repeated_writes_are_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");

        write_question_set(&sample(), &path).await.unwrap();
        let first = std::fs::read(&path).unwrap();
        write_question_set(&sample(), &path).await.unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        std::fs::write(&path, "stale contents").unwrap();

        write_question_set(&sample(), &path).await.unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("stale"));
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/deep/answers.json");
        write_question_set(&sample(), &path).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn unwritable_path_is_an_io_error() {
        let err = write_question_set(&sample(), "/proc/definitely/not/writable.json")
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::OutputWriteFailed { .. }));
    }

    #[tokio::test]
    async fn leaves_only_the_target_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.json");
        write_question_set(&sample(), &path).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec!["answers.json"]);
    }
}
