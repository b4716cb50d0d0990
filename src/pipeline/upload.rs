//! Document upload: validate the local path and obtain a remote file id.
//!
//! Validation happens locally before any network call so a typo'd path
//! fails in milliseconds with a precise error instead of surfacing as an
//! opaque upload rejection.

use crate::api::AssistantsApi;
use crate::error::ExtractError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Validate a local document path.
///
/// Checks existence, read permission, and non-emptiness. No format
/// sniffing: the service accepts many document types and is the authority
/// on which it can search.
pub fn validate_document(path_str: &str) -> Result<PathBuf, ExtractError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(ExtractError::FileNotFound { path });
    }

    match std::fs::metadata(&path) {
        Ok(meta) => {
            if meta.len() == 0 {
                return Err(ExtractError::EmptyDocument { path });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(ExtractError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(ExtractError::FileNotFound { path });
        }
    }

    // Probe read permission by opening; metadata alone doesn't prove it.
    if let Err(e) = std::fs::File::open(&path) {
        return Err(match e.kind() {
            std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied { path },
            _ => ExtractError::FileNotFound { path },
        });
    }

    debug!("Validated document: {}", path.display());
    Ok(path)
}

/// Upload a validated document and return its remote reference id.
///
/// An empty id in the service's response is treated as a rejection — the
/// uploader never hands an unusable reference to the next stage.
pub async fn upload_document(
    api: &dyn AssistantsApi,
    path: &Path,
) -> Result<String, ExtractError> {
    info!("Uploading document: {}", path.display());
    let file = api.upload_file(path).await?;

    if file.id.is_empty() {
        return Err(ExtractError::UploadRejected {
            detail: "service returned an empty file id".to_string(),
        });
    }

    info!("Uploaded as file id {}", file.id);
    Ok(file.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_path_is_file_not_found() {
        let err = validate_document("/definitely/not/a/real/rfi.docx").unwrap_err();
        assert!(matches!(err, ExtractError::FileNotFound { .. }));
    }

    #[test]
    fn empty_file_is_rejected() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let err = validate_document(tmp.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, ExtractError::EmptyDocument { .. }));
    }

    #[test]
    fn readable_file_passes() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"question one?").unwrap();
        let path = validate_document(tmp.path().to_str().unwrap()).unwrap();
        assert_eq!(path, tmp.path());
    }
}
