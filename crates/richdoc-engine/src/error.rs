use thiserror::Error;

/// Failures surfaced to the host from editor operations. Content-level
/// problems never reach this type; malformed markup loads fail soft to an
/// empty document instead.
#[derive(Debug, Error)]
pub enum EditorError {
    #[error("media operation failed: {0}")]
    Media(#[from] MediaError),
}

/// Failures from the host-provided media collaborator.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The upload was attempted and rejected or failed in transit.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The host declined to provide an upload path at all.
    #[error("no media collaborator configured")]
    Unsupported,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_errors_wrap_into_editor_errors() {
        let err: EditorError = MediaError::Upload("413 payload too large".to_string()).into();
        assert_eq!(
            err.to_string(),
            "media operation failed: upload failed: 413 payload too large"
        );
    }
}
