use thiserror::Error;

/// Failures surfaced by the storage facade.
///
/// Operation errors wrap the provider's native message verbatim; nothing
/// is retried at this layer. `NotFound` is split out from the generic
/// download failure so the HTTP layer can answer 404 instead of 500.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No provider resolved, or construction was skipped entirely.
    /// Fatal to the facade, never to the process.
    #[error("storage is not configured: {0}")]
    NotConfigured(String),

    /// The requested object does not exist in the bucket/container.
    #[error("object '{0}' not found")]
    NotFound(String),

    #[error("upload of '{key}' failed: {message}")]
    Upload { key: String, message: String },

    #[error("download of '{key}' failed: {message}")]
    Download { key: String, message: String },

    #[error("listing objects failed: {0}")]
    List(String),
}

impl StorageError {
    pub(crate) fn upload(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Upload {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn download(key: impl Into<String>, message: impl ToString) -> Self {
        StorageError::Download {
            key: key.into(),
            message: message.to_string(),
        }
    }
}
