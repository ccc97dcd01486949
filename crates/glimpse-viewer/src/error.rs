use glimpse_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ViewerError>;

#[derive(Debug, Clone, Error)]
pub enum ViewerError {
    #[error("stored payload for {code} is not valid JSON: {reason}")]
    CorruptPayload { code: String, reason: String },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
