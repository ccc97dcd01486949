use crate::service::ImportSummary;
use glimpse_core::{CoreError, StorageError};
use glimpse_generator::GeneratorError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImportError>;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read {path}: {reason}")]
    Io { path: String, reason: String },
    #[error("invalid JSON on line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },
    #[error("invalid import options: {0}")]
    InvalidOptions(String),
    /// Storage became unreachable. `summary` covers every record before
    /// `entry`; records inserted so far stay stored.
    #[error(
        "import aborted at entry {entry} after {} insertions: {cause}",
        .summary.inserted_count()
    )]
    Aborted {
        entry: usize,
        summary: ImportSummary,
        #[source]
        cause: RecordError,
    },
}

/// Why a single object could not be inserted.
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    #[error("code allocation failed: {0}")]
    Allocation(#[from] GeneratorError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("invalid entry: {0}")]
    Entry(#[from] CoreError),
    #[error("payload serialization failed: {0}")]
    Serialize(String),
}

impl RecordError {
    /// Whether the storage backend could not be reached, which ends the batch.
    pub fn is_unavailable(&self) -> bool {
        match self {
            RecordError::Storage(e) | RecordError::Allocation(GeneratorError::Storage(e)) => {
                e.is_unavailable()
            }
            _ => false,
        }
    }
}
