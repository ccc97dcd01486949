use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors related to validating core values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid code: {0}")]
    InvalidCode(String),
    #[error("invalid max views: {0}")]
    InvalidMaxViews(String),
}

/// Errors raised by storage backends.
///
/// `NotFound` and `Exhausted` are not errors; they are reported through
/// [`ConsumeOutcome`][crate::entry::ConsumeOutcome].
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("code already exists: {0}")]
    DuplicateCode(String),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}

impl StorageError {
    /// Whether the backend could not be reached at all.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}
