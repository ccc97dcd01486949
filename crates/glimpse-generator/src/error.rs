use glimpse_core::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GeneratorError>;

/// Errors returned by code generation and unique allocation.
#[derive(Debug, Clone, Error)]
pub enum GeneratorError {
    #[error("invalid code length {length}; expected 1..={max}")]
    InvalidLength { length: usize, max: usize },
    #[error("entropy source failed: {0}")]
    Entropy(String),
    #[error("no unused code found after {attempts} attempts")]
    Exhausted { attempts: u32 },
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
