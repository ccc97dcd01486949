use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Symbols a code may contain: uppercase ASCII letters followed by digits.
pub const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Length of codes allocated when nothing else is configured.
pub const DEFAULT_CODE_LENGTH: usize = 6;

const MIN_LENGTH: usize = 1;
/// Longest code accepted by [`Code::parse`] and by the generators.
pub const MAX_CODE_LENGTH: usize = 32;

/// A short capability token identifying one entry.
///
/// Codes are 1-32 characters drawn from [`ALPHABET`]. Anyone holding a
/// code can consume a view of its entry, so generated codes come from a
/// cryptographically strong source.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Code(String);

impl Code {
    /// Validates a caller supplied code.
    ///
    /// Matching is case-sensitive: `abc123` is rejected, `ABC123` is not.
    pub fn parse(code: impl Into<String>) -> Result<Self, CoreError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self(code))
    }

    /// Creates a `Code` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources, such as
    /// the generators or rows already read back from storage.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of symbols in the code.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns whether `byte` belongs to [`ALPHABET`].
    pub fn is_symbol(byte: u8) -> bool {
        byte.is_ascii_uppercase() || byte.is_ascii_digit()
    }

    fn validate(code: &str) -> Result<(), CoreError> {
        if code.len() < MIN_LENGTH || code.len() > MAX_CODE_LENGTH {
            return Err(CoreError::InvalidCode(format!(
                "length must be between {} and {}, got {}",
                MIN_LENGTH,
                MAX_CODE_LENGTH,
                code.len()
            )));
        }

        if !code.bytes().all(Self::is_symbol) {
            return Err(CoreError::InvalidCode(format!(
                "must contain only uppercase letters or digits: '{}'",
                code
            )));
        }

        Ok(())
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Code {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Code> for String {
    fn from(code: Code) -> Self {
        code.0
    }
}
