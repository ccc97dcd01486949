use crate::error::{GeneratorError, Result};
use crate::Generator;
use glimpse_core::code::{ALPHABET, DEFAULT_CODE_LENGTH, MAX_CODE_LENGTH};
use glimpse_core::Code;
use rand::rngs::OsRng;
use rand::TryRngCore;

/// Bytes at or above this value are rejected so that `byte % 36` is uniform.
const ACCEPT_BELOW: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Bytes pulled from the OS per refill.
const BATCH_SIZE: usize = 64;

pub(crate) fn check_length(length: usize) -> Result<()> {
    if length == 0 || length > MAX_CODE_LENGTH {
        return Err(GeneratorError::InvalidLength {
            length,
            max: MAX_CODE_LENGTH,
        });
    }
    Ok(())
}

/// Draws one random code of `length` symbols from the operating system's
/// CSPRNG.
pub fn generate_code(length: usize) -> Result<Code> {
    check_length(length)?;

    let mut code = String::with_capacity(length);
    let mut batch = [0u8; BATCH_SIZE];

    while code.len() < length {
        OsRng
            .try_fill_bytes(&mut batch)
            .map_err(|e| GeneratorError::Entropy(e.to_string()))?;

        for byte in batch.iter().copied().filter(|b| *b < ACCEPT_BELOW) {
            code.push(ALPHABET[byte as usize % ALPHABET.len()] as char);
            if code.len() == length {
                break;
            }
        }
    }

    Ok(Code::new_unchecked(code))
}

/// Generates unpredictable codes of a fixed length.
///
/// Codes double as capability tokens, so symbols come straight from
/// [`OsRng`] rather than a general purpose PRNG.
#[derive(Debug, Clone, Copy)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new(length: usize) -> Result<Self> {
        check_length(length)?;
        Ok(Self { length })
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    fn generate(&self) -> Result<Code> {
        generate_code(self.length)
    }

    fn code_length(&self) -> usize {
        self.length
    }
}
