use crate::error::Result;
use crate::random::check_length;
use crate::Generator;
use glimpse_core::code::ALPHABET;
use glimpse_core::Code;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic code generator using a sequential counter.
///
/// This generator produces codes like "AAAAAA", "AAAAAB", ... by writing the
/// counter in base 36 over the code alphabet. The counter wraps once the
/// keyspace of the configured length is used up.
///
/// The output is trivially guessable. It exists for fixtures and tests,
/// never for codes handed out to readers.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    length: usize,
}

impl Clone for SeqGenerator {
    fn clone(&self) -> Self {
        Self {
            counter: AtomicU64::new(self.counter.load(Ordering::SeqCst)),
            length: self.length,
        }
    }
}

impl SeqGenerator {
    /// Creates a generator starting from the first code of the keyspace.
    pub fn new(length: usize) -> Result<Self> {
        Self::with_offset(length, 0)
    }

    /// Creates a generator starting from a specific counter value.
    pub fn with_offset(length: usize, offset: u64) -> Result<Self> {
        check_length(length)?;
        Ok(Self {
            counter: AtomicU64::new(offset),
            length,
        })
    }

    fn encode(&self, mut value: u64) -> String {
        let base = ALPHABET.len() as u64;
        let mut symbols = vec![ALPHABET[0]; self.length];
        for slot in symbols.iter_mut().rev() {
            *slot = ALPHABET[(value % base) as usize];
            value /= base;
        }
        symbols.into_iter().map(char::from).collect()
    }
}

impl Generator for SeqGenerator {
    fn generate(&self) -> Result<Code> {
        let count = self.counter.fetch_add(1, Ordering::SeqCst);
        Ok(Code::new_unchecked(self.encode(count)))
    }

    fn code_length(&self) -> usize {
        self.length
    }
}
