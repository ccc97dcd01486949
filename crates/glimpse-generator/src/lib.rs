pub mod error;
pub mod random;
pub mod seq;
pub mod unique;

pub use error::GeneratorError;
pub use random::{generate_code, RandomGenerator};
pub use seq::SeqGenerator;
pub use unique::{Allocation, RetryPolicy, UniqueAllocator};

use glimpse_core::code::ALPHABET;
use glimpse_core::Code;

/// Trait for generating candidate codes.
///
/// Implementations are pure generators that don't interact with storage;
/// uniqueness against stored entries is the job of [`UniqueAllocator`].
pub trait Generator: Send + Sync + 'static {
    /// Produces one candidate code. Callers are not required to retry.
    fn generate(&self) -> error::Result<Code>;

    /// Length of every code this generator produces.
    fn code_length(&self) -> usize;

    /// Number of distinct codes of [`Generator::code_length`], saturating at
    /// `u128::MAX`.
    fn keyspace(&self) -> u128 {
        (ALPHABET.len() as u128).saturating_pow(self.code_length() as u32)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn generate(&self) -> error::Result<Code> {
        (**self).generate()
    }

    fn code_length(&self) -> usize {
        (**self).code_length()
    }
}

#[cfg(test)]
mod tests {
    use super::Generator;
    use crate::{RandomGenerator, SeqGenerator};

    #[test]
    fn generators_are_object_safe() {
        let generators: Vec<Box<dyn Generator>> = vec![
            Box::new(RandomGenerator::default()),
            Box::new(SeqGenerator::new(6).unwrap()),
        ];

        for generator in &generators {
            let code = generator.generate().unwrap();
            assert_eq!(code.len(), generator.code_length());
            assert_eq!(generator.keyspace(), 2_176_782_336);
        }
    }
}
