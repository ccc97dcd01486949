use crate::error::{GeneratorError, Result};
use crate::Generator;
use glimpse_core::{Code, ReadRepository};
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

const DEFAULT_WARN_AFTER: u32 = 8;

/// How hard [`UniqueAllocator`] tries before giving up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct RetryPolicy {
    /// Upper bound on candidates tried. `None` retries until a code is free.
    #[builder(default, setter(strip_option))]
    max_attempts: Option<u32>,
    /// Attempt count from which each further collision is logged at `warn`.
    #[builder(default = DEFAULT_WARN_AFTER)]
    warn_after: u32,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn warn_after(&self) -> u32 {
        self.warn_after
    }

    /// Whether another attempt is allowed after `attempts` have failed.
    pub fn allows(&self, attempts: u32) -> bool {
        self.max_attempts.is_none_or(|max| attempts < max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A code that was free when it was checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub code: Code,
    /// Candidates drawn to find `code`, including the successful one.
    pub attempts: u32,
}

/// Draws candidates from a [`Generator`] until one is not present in the
/// repository.
///
/// Allocation never inserts. Callers build the full entry and insert it
/// afterwards, and must still handle `DuplicateCode` from the insert since
/// another writer may take the same code in between.
#[derive(Debug, Clone)]
pub struct UniqueAllocator<G> {
    generator: G,
    policy: RetryPolicy,
}

impl<G: Generator> UniqueAllocator<G> {
    pub fn new(generator: G, policy: RetryPolicy) -> Self {
        Self { generator, policy }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Returns a code that does not exist in `repository` at the time of the
    /// check.
    pub async fn allocate<R>(&self, repository: &R) -> Result<Allocation>
    where
        R: ReadRepository + ?Sized,
    {
        let mut attempts = 0u32;

        loop {
            if !self.policy.allows(attempts) {
                warn!(attempts, "giving up on code allocation");
                return Err(GeneratorError::Exhausted { attempts });
            }

            let code = self.generator.generate()?;
            attempts += 1;

            if !repository.exists(&code).await? {
                if attempts > 1 {
                    debug!(code = %code, attempts, "allocated code after collisions");
                }
                return Ok(Allocation { code, attempts });
            }

            if attempts >= self.policy.warn_after {
                warn!(
                    code = %code,
                    attempts,
                    code_length = self.generator.code_length(),
                    keyspace = %self.generator.keyspace(),
                    "code collision, keyspace may be nearly exhausted"
                );
            } else {
                debug!(code = %code, attempts, "code collision, retrying");
            }
        }
    }
}
