use crate::code::Code;
use crate::entry::{ConsumeOutcome, Entry, NewEntry};
use crate::error::StorageError;
use async_trait::async_trait;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only view of a repository.
///
/// Nothing here touches view state. The public read path must go through
/// [`Repository::try_consume`] instead of [`ReadRepository::get`].
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Retrieves the entry for a given code without consuming a view.
    /// Returns `None` if the code does not exist.
    async fn get(&self, code: &Code) -> Result<Option<Entry>>;

    /// Checks whether a code is already taken, exhausted entries included.
    async fn exists(&self, code: &Code) -> Result<bool>;
}

#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a new entry with zero views.
    ///
    /// Returns `Err(DuplicateCode)` if the code already exists. This is the
    /// authoritative uniqueness guard, whatever the generator checked before.
    async fn insert(&self, code: &Code, entry: NewEntry) -> Result<()>;

    /// Atomically takes one view of the entry if one is left.
    ///
    /// The availability check and the increment happen as one step with
    /// respect to every other operation on the same code. Over an entry's
    /// lifetime exactly `max_views` calls return
    /// [`ConsumeOutcome::Consumed`].
    async fn try_consume(&self, code: &Code) -> Result<ConsumeOutcome>;
}
