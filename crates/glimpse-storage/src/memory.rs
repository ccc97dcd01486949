use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use glimpse_core::repository::{ReadRepository, Repository, Result};
use glimpse_core::{Code, ConsumeOutcome, Entry, NewEntry, StorageError};
use jiff::Timestamp;
use tracing::trace;

/// In-memory storage slot for one code.
#[derive(Debug, Clone)]
struct Slot {
    payload: String,
    max_views: u32,
    views: u32,
    last_viewed_at: Option<Timestamp>,
}

impl Slot {
    fn to_entry(&self, code: &Code) -> Entry {
        Entry {
            code: code.clone(),
            payload: self.payload.clone(),
            max_views: self.max_views,
            views: self.views,
            last_viewed_at: self.last_viewed_at,
        }
    }
}

/// In-memory implementation of the Repository trait using DashMap.
///
/// DashMap shards its locks, so consumption of one code only blocks
/// operations on codes hashed to the same shard. `try_consume` holds the
/// shard write guard across the check and the increment, which makes it
/// linearizable per code.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    storage: DashMap<String, Slot>,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self {
            storage: DashMap::new(),
        }
    }

    /// Number of stored entries, exhausted ones included.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }
}

#[async_trait]
impl ReadRepository for InMemoryRepository {
    async fn get(&self, code: &Code) -> Result<Option<Entry>> {
        Ok(self
            .storage
            .get(code.as_str())
            .map(|slot| slot.to_entry(code)))
    }

    async fn exists(&self, code: &Code) -> Result<bool> {
        Ok(self.storage.contains_key(code.as_str()))
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn insert(&self, code: &Code, entry: NewEntry) -> Result<()> {
        match self.storage.entry(code.as_str().to_owned()) {
            MapEntry::Occupied(_) => Err(StorageError::DuplicateCode(code.to_string())),
            MapEntry::Vacant(vacant) => {
                vacant.insert(Slot {
                    payload: entry.payload().to_owned(),
                    max_views: entry.max_views(),
                    views: 0,
                    last_viewed_at: None,
                });
                Ok(())
            }
        }
    }

    async fn try_consume(&self, code: &Code) -> Result<ConsumeOutcome> {
        let Some(mut slot) = self.storage.get_mut(code.as_str()) else {
            trace!(code = %code, "consume: not found");
            return Ok(ConsumeOutcome::NotFound);
        };

        if slot.views >= slot.max_views {
            trace!(code = %code, "consume: exhausted");
            return Ok(ConsumeOutcome::Exhausted);
        }

        slot.views += 1;
        slot.last_viewed_at = Some(Timestamp::now());

        Ok(ConsumeOutcome::Consumed {
            payload: slot.payload.clone(),
            remaining: slot.max_views - slot.views,
        })
    }
}
