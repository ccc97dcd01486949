use crate::code::Code;
use crate::error::CoreError;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Number of views granted to an entry when the importer is not told otherwise.
pub const DEFAULT_MAX_VIEWS: u32 = 20;

/// A stored entry.
///
/// `views` never exceeds `max_views`. Once they are equal the entry is
/// exhausted and its payload is never returned again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub code: Code,
    /// Opaque serialized payload, never interpreted by storage.
    pub payload: String,
    pub max_views: u32,
    pub views: u32,
    /// When the last successful view happened, `None` before the first one.
    pub last_viewed_at: Option<Timestamp>,
}

impl Entry {
    /// Views still available.
    pub fn remaining(&self) -> u32 {
        self.max_views.saturating_sub(self.views)
    }

    pub fn is_exhausted(&self) -> bool {
        self.views >= self.max_views
    }
}

/// The caller supplied part of an entry, ready to be inserted under a code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    payload: String,
    max_views: u32,
}

impl NewEntry {
    /// Creates a new entry description. `max_views` must be positive.
    pub fn new(payload: impl Into<String>, max_views: u32) -> Result<Self, CoreError> {
        if max_views == 0 {
            return Err(CoreError::InvalidMaxViews(
                "max views must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            payload: payload.into(),
            max_views,
        })
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn max_views(&self) -> u32 {
        self.max_views
    }

    /// Builds the stored form with no views taken yet.
    pub fn into_entry(self, code: Code) -> Entry {
        Entry {
            code,
            payload: self.payload,
            max_views: self.max_views,
            views: 0,
            last_viewed_at: None,
        }
    }
}

/// Result of one atomic consumption attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// No entry exists for the code.
    NotFound,
    /// The entry exists but every view has been used. Nothing was mutated.
    Exhausted,
    /// One view was taken. `remaining` is `max_views - views` right after
    /// this call's increment.
    Consumed { payload: String, remaining: u32 },
}
