//! Batch importer for the view-limited store.
//!
//! Reads a JSON document (one object, an array, or JSON Lines), allocates a
//! fresh unique code for every object and inserts it with a fixed view
//! budget.

pub mod error;
pub mod service;
pub mod source;

pub use error::{ImportError, RecordError};
pub use service::{
    FailedRecord, ImportOptions, ImportSummary, ImporterService, InsertedRecord, SkippedRecord,
};
pub use source::{load_file, parse_records};
