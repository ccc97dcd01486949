//! Core types and traits for the Glimpse view-limited store.
//!
//! This crate provides the types shared by the code generator, the storage
//! backends, the viewer service and the batch importer.

pub mod code;
pub mod entry;
pub mod error;
pub mod repository;

pub use code::Code;
pub use entry::{ConsumeOutcome, Entry, NewEntry, DEFAULT_MAX_VIEWS};
pub use error::{CoreError, StorageError};
pub use repository::{ReadRepository, Repository};
