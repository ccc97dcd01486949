//! Read path of the view-limited store.
//!
//! [`ViewerService`] turns one read request into exactly one atomic
//! [`Repository::try_consume`][glimpse_core::Repository::try_consume] call and
//! decodes the stored payload for the transport layer.
//!
//! ```rust
//! use glimpse_core::{Code, NewEntry, Repository};
//! use glimpse_storage::InMemoryRepository;
//! use glimpse_viewer::{View, ViewerService};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = InMemoryRepository::new();
//! let code = Code::parse("K7Q2ZX")?;
//! repo.insert(&code, NewEntry::new(r#"{"msg":"hi"}"#, 1)?).await?;
//!
//! let service = ViewerService::new(repo);
//! assert!(matches!(service.view(&code).await?, View::Consumed { remaining_views: 0, .. }));
//! assert!(matches!(service.view(&code).await?, View::Exhausted));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod service;
pub mod viewer;

pub use error::{Result, ViewerError};
pub use service::ViewerService;
pub use viewer::{View, Viewer};
