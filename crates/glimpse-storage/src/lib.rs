mod error;
pub mod memory;
pub mod mysql;
mod row;
pub mod sqlite;

pub use glimpse_core::repository::{ReadRepository, Repository};
pub use glimpse_core::StorageError;
pub use memory::InMemoryRepository;
pub use mysql::MySqlRepository;
pub use sqlite::SqliteRepository;
