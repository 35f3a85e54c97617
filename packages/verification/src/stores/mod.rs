//! Score store implementations.
//!
//! - `MemoryScoreStore` - in-process, for tests and offline runs
//! - `SqliteScoreStore` - file-backed (feature `sqlite`)

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemoryScoreStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteScoreStore;
