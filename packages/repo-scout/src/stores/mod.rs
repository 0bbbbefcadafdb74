//! Storage implementations for repository records.
//!
//! Available backends:
//! - `SqliteStore` - SQLite file-based storage, shared across runs
//! - `MemoryStore` - In-memory storage with the same semantics

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
