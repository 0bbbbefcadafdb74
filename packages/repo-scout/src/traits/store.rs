//! Record store trait.
//!
//! The store is the only persisted state. It is additive-only: records are
//! inserted once per identifier and never updated or deleted.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::schema::Record;

/// Result of inserting one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The identifier was new and the record is now stored
    Inserted,

    /// A record with this identifier already existed; nothing changed
    AlreadyExists,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a record unless its identifier is already present.
    ///
    /// The uniqueness check and the write happen atomically, so concurrent
    /// inserts of one identifier yield exactly one `Inserted`.
    async fn insert(&self, record: &Record) -> StoreResult<InsertOutcome>;

    /// Every stored record, popularity descending, ties in insertion order.
    async fn read_all(&self) -> StoreResult<Vec<Record>>;
}
