//! In-memory record store.
//!
//! Same contract as the SQLite store, useful for tests and dry runs. The
//! uniqueness check and the append happen under one lock.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::schema::Record;
use crate::traits::store::{InsertOutcome, RecordStore};

/// In-memory store keeping records in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Record>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert(&self, record: &Record) -> StoreResult<InsertOutcome> {
        let mut records = self
            .records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if records.iter().any(|r| r.identifier == record.identifier) {
            return Ok(InsertOutcome::AlreadyExists);
        }

        records.push(record.clone());
        Ok(InsertOutcome::Inserted)
    }

    async fn read_all(&self) -> StoreResult<Vec<Record>> {
        let mut records = self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();

        // Stable sort keeps insertion order among equal popularity
        records.sort_by(|a, b| b.popularity.cmp(&a.popularity));
        Ok(records)
    }
}
