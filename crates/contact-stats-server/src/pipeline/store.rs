//! Persistence gateway for stats records
//!
//! The pipeline only depends on [`StatsStore`]. The PostgreSQL implementation
//! lives in [`crate::db::stats_store`]; [`InMemoryStatsStore`] backs local runs
//! and tests.

use async_trait::async_trait;
use contact_stats_common::{ContactStats, StatsKey};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Errors a store can report
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("A stats record with key '{0}' already exists")]
    DuplicateKey(StatsKey),

    #[error("Stored stats record is corrupt: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Keyed write/read contract for stats records.
///
/// Implementations must be safe for concurrent use; the pipeline shares one
/// instance across all requests.
#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Durably persist a record under its [`StatsKey`] and return the stored value
    async fn save(&self, record: ContactStats) -> Result<ContactStats, StoreError>;

    /// Point lookup by key
    async fn find_by_key(&self, key: &StatsKey) -> Result<Option<ContactStats>, StoreError>;
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryStatsStore {
    records: RwLock<HashMap<StatsKey, ContactStats>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn save(&self, record: ContactStats) -> Result<ContactStats, StoreError> {
        let key = record.key();
        let mut records = self.records.write().await;

        if records.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }

        records.insert(key, record.clone());
        Ok(record)
    }

    async fn find_by_key(&self, key: &StatsKey) -> Result<Option<ContactStats>, StoreError> {
        Ok(self.records.read().await.get(key).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use contact_stats_common::{CandidateStats, ContactCounters};

    fn record_at(second: u32) -> ContactStats {
        CandidateStats::new(ContactCounters::new(1, 0, 0, 1, 0, 0, 0), "x".repeat(32))
            .stamp(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, second).unwrap())
    }

    #[tokio::test]
    async fn test_save_then_find() {
        let store = InMemoryStatsStore::new();
        let record = record_at(1);

        let saved = store.save(record.clone()).await.unwrap();
        assert_eq!(saved, record);

        let found = store.find_by_key(&record.key()).await.unwrap();
        assert_eq!(found, Some(record));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_missing_key() {
        let store = InMemoryStatsStore::new();
        let found = store.find_by_key(&record_at(2).key()).await.unwrap();
        assert!(found.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_key_rejected() {
        let store = InMemoryStatsStore::new();
        store.save(record_at(3)).await.unwrap();

        let result = store.save(record_at(3)).await;
        assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
        assert_eq!(store.len().await, 1);
    }
}
