//! PostgreSQL-backed stats store
//!
//! Rows live in `contact_stats`, keyed by the record's [`StatsKey`]. Counters
//! are stored as `BIGINT` and converted back to `u32` on read; a row that does
//! not fit is reported as [`StoreError::Corrupt`].

use async_trait::async_trait;
use contact_stats_common::{ContactCounters, ContactStats, StatsKey};
use sqlx::PgPool;

use crate::pipeline::{StatsStore, StoreError};

#[derive(Debug, sqlx::FromRow)]
struct ContactStatsRow {
    stats_key: String,
    total_contacts: i64,
    claim_count: i64,
    warranty_count: i64,
    inquiry_count: i64,
    purchase_count: i64,
    compliment_count: i64,
    exchange_count: i64,
    checksum: String,
}

fn counter(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value)
        .map_err(|_| StoreError::Corrupt(format!("{} value {} is out of range", column, value)))
}

impl TryFrom<ContactStatsRow> for ContactStats {
    type Error = StoreError;

    fn try_from(row: ContactStatsRow) -> Result<Self, Self::Error> {
        // TIMESTAMPTZ keeps microseconds only; the key carries the full stamp.
        let created_at = StatsKey::parse(&row.stats_key)
            .and_then(|key| key.timestamp())
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;

        let counters = ContactCounters::new(
            counter(row.total_contacts, "total_contacts")?,
            counter(row.claim_count, "claim_count")?,
            counter(row.warranty_count, "warranty_count")?,
            counter(row.inquiry_count, "inquiry_count")?,
            counter(row.purchase_count, "purchase_count")?,
            counter(row.compliment_count, "compliment_count")?,
            counter(row.exchange_count, "exchange_count")?,
        );

        Ok(ContactStats::restore(created_at, counters, row.checksum))
    }
}

/// [`StatsStore`] over a `sqlx` PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStatsStore {
    pool: PgPool,
}

impl PgStatsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatsStore for PgStatsStore {
    #[tracing::instrument(skip(self, record), fields(key = %record.key()))]
    async fn save(&self, record: ContactStats) -> Result<ContactStats, StoreError> {
        let key = record.key();
        let counters = record.counters();

        let row = sqlx::query_as::<_, ContactStatsRow>(
            r#"
            INSERT INTO contact_stats (
                stats_key, created_at,
                total_contacts, claim_count, warranty_count, inquiry_count,
                purchase_count, compliment_count, exchange_count,
                checksum
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING stats_key,
                      total_contacts, claim_count, warranty_count, inquiry_count,
                      purchase_count, compliment_count, exchange_count,
                      checksum
            "#,
        )
        .bind(key.as_str())
        .bind(record.created_at())
        .bind(i64::from(counters.total))
        .bind(i64::from(counters.claim))
        .bind(i64::from(counters.warranty))
        .bind(i64::from(counters.inquiry))
        .bind(i64::from(counters.purchase))
        .bind(i64::from(counters.compliment))
        .bind(i64::from(counters.exchange))
        .bind(record.checksum())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::DuplicateKey(key.clone());
                }
            }
            StoreError::Database(e)
        })?;

        tracing::debug!("Stats record inserted");

        ContactStats::try_from(row)
    }

    #[tracing::instrument(skip(self), fields(key = %key))]
    async fn find_by_key(&self, key: &StatsKey) -> Result<Option<ContactStats>, StoreError> {
        let row = sqlx::query_as::<_, ContactStatsRow>(
            r#"
            SELECT stats_key,
                   total_contacts, claim_count, warranty_count, inquiry_count,
                   purchase_count, compliment_count, exchange_count,
                   checksum
            FROM contact_stats
            WHERE stats_key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(ContactStats::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(stats_key: &str, total: i64) -> ContactStatsRow {
        ContactStatsRow {
            stats_key: stats_key.to_string(),
            total_contacts: total,
            claim_count: 25,
            warranty_count: 10,
            inquiry_count: 100,
            purchase_count: 100,
            compliment_count: 7,
            exchange_count: 8,
            checksum: "5484062a4be1ce5645eb414663e14f59".to_string(),
        }
    }

    #[test]
    fn test_row_conversion_keeps_key_precision() {
        let record = ContactStats::try_from(row("2025-03-01T14:05:09.123456789Z", 250)).unwrap();

        assert_eq!(record.key().as_str(), "2025-03-01T14:05:09.123456789Z");
        assert_eq!(record.counters().total, 250);
        assert_eq!(record.counters().exchange, 8);
    }

    #[test]
    fn test_row_conversion_rejects_negative_counter() {
        let result = ContactStats::try_from(row("2025-03-01T14:05:09.000000000Z", -1));
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_row_conversion_rejects_bad_key() {
        let result = ContactStats::try_from(row("not-a-time", 1));
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }
}
