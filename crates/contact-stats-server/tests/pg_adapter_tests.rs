//! Integration tests for the PostgreSQL store and notifier
//!
//! These tests run against a PostgreSQL container and verify:
//! - Records survive a save/find round trip with full key precision
//! - Duplicate keys are reported
//! - `pg_notify` events reach a listener on the configured channel
//! - The full pipeline over both PostgreSQL adapters

use chrono::{TimeZone, Utc};
use contact_stats_common::{CandidateStats, ContactCounters, ContactStats, IntegrityChecker};
use contact_stats_server::{
    db::{PgNotifier, PgStatsStore},
    pipeline::{StatsNotifier, StatsPipeline, StatsStore, StoreError},
};
use serial_test::serial;
use std::sync::Arc;
use std::time::Duration;

mod common;
use common::TestPostgres;

const CHANNEL: &str = "contact_stats_events";

fn record(nanos: u32) -> ContactStats {
    let counters = ContactCounters::new(250, 25, 10, 100, 100, 7, 8);
    let checksum = IntegrityChecker::default().compute_checksum(&counters);
    CandidateStats::new(counters, checksum)
        .stamp(Utc.timestamp_opt(1_740_837_909, nanos).unwrap())
}

#[tokio::test]
#[serial]
#[ignore] // Requires Docker
async fn test_store_round_trip_keeps_nanoseconds() {
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let store = PgStatsStore::new(pg.pool_clone());

    let original = record(123_456_789);
    let saved = store.save(original.clone()).await.unwrap();
    assert_eq!(saved, original);

    let found = store.find_by_key(&original.key()).await.unwrap();
    assert_eq!(found, Some(original));
}

#[tokio::test]
#[serial]
#[ignore] // Requires Docker
async fn test_store_find_missing() {
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let store = PgStatsStore::new(pg.pool_clone());

    let found = store.find_by_key(&record(1).key()).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
#[serial]
#[ignore] // Requires Docker
async fn test_store_duplicate_key() {
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let store = PgStatsStore::new(pg.pool_clone());

    store.save(record(42)).await.unwrap();
    let result = store.save(record(42)).await;

    assert!(matches!(result, Err(StoreError::DuplicateKey(_))));
}

#[tokio::test]
#[serial]
#[ignore] // Requires Docker
async fn test_notifier_reaches_listener() {
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let notifier = PgNotifier::new(pg.pool_clone(), CHANNEL);
    let mut listener = notifier.listener().await.unwrap();

    let published = record(7);
    notifier.publish(&published).await.unwrap();

    let notification = tokio::time::timeout(Duration::from_secs(5), listener.recv())
        .await
        .expect("notification within timeout")
        .unwrap();

    assert_eq!(notification.channel(), CHANNEL);
    let received: ContactStats = serde_json::from_str(notification.payload()).unwrap();
    assert_eq!(received, published);
}

#[tokio::test]
#[serial]
#[ignore] // Requires Docker
async fn test_pipeline_over_postgres_adapters() {
    let pg = TestPostgres::start().await.expect("Failed to start PostgreSQL");
    let notifier = Arc::new(PgNotifier::new(pg.pool_clone(), CHANNEL));
    let mut listener = notifier.listener().await.unwrap();

    let pipeline = StatsPipeline::new(
        IntegrityChecker::default(),
        Arc::new(PgStatsStore::new(pg.pool_clone())),
        notifier,
    );

    let counters = ContactCounters::new(3, 1, 1, 1, 0, 0, 0);
    let checksum = pipeline.checker().compute_checksum(&counters);
    let saved = pipeline
        .process(Some(CandidateStats::new(counters, checksum)))
        .await
        .unwrap();

    let found = pipeline.find_by_key(&saved.key()).await.unwrap();
    assert_eq!(found, Some(saved.clone()));

    let notification = tokio::time::timeout(Duration::from_secs(5), listener.recv())
        .await
        .expect("notification within timeout")
        .unwrap();
    let received: ContactStats = serde_json::from_str(notification.payload()).unwrap();
    assert_eq!(received, saved);
}
