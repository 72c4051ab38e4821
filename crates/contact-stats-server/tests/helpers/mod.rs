//! Test helpers for contact stats server integration tests
//!
//! This module provides:
//! - An application router wired with swappable pipeline adapters
//! - Adapters that fail on demand or record what they were given
//! - Request builders and response decoding

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request},
    response::Response,
    Router,
};
use contact_stats_common::{ContactStats, IntegrityChecker, StatsKey};
use contact_stats_server::{
    api::{self, AppState},
    config::{Backend, Config, PipelineConfig},
    pipeline::{
        InMemoryStatsStore, NotifierError, StatsNotifier, StatsPipeline, StatsStore, StoreError,
    },
};
use serde_json::Value;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

/// Checksum of `250,25,10,100,100,7,8`
pub const VALID_CHECKSUM: &str = "5484062a4be1ce5645eb414663e14f59";

pub fn valid_body() -> Value {
    serde_json::json!({
        "totalContactoClientes": 250,
        "motivoReclamo": 25,
        "motivoGarantia": 10,
        "motivoDuda": 100,
        "motivoCompra": 100,
        "motivoFelicitaciones": 7,
        "motivoCambio": 8,
        "hash": VALID_CHECKSUM
    })
}

// ============================================================================
// Adapters
// ============================================================================

/// Store that counts calls and always fails
#[derive(Default)]
pub struct FailingStore {
    pub saves: AtomicUsize,
}

#[async_trait]
impl StatsStore for FailingStore {
    async fn save(&self, _record: ContactStats) -> Result<ContactStats, StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn find_by_key(&self, _key: &StatsKey) -> Result<Option<ContactStats>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Notifier that keeps every published record, or fails every publish
#[derive(Default)]
pub struct RecordingNotifier {
    pub published: Mutex<Vec<ContactStats>>,
    pub attempts: AtomicUsize,
    pub fail: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<ContactStats> {
        self.published.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl StatsNotifier for RecordingNotifier {
    fn channel(&self) -> &str {
        "test_events"
    }

    async fn publish(&self, record: &ContactStats) -> Result<(), NotifierError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(NotifierError::Unavailable("broker unreachable".to_string()));
        }
        self.published
            .lock()
            .expect("notifier lock poisoned")
            .push(record.clone());
        Ok(())
    }
}

// ============================================================================
// Application
// ============================================================================

pub fn memory_config() -> Config {
    Config {
        pipeline: PipelineConfig {
            store_backend: Backend::Memory,
            notifier_backend: Backend::Memory,
            ..PipelineConfig::default()
        },
        ..Config::default()
    }
}

/// Router over the given adapters, with the full middleware stack
pub fn test_app(store: Arc<dyn StatsStore>, notifier: Arc<dyn StatsNotifier>) -> Router {
    let pipeline = Arc::new(StatsPipeline::new(IntegrityChecker::default(), store, notifier));
    api::create_router(AppState::new(pipeline), &memory_config())
}

/// Router over a fresh in-memory store and the given notifier
pub fn in_memory_app(notifier: Arc<RecordingNotifier>) -> (Router, Arc<InMemoryStatsStore>) {
    let store = Arc::new(InMemoryStatsStore::new());
    (test_app(store.clone(), notifier), store)
}

pub fn post_stats(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/v1/stats")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .expect("valid request")
}

pub fn post_json(value: &Value) -> Request<Body> {
    post_stats(value.to_string())
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&bytes).expect("JSON body")
}
