//! Contact stats processing pipeline
//!
//! Every submitted record runs through the same fixed sequence:
//!
//! 1. **Integrity gate**: the caller's checksum must match the counters
//! 2. **Stamp**: the record receives its creation time, which is also its key
//! 3. **Persist**: the record is written through the [`StatsStore`]
//! 4. **Notify**: the persisted record is announced through the [`StatsNotifier`]
//!
//! A step runs only if every earlier step succeeded. There is no compensation:
//! when notification fails the record stays persisted and the failure carries
//! its key so the caller can reconcile.
//!
//! The pipeline is transport-agnostic. HTTP mapping lives in
//! [`crate::features::stats`].

pub mod notifier;
pub mod store;

use chrono::Utc;
use contact_stats_common::{CandidateStats, ContactStats, IntegrityChecker, StatsKey};
use std::sync::Arc;
use thiserror::Error;

pub use notifier::{BroadcastNotifier, NotifierError, StatsNotifier};
pub use store::{InMemoryStatsStore, StatsStore, StoreError};

/// Failure of a pipeline run, tagged by the step that failed
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("request body cannot be empty")]
    MalformedInput,

    #[error("invalid checksum")]
    IntegrityViolation,

    #[error("failed to persist stats record: {0}")]
    PersistenceFailure(#[source] StoreError),

    #[error("stats record {key} was saved but the notification failed: {source}")]
    NotificationFailure {
        key: StatsKey,
        #[source]
        source: NotifierError,
    },
}

/// Coarse classification of a [`PipelineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedInput,
    IntegrityViolation,
    PersistenceFailure,
    NotificationFailure,
}

impl ErrorKind {
    /// Whether the caller caused the failure and should not retry unchanged
    pub fn is_client_fault(&self) -> bool {
        matches!(self, ErrorKind::MalformedInput | ErrorKind::IntegrityViolation)
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::MalformedInput => "MALFORMED_INPUT",
            ErrorKind::IntegrityViolation => "INTEGRITY_VIOLATION",
            ErrorKind::PersistenceFailure => "PERSISTENCE_FAILURE",
            ErrorKind::NotificationFailure => "NOTIFICATION_FAILURE",
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MalformedInput => ErrorKind::MalformedInput,
            PipelineError::IntegrityViolation => ErrorKind::IntegrityViolation,
            PipelineError::PersistenceFailure(_) => ErrorKind::PersistenceFailure,
            PipelineError::NotificationFailure { .. } => ErrorKind::NotificationFailure,
        }
    }

    /// Key of a record that was persisted before the run failed
    pub fn saved_key(&self) -> Option<&StatsKey> {
        match self {
            PipelineError::NotificationFailure { key, .. } => Some(key),
            _ => None,
        }
    }
}

/// Verify → stamp → persist → notify, over injected gateways.
///
/// Cheap to clone; clones share the same store and notifier.
#[derive(Clone)]
pub struct StatsPipeline {
    checker: IntegrityChecker,
    store: Arc<dyn StatsStore>,
    notifier: Arc<dyn StatsNotifier>,
}

impl StatsPipeline {
    pub fn new(
        checker: IntegrityChecker,
        store: Arc<dyn StatsStore>,
        notifier: Arc<dyn StatsNotifier>,
    ) -> Self {
        Self {
            checker,
            store,
            notifier,
        }
    }

    pub fn checker(&self) -> &IntegrityChecker {
        &self.checker
    }

    pub fn notifier_channel(&self) -> &str {
        self.notifier.channel()
    }

    /// Run one candidate through the pipeline.
    ///
    /// Returns the persisted, notified record. A `None` candidate is rejected
    /// before any gateway is touched.
    #[tracing::instrument(skip(self, candidate), fields(algorithm = %self.checker.algorithm()))]
    pub async fn process(
        &self,
        candidate: Option<CandidateStats>,
    ) -> Result<ContactStats, PipelineError> {
        let candidate = candidate.ok_or(PipelineError::MalformedInput)?;

        if !self.checker.verify(&candidate) {
            return Err(PipelineError::IntegrityViolation);
        }

        let record = candidate.stamp(Utc::now());

        let saved = self
            .store
            .save(record)
            .await
            .map_err(PipelineError::PersistenceFailure)?;

        self.notifier
            .publish(&saved)
            .await
            .map_err(|source| PipelineError::NotificationFailure {
                key: saved.key(),
                source,
            })?;

        Ok(saved)
    }

    /// Look up a previously persisted record
    #[tracing::instrument(skip(self), fields(key = %key))]
    pub async fn find_by_key(&self, key: &StatsKey) -> Result<Option<ContactStats>, PipelineError> {
        self.store
            .find_by_key(key)
            .await
            .map_err(PipelineError::PersistenceFailure)
    }
}

impl std::fmt::Debug for StatsPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsPipeline")
            .field("checker", &self.checker)
            .field("channel", &self.notifier.channel())
            .finish()
    }
}
