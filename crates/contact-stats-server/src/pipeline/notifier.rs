//! Event publication gateway for saved stats records
//!
//! [`StatsNotifier`] is a fire-and-forget publish on a named channel. The
//! PostgreSQL `NOTIFY` implementation lives in [`crate::db::notifier`];
//! [`BroadcastNotifier`] fans events out to in-process subscribers.

use async_trait::async_trait;
use contact_stats_common::{ContactStats, StatsError};
use thiserror::Error;
use tokio::sync::broadcast;

/// Default capacity of the in-process broadcast channel
pub const DEFAULT_BROADCAST_CAPACITY: usize = 256;

/// Errors a notifier can report
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to encode event: {0}")]
    Encode(#[from] StatsError),

    #[error("Event payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Notifier unavailable: {0}")]
    Unavailable(String),
}

/// Announces saved records to downstream consumers.
///
/// A failed publish must be reported, never swallowed.
#[async_trait]
pub trait StatsNotifier: Send + Sync {
    /// Name of the channel events are published on
    fn channel(&self) -> &str;

    async fn publish(&self, record: &ContactStats) -> Result<(), NotifierError>;
}

/// In-process notifier backed by a `tokio::sync::broadcast` channel.
///
/// Publishing while nobody is subscribed succeeds; the event is dropped.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    channel: String,
    sender: broadcast::Sender<ContactStats>,
}

impl BroadcastNotifier {
    pub fn new(channel: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            channel: channel.into(),
            sender,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContactStats> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl StatsNotifier for BroadcastNotifier {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn publish(&self, record: &ContactStats) -> Result<(), NotifierError> {
        let receivers = self.sender.send(record.clone()).unwrap_or(0);

        tracing::debug!(
            channel = %self.channel,
            key = %record.key(),
            receivers,
            "Stats event broadcast"
        );

        Ok(())
    }
}
