//! PostgreSQL `LISTEN`/`NOTIFY` notifier
//!
//! Each saved record is published as its JSON wire form with `pg_notify` on a
//! configured channel. Consumers subscribe with `LISTEN <channel>` (or
//! [`PgNotifier::listener`]).

use async_trait::async_trait;
use contact_stats_common::ContactStats;
use sqlx::postgres::PgListener;
use sqlx::PgPool;

use crate::pipeline::{NotifierError, StatsNotifier};

/// PostgreSQL rejects `NOTIFY` payloads of 8000 bytes or more
pub const MAX_NOTIFY_PAYLOAD_BYTES: usize = 7999;

/// [`StatsNotifier`] over `pg_notify`
#[derive(Debug, Clone)]
pub struct PgNotifier {
    pool: PgPool,
    channel: String,
}

impl PgNotifier {
    pub fn new(pool: PgPool, channel: impl Into<String>) -> Self {
        Self {
            pool,
            channel: channel.into(),
        }
    }

    /// Startup check for the notification channel.
    ///
    /// Channels need no declaration in PostgreSQL, so this only confirms the
    /// database answers. Failure is logged and otherwise ignored; publishes
    /// will report their own errors.
    pub async fn declare(&self) {
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => tracing::info!(channel = %self.channel, "Notification channel ready"),
            Err(e) => tracing::warn!(
                channel = %self.channel,
                error = %e,
                "Could not verify notification channel"
            ),
        }
    }

    /// Open a dedicated connection listening on this notifier's channel
    pub async fn listener(&self) -> Result<PgListener, NotifierError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(&self.channel).await?;
        Ok(listener)
    }
}

#[async_trait]
impl StatsNotifier for PgNotifier {
    fn channel(&self) -> &str {
        &self.channel
    }

    #[tracing::instrument(skip(self, record), fields(channel = %self.channel, key = %record.key()))]
    async fn publish(&self, record: &ContactStats) -> Result<(), NotifierError> {
        let payload = record.to_json()?;

        if payload.len() > MAX_NOTIFY_PAYLOAD_BYTES {
            return Err(NotifierError::PayloadTooLarge {
                size: payload.len(),
                limit: MAX_NOTIFY_PAYLOAD_BYTES,
            });
        }

        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(&self.channel)
            .bind(&payload)
            .execute(&self.pool)
            .await?;

        tracing::debug!(bytes = payload.len(), "Stats event published");

        Ok(())
    }
}
