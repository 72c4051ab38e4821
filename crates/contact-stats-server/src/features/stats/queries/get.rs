//! Get stats query
//!
//! Point lookup of a persisted record by its key (the RFC 3339 creation time).

use contact_stats_common::{ContactStats, StatsKey};
use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cqrs::middleware::Query;
use crate::pipeline::{PipelineError, StatsPipeline};

/// Query to fetch one stats record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetStatsQuery {
    /// Any RFC 3339 timestamp; normalized to the canonical key before lookup
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GetStatsError {
    #[error("'{0}' is not a valid stats key; expected an RFC 3339 timestamp")]
    InvalidKey(String),

    #[error("Stats record '{0}' not found")]
    NotFound(StatsKey),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl Request<Result<ContactStats, GetStatsError>> for GetStatsQuery {}

impl Query for GetStatsQuery {}

impl GetStatsQuery {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn validate(&self) -> Result<StatsKey, GetStatsError> {
        StatsKey::parse(self.key.trim()).map_err(|_| GetStatsError::InvalidKey(self.key.clone()))
    }
}

#[tracing::instrument(
    skip(pipeline, query),
    fields(cqrs = <GetStatsQuery as Query>::KIND, key = %query.key)
)]
pub async fn handle(
    pipeline: Arc<StatsPipeline>,
    query: GetStatsQuery,
) -> Result<ContactStats, GetStatsError> {
    let key = query.validate()?;

    let record = pipeline.find_by_key(&key).await?;

    record.ok_or(GetStatsError::NotFound(key))
}
