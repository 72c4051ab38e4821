//! Feature modules implementing the contact stats API
//!
//! Each feature is a vertical slice following the CQRS layout:
//! - `commands/` - Write operations
//! - `queries/` - Read operations
//! - `routes.rs` - HTTP route definitions
//!
//! # Features
//!
//! - **stats**: submit a stats record, fetch one by key

pub mod shared;
pub mod stats;

use axum::Router;
use std::sync::Arc;

use crate::pipeline::StatsPipeline;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub pipeline: Arc<StatsPipeline>,
}

/// Creates the API router with all feature routes mounted
///
/// - `/stats` - Contact stats submission and lookup
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest("/stats", stats::stats_routes().with_state(state.pipeline))
}
