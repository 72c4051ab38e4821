//! Contact Stats Server Library
//!
//! HTTP service that accepts customer-contact statistics records, verifies
//! their checksum, stamps them with a creation time, persists them and
//! announces them to downstream consumers.
//!
//! # Architecture
//!
//! - **pipeline**: the transport-agnostic core. [`pipeline::StatsPipeline`]
//!   runs verify → stamp → persist → notify over two injected gateways,
//!   [`pipeline::StatsStore`] and [`pipeline::StatsNotifier`].
//! - **db**: PostgreSQL adapters for both gateways (`contact_stats` table,
//!   `pg_notify`).
//! - **features**: CQRS vertical slices. `stats` holds the record command,
//!   the get query and their axum routes.
//! - **api**: adapter selection from [`config::Config`], router assembly and
//!   graceful serving.
//! - **middleware**: CORS, request tracing and security headers.
//!
//! A persisted record is never reported as announced unless the notifier
//! succeeded, and a record whose checksum does not match its counters is never
//! persisted.
//!
//! # Example
//!
//! ```no_run
//! use contact_stats_server::{api, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let state = api::build_state(&config).await?;
//!     api::serve(config, state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod cqrs;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;
pub mod pipeline;

// Re-export commonly used types
pub use error::{ServerError, ServerResult};
pub use pipeline::{PipelineError, StatsPipeline};
