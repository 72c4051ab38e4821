//! Contact Stats Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, integrity checking, and logging for the contact stats workspace.
//!
//! # Overview
//!
//! - **Types**: the `ContactStats` record in its candidate and stamped forms
//! - **Checksums**: the `IntegrityChecker` that guards pipeline entry
//! - **Error Handling**: `StatsError` and the crate `Result` alias
//! - **Logging**: tracing subscriber setup shared by every binary
//!
//! # Example
//!
//! ```
//! use contact_stats_common::checksum::IntegrityChecker;
//! use contact_stats_common::types::{CandidateStats, ContactCounters};
//!
//! let counters = ContactCounters::new(250, 25, 10, 100, 100, 7, 8);
//! let candidate = CandidateStats::new(counters, "5484062a4be1ce5645eb414663e14f59");
//!
//! assert!(IntegrityChecker::default().verify(&candidate));
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use checksum::IntegrityChecker;
pub use error::{Result, StatsError};
pub use types::{CandidateStats, ChecksumAlgorithm, ContactCounters, ContactStats, StatsKey};
