//! Error types shared across the contact stats crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Main error type for the common crate
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stats key '{0}': expected an RFC 3339 UTC timestamp")]
    InvalidKey(String),

    #[error("Unknown checksum algorithm '{0}' (expected md5 or sha256-128)")]
    UnknownChecksumAlgorithm(String),
}
