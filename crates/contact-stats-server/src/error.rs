//! Server-specific error types
//!
//! Request-level failures are mapped to HTTP responses inside each feature
//! slice; [`ServerError`] covers process setup (configuration, database,
//! listener).

use thiserror::Error;

use crate::db::DbError;

/// Result type alias for server operations
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Failures while wiring or running the server process
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Database(#[from] DbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid listen address: {0}")]
    Address(#[from] std::net::AddrParseError),
}

impl From<sqlx::Error> for ServerError {
    fn from(err: sqlx::Error) -> Self {
        ServerError::Database(DbError::Sqlx(err))
    }
}
