//! Shared validation utilities
//!
//! Inbound payloads are checked field by field before they reach the pipeline.
//! Every violation is collected so the caller sees all problems at once.
//!
//! # Examples
//!
//! ```rust,ignore
//! use contact_stats_server::features::shared::validation::{validate_counter, FieldViolations};
//!
//! let mut violations = FieldViolations::default();
//! let total = violations.check(validate_counter("totalContactoClientes", Some(250)));
//! assert_eq!(total, Some(250));
//! assert!(violations.into_result().is_ok());
//! ```

use contact_stats_common::checksum::CHECKSUM_HEX_LEN;
use thiserror::Error;

/// A single field that failed validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldViolation {
    #[error("{field} cannot be null")]
    Missing { field: &'static str },

    #[error("{field} must be a positive number")]
    Negative { field: &'static str },

    #[error("{field} is out of range")]
    OutOfRange { field: &'static str },

    #[error("{field} cannot be null or empty")]
    Blank { field: &'static str },

    #[error("{field} must be {len} lowercase hexadecimal characters")]
    NotHex { field: &'static str, len: usize },
}

/// Accumulates violations across fields
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldViolations(Vec<FieldViolation>);

impl FieldViolations {
    /// Record a failed check and pass a successful one through
    pub fn check<T>(&mut self, result: Result<T, FieldViolation>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(violation) => {
                self.0.push(violation);
                None
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// All messages joined with `", "`, or `Ok` when nothing failed
    pub fn into_result(self) -> Result<(), String> {
        if self.0.is_empty() {
            return Ok(());
        }

        Err(self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", "))
    }
}

/// Validate a required, non-negative counter
///
/// # Rules
/// - Must be present
/// - Must be ≥ 0
/// - Must fit in 32 bits
pub fn validate_counter(field: &'static str, value: Option<i64>) -> Result<u32, FieldViolation> {
    let value = value.ok_or(FieldViolation::Missing { field })?;

    if value < 0 {
        return Err(FieldViolation::Negative { field });
    }

    u32::try_from(value).map_err(|_| FieldViolation::OutOfRange { field })
}

/// Validate a required checksum: non-blank, 32 lowercase hex characters
pub fn validate_checksum(field: &'static str, value: Option<&str>) -> Result<String, FieldViolation> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Err(FieldViolation::Blank { field }),
    };

    let is_lower_hex = value.len() == CHECKSUM_HEX_LEN
        && value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'));

    if !is_lower_hex {
        return Err(FieldViolation::NotHex {
            field,
            len: CHECKSUM_HEX_LEN,
        });
    }

    Ok(value.to_string())
}
