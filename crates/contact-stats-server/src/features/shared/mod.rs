//! Shared utilities for feature modules
//!
//! - **validation**: field-level checks on inbound payloads

pub mod validation;

pub use validation::{validate_checksum, validate_counter, FieldViolations};
