//! Record stats command
//!
//! Accepts a submitted stats record, checks its fields, and runs it through the
//! [`StatsPipeline`].
//!
//! # Architecture
//!
//! - Command: the raw wire payload, every field optional so that missing
//!   fields become validation messages instead of decode errors
//! - Handler: standalone async function that validates and delegates to the
//!   pipeline

use contact_stats_common::{CandidateStats, ContactCounters, ContactStats};
use mediator::Request;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::cqrs::middleware::Command;
use crate::features::shared::validation::{validate_checksum, validate_counter, FieldViolations};
use crate::pipeline::{PipelineError, StatsPipeline};

/// Command to record one contact stats submission
///
/// # Examples
///
/// ```rust,ignore
/// use contact_stats_server::features::stats::commands::RecordStatsCommand;
///
/// let command: RecordStatsCommand = serde_json::from_str(r#"{
///     "totalContactoClientes": 250,
///     "motivoReclamo": 25,
///     "motivoGarantia": 10,
///     "motivoDuda": 100,
///     "motivoCompra": 100,
///     "motivoFelicitaciones": 7,
///     "motivoCambio": 8,
///     "hash": "5484062a4be1ce5645eb414663e14f59"
/// }"#)?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordStatsCommand {
    #[serde(rename = "totalContactoClientes")]
    pub total: Option<i64>,
    #[serde(rename = "motivoReclamo")]
    pub claim: Option<i64>,
    #[serde(rename = "motivoGarantia")]
    pub warranty: Option<i64>,
    #[serde(rename = "motivoDuda")]
    pub inquiry: Option<i64>,
    #[serde(rename = "motivoCompra")]
    pub purchase: Option<i64>,
    #[serde(rename = "motivoFelicitaciones")]
    pub compliment: Option<i64>,
    #[serde(rename = "motivoCambio")]
    pub exchange: Option<i64>,
    #[serde(rename = "hash")]
    pub checksum: Option<String>,
}

/// Errors that can occur when recording stats
#[derive(Debug, thiserror::Error)]
pub enum RecordStatsError {
    /// One or more fields failed validation; messages joined with `", "`
    #[error("{0}")]
    Validation(String),

    /// The body could not be decoded into a command
    #[error("{0}")]
    MalformedBody(String),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl Request<Result<ContactStats, RecordStatsError>> for RecordStatsCommand {}

impl Command for RecordStatsCommand {}

impl RecordStatsCommand {
    /// Check every field and build the pipeline candidate.
    ///
    /// Fields are checked in wire order and all violations are reported.
    pub fn validate(&self) -> Result<CandidateStats, RecordStatsError> {
        let mut violations = FieldViolations::default();

        let total = violations.check(validate_counter("totalContactoClientes", self.total));
        let claim = violations.check(validate_counter("motivoReclamo", self.claim));
        let warranty = violations.check(validate_counter("motivoGarantia", self.warranty));
        let inquiry = violations.check(validate_counter("motivoDuda", self.inquiry));
        let purchase = violations.check(validate_counter("motivoCompra", self.purchase));
        let compliment =
            violations.check(validate_counter("motivoFelicitaciones", self.compliment));
        let exchange = violations.check(validate_counter("motivoCambio", self.exchange));
        let checksum = violations.check(validate_checksum("hash", self.checksum.as_deref()));

        violations.into_result().map_err(RecordStatsError::Validation)?;

        match (total, claim, warranty, inquiry, purchase, compliment, exchange, checksum) {
            (
                Some(total),
                Some(claim),
                Some(warranty),
                Some(inquiry),
                Some(purchase),
                Some(compliment),
                Some(exchange),
                Some(checksum),
            ) => Ok(CandidateStats::new(
                ContactCounters::new(total, claim, warranty, inquiry, purchase, compliment, exchange),
                checksum,
            )),
            _ => Err(RecordStatsError::Validation("incomplete stats record".to_string())),
        }
    }
}

/// Handler for recording stats
///
/// `None` means the request carried no body at all; the pipeline reports it
/// as malformed input.
///
/// # Errors
///
/// - `Validation` if any field is missing, negative or badly formed
/// - `Pipeline` for integrity, persistence and notification failures
#[tracing::instrument(
    skip(pipeline, command),
    fields(cqrs = <RecordStatsCommand as Command>::KIND, total = ?command.as_ref().and_then(|c| c.total))
)]
pub async fn handle(
    pipeline: Arc<StatsPipeline>,
    command: Option<RecordStatsCommand>,
) -> Result<ContactStats, RecordStatsError> {
    let candidate = command.map(|c| c.validate()).transpose()?;

    let saved = pipeline.process(candidate).await?;

    tracing::info!(key = %saved.key(), "Stats recorded");

    Ok(saved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{BroadcastNotifier, ErrorKind, InMemoryStatsStore};
    use contact_stats_common::IntegrityChecker;

    fn valid_command() -> RecordStatsCommand {
        RecordStatsCommand {
            total: Some(250),
            claim: Some(25),
            warranty: Some(10),
            inquiry: Some(100),
            purchase: Some(100),
            compliment: Some(7),
            exchange: Some(8),
            checksum: Some("5484062a4be1ce5645eb414663e14f59".to_string()),
        }
    }

    fn pipeline() -> Arc<StatsPipeline> {
        Arc::new(StatsPipeline::new(
            IntegrityChecker::default(),
            Arc::new(InMemoryStatsStore::new()),
            Arc::new(BroadcastNotifier::new("test_events", 4)),
        ))
    }

    #[test]
    fn test_validate_builds_candidate() {
        let candidate = valid_command().validate().unwrap();
        assert_eq!(candidate.counters, ContactCounters::new(250, 25, 10, 100, 100, 7, 8));
        assert_eq!(candidate.checksum, "5484062a4be1ce5645eb414663e14f59");
    }

    #[test]
    fn test_validate_reports_every_violation() {
        let command = RecordStatsCommand {
            total: None,
            inquiry: Some(-3),
            checksum: Some("XYZ".to_string()),
            ..valid_command()
        };

        let err = command.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "totalContactoClientes cannot be null, motivoDuda must be a positive number, \
             hash must be 32 lowercase hexadecimal characters"
        );
    }

    #[test]
    fn test_command_decodes_wire_names() {
        let command: RecordStatsCommand = serde_json::from_str(
            r#"{"totalContactoClientes": 1, "motivoCambio": 2, "hash": "abc"}"#,
        )
        .unwrap();

        assert_eq!(command.total, Some(1));
        assert_eq!(command.exchange, Some(2));
        assert_eq!(command.claim, None);
        assert_eq!(command.checksum.as_deref(), Some("abc"));
    }

    #[tokio::test]
    async fn test_handle_records_valid_command() {
        let saved = handle(pipeline(), Some(valid_command())).await.unwrap();
        assert_eq!(saved.counters().total, 250);
    }

    #[tokio::test]
    async fn test_handle_without_body_is_malformed() {
        let err = handle(pipeline(), None).await.unwrap_err();
        assert!(matches!(
            err,
            RecordStatsError::Pipeline(ref e) if e.kind() == ErrorKind::MalformedInput
        ));
    }

    #[tokio::test]
    async fn test_handle_wrong_checksum_is_integrity_violation() {
        let command = RecordStatsCommand {
            exchange: Some(9),
            ..valid_command()
        };

        let err = handle(pipeline(), Some(command)).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid checksum");
    }
}
