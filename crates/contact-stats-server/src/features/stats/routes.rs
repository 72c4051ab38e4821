//! Stats API routes
//!
//! # Route Structure
//!
//! - `POST /api/v1/stats` - Submit a stats record
//! - `GET /api/v1/stats/:key` - Fetch a persisted record by key

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::pipeline::{ErrorKind, PipelineError, StatsPipeline};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

use super::{
    commands::{RecordStatsCommand, RecordStatsError},
    queries::{GetStatsError, GetStatsQuery},
};

// ============================================================================
// Router Configuration
// ============================================================================

/// Creates the stats router
///
/// # Examples
///
/// ```rust,ignore
/// use axum::Router;
/// use contact_stats_server::features::stats::routes::stats_routes;
///
/// let app = Router::new()
///     .nest("/api/v1/stats", stats_routes())
///     .with_state(pipeline);
/// ```
pub fn stats_routes() -> Router<Arc<StatsPipeline>> {
    Router::new()
        .route("/", post(record_stats))
        .route("/:key", get(get_stats))
}

/// Decode a request body into a command.
///
/// An empty body or a literal `null` is "no body" (`Ok(None)`). Anything that is
/// not a JSON object, or has a field of the wrong JSON type, is malformed.
fn decode_body(body: &[u8]) -> Result<Option<RecordStatsCommand>, RecordStatsError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RecordStatsError::MalformedBody(format!("request body is not valid JSON: {}", e)))?;

    match value {
        Value::Null => Ok(None),
        Value::Object(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| RecordStatsError::MalformedBody(format!("invalid request body: {}", e))),
        _ => Err(RecordStatsError::MalformedBody(
            "request body must be a JSON object".to_string(),
        )),
    }
}

// ============================================================================
// Command Handlers (Write Operations)
// ============================================================================

/// Submit a stats record
///
/// # Endpoint
///
/// `POST /api/v1/stats`
///
/// # Request Body
///
/// ```json
/// {
///   "totalContactoClientes": 250,
///   "motivoReclamo": 25,
///   "motivoGarantia": 10,
///   "motivoDuda": 100,
///   "motivoCompra": 100,
///   "motivoFelicitaciones": 7,
///   "motivoCambio": 8,
///   "hash": "5484062a4be1ce5645eb414663e14f59"
/// }
/// ```
///
/// # Response
///
/// - `200 OK` - Record verified, persisted and announced; body carries the
///   stored record including its `timestamp`
/// - `400 Bad Request` - `MALFORMED_INPUT`, `VALIDATION_ERROR` or `INTEGRITY_VIOLATION`
/// - `500 Internal Server Error` - `PERSISTENCE_FAILURE` or `NOTIFICATION_FAILURE`
#[tracing::instrument(skip(pipeline, body), fields(bytes = body.len()))]
async fn record_stats(
    State(pipeline): State<Arc<StatsPipeline>>,
    body: Bytes,
) -> Result<Response, StatsApiError> {
    let command = decode_body(&body)?;

    let saved = super::commands::record::handle(pipeline, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(saved))).into_response())
}

// ============================================================================
// Query Handlers (Read Operations)
// ============================================================================

/// Fetch a stats record by key
///
/// # Endpoint
///
/// `GET /api/v1/stats/:key`
///
/// # Response
///
/// - `200 OK` - Record found
/// - `400 Bad Request` - Key is not an RFC 3339 timestamp
/// - `404 Not Found` - No record under that key
/// - `500 Internal Server Error` - Store failure
#[tracing::instrument(skip(pipeline), fields(key = %key))]
async fn get_stats(
    State(pipeline): State<Arc<StatsPipeline>>,
    Path(key): Path<String>,
) -> Result<Response, StatsApiError> {
    let record = super::queries::get::handle(pipeline, GetStatsQuery::new(key)).await?;

    tracing::debug!("Stats record retrieved via API");

    Ok((StatusCode::OK, Json(ApiResponse::success(record))).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

/// Unified error type for stats API endpoints
#[derive(Debug)]
enum StatsApiError {
    RecordError(RecordStatsError),
    GetError(GetStatsError),
}

impl From<RecordStatsError> for StatsApiError {
    fn from(err: RecordStatsError) -> Self {
        Self::RecordError(err)
    }
}

impl From<GetStatsError> for StatsApiError {
    fn from(err: GetStatsError) -> Self {
        Self::GetError(err)
    }
}

fn pipeline_error_response(err: &PipelineError) -> Response {
    let kind = err.kind();

    match kind {
        ErrorKind::MalformedInput | ErrorKind::IntegrityViolation => {
            ErrorResponse::new(kind.code(), err.to_string()).into_response_with(StatusCode::BAD_REQUEST)
        },
        ErrorKind::PersistenceFailure => {
            tracing::error!(error = %err, "Stats record could not be persisted");
            ErrorResponse::new(kind.code(), "failed to persist stats record")
                .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        },
        ErrorKind::NotificationFailure => {
            let key = err.saved_key().map(|k| k.to_string());
            tracing::error!(error = %err, key = ?key, "Stats record saved but not announced");
            ErrorResponse::with_details(
                kind.code(),
                "stats record saved but not published",
                json!({ "key": key }),
            )
            .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
        },
    }
}

impl IntoResponse for StatsApiError {
    fn into_response(self) -> Response {
        match self {
            StatsApiError::RecordError(RecordStatsError::Validation(message)) => {
                ErrorResponse::new("VALIDATION_ERROR", message).into_response_with(StatusCode::BAD_REQUEST)
            },
            StatsApiError::RecordError(RecordStatsError::MalformedBody(message)) => {
                ErrorResponse::new(ErrorKind::MalformedInput.code(), message)
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            StatsApiError::RecordError(RecordStatsError::Pipeline(ref err)) => {
                pipeline_error_response(err)
            },

            StatsApiError::GetError(GetStatsError::InvalidKey(_)) => {
                ErrorResponse::new("VALIDATION_ERROR", self.to_string())
                    .into_response_with(StatusCode::BAD_REQUEST)
            },
            StatsApiError::GetError(GetStatsError::NotFound(_)) => {
                ErrorResponse::new("NOT_FOUND", self.to_string()).into_response_with(StatusCode::NOT_FOUND)
            },
            StatsApiError::GetError(GetStatsError::Pipeline(ref err)) => pipeline_error_response(err),
        }
    }
}

impl std::fmt::Display for StatsApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RecordError(e) => write!(f, "{}", e),
            Self::GetError(e) => write!(f, "{}", e),
        }
    }
}
