//! Application wiring: adapter selection, router assembly and serving

pub mod response;

use crate::config::{Backend, Config};
use crate::db::{self, PgNotifier, PgStatsStore};
use crate::error::{ServerError, ServerResult};
use crate::features;
use crate::middleware;
use crate::pipeline::{
    notifier::DEFAULT_BROADCAST_CAPACITY, BroadcastNotifier, InMemoryStatsStore, StatsNotifier,
    StatsPipeline, StatsStore,
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use contact_stats_common::IntegrityChecker;
use serde_json::json;
use sqlx::PgPool;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Present when any pipeline gateway is backed by PostgreSQL
    pub db: Option<PgPool>,
    pub pipeline: Arc<StatsPipeline>,
}

impl AppState {
    /// State over an already-built pipeline, without a database
    pub fn new(pipeline: Arc<StatsPipeline>) -> Self {
        Self { db: None, pipeline }
    }
}

fn require_pool(db: &Option<PgPool>, backend: &str) -> ServerResult<PgPool> {
    db.clone().ok_or_else(|| {
        ServerError::Config(format!("{} backend 'postgres' needs a database connection", backend))
    })
}

/// Connect the configured adapters and assemble the pipeline
pub async fn build_state(config: &Config) -> ServerResult<AppState> {
    let db = if config.needs_database() {
        let pool = db::create_pool(&config.database).await?;
        db::run_migrations(&pool).await?;
        Some(pool)
    } else {
        tracing::info!("No postgres backend selected, skipping database setup");
        None
    };

    let store: Arc<dyn StatsStore> = match config.pipeline.store_backend {
        Backend::Postgres => Arc::new(PgStatsStore::new(require_pool(&db, "Store")?)),
        Backend::Memory => Arc::new(InMemoryStatsStore::new()),
    };

    let channel = config.pipeline.notify_channel.clone();
    let notifier: Arc<dyn StatsNotifier> = match config.pipeline.notifier_backend {
        Backend::Postgres => {
            let notifier = PgNotifier::new(require_pool(&db, "Notifier")?, channel);
            notifier.declare().await;
            Arc::new(notifier)
        },
        Backend::Memory => Arc::new(BroadcastNotifier::new(channel, DEFAULT_BROADCAST_CAPACITY)),
    };

    tracing::info!(
        store = %config.pipeline.store_backend,
        notifier = %config.pipeline.notifier_backend,
        channel = %config.pipeline.notify_channel,
        algorithm = %config.pipeline.checksum_algorithm,
        "Stats pipeline assembled"
    );

    let checker = IntegrityChecker::new(config.pipeline.checksum_algorithm);
    let pipeline = Arc::new(StatsPipeline::new(checker, store, notifier));

    Ok(AppState { db, pipeline })
}

/// Create the application router with all routes and middleware
pub fn create_router(state: AppState, config: &Config) -> Router {
    let feature_state = features::FeatureState {
        pipeline: state.pipeline.clone(),
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(state)
        .nest("/api/v1", features::router(feature_state))
        // Apply layers from innermost to outermost
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
        .layer(middleware::SecurityHeadersLayer::new())
}

/// Bind the configured address and serve until a shutdown signal arrives
pub async fn serve(config: Config, state: AppState) -> ServerResult<()> {
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on {}", addr);

    let (signalled_tx, signalled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let timeout = Duration::from_secs(config.server.shutdown_timeout_secs);
    let deadline = async move {
        if signalled_rx.await.is_ok() {
            tracing::info!("Waiting up to {} seconds for connections to close", timeout.as_secs());
            tokio::time::sleep(timeout).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => {
            result?;
            tracing::info!("Server shut down gracefully");
        },
        _ = deadline => {
            tracing::warn!("Shutdown timeout elapsed, closing remaining connections");
        },
    }

    Ok(())
}

async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Contact Stats Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

/// Liveness plus database connectivity when a database is in use
async fn health(State(state): State<AppState>) -> Response {
    let Some(pool) = state.db.as_ref() else {
        return (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "not configured" })),
        )
            .into_response();
    };

    match db::health_check(pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "database": "connected" })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "database": "unreachable" })),
            )
                .into_response()
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use axum::body::Body;
    use tower::ServiceExt;

    fn memory_config() -> Config {
        Config {
            pipeline: PipelineConfig {
                store_backend: Backend::Memory,
                notifier_backend: Backend::Memory,
                ..PipelineConfig::default()
            },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_build_state_with_memory_backends() {
        let state = build_state(&memory_config()).await.unwrap();
        assert!(state.db.is_none());
        assert_eq!(state.pipeline.notifier_channel(), "contact_stats_events");
    }

    #[tokio::test]
    async fn test_health_without_database() {
        let config = memory_config();
        let state = build_state(&config).await.unwrap();
        let app = create_router(state, &config);

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }
}
