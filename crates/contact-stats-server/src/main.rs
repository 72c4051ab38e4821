//! Contact Stats Server - Main entry point

use anyhow::Result;
use contact_stats_common::logging::{init_logging, LogConfig};
use tracing::info;

use contact_stats_server::{api, config::Config};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("contact-stats-server".to_string())
        .filter_directives("contact_stats_server=debug,tower_http=debug,sqlx=info".to_string())
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;

    // Dropping the guard stops the file writer
    let _log_guard = init_logging(&log_config)?;

    info!("Starting Contact Stats Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let state = api::build_state(&config).await?;

    api::serve(config, state).await?;

    Ok(())
}
