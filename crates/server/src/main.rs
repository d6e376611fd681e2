mod bootstrap;
mod health;
mod scrape;
mod service;
mod sheets;
mod title;

use anyhow::Result;
use trivia_core::config::{AppConfig, LoadOptions};

use crate::bootstrap::Collaborators;

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use trivia_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging must be up before bootstrap emits its first event.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config, Collaborators::default()).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        app.links.clone(),
    )
    .await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        command_prefix = %app.config.chat.command_prefix,
        sheets_enabled = app.config.sheets.is_enabled(),
        "trivia-server started"
    );

    tokio::select! {
        result = app.gateway.start() => {
            result?;
            tracing::info!(
                event_name = "system.server.gateway_idle",
                correlation_id = "bootstrap",
                "gateway stream ended; serving health until shutdown"
            );
            wait_for_shutdown().await?;
        }
        signal = wait_for_shutdown() => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "trivia-server stopping"
    );
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
