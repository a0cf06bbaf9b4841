mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use etymo_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;

fn init_logging(config: &AppConfig) {
    use etymo_core::config::LogFormat::*;
    use tracing::Level;

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
    // Logging comes from config, so nothing can be logged before this succeeds.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        health::HealthState::new(app.sessions.clone()),
    )
    .await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let runner = app.runner;
    let mut poll_task = tokio::spawn(async move { runner.run(shutdown_rx).await });

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        "etymo-server started"
    );

    tokio::select! {
        signal = wait_for_shutdown() => {
            signal?;
            tracing::info!(
                event_name = "system.server.stopping",
                correlation_id = "shutdown",
                "etymo-server stopping"
            );
            // A closed receiver means the runner has already returned.
            let _ = shutdown_tx.send(true);

            let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
            match tokio::time::timeout(grace, &mut poll_task).await {
                Ok(joined) => joined??,
                Err(_) => {
                    tracing::warn!(
                        event_name = "system.server.shutdown_timeout",
                        correlation_id = "shutdown",
                        grace_secs = grace.as_secs(),
                        "poller did not stop within the grace period"
                    );
                    poll_task.abort();
                }
            }
        }
        // Health is served from this process, so it goes down with the poller.
        joined = &mut poll_task => joined??,
    }

    tracing::info!(
        event_name = "system.server.stopped",
        correlation_id = "shutdown",
        "etymo-server stopped"
    );
    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
