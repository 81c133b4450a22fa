//! progress-notify - demo binary
//!
//! Runs a simulated long operation under a periodic progress reporter,
//! optionally serving the progress frames to WebSocket observers.

use anyhow::{Context, Result};
use clap::Parser;
use progress_notify::{
    cli::Cli,
    config::Config,
    notification::{logging_subscriber, websocket::ProgressServer},
    Notifier,
};
use std::{sync::Arc, time::Duration};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Granularity of the simulated work loop.
const WORK_STEP: Duration = Duration::from_millis(250);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = Config::load(&cli).unwrap_or_else(|err| {
        // Manually initialize logging for this specific error
        tracing_subscriber::fmt().init();
        error!("Failed to load configuration: {:#}", err);
        std::process::exit(1);
    });

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("progress-notify starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Message: {}", config.progress.message);
    info!("Interval: {}s", config.progress.interval_seconds);
    info!("Join Timeout: {}s", config.progress.join_timeout_seconds);
    info!("WebSocket Server: {}", if config.server.enabled {
        config.server.listen_addr.to_string()
    } else {
        "disabled".to_string()
    });
    info!("-------------------------------------------------------");

    let duration = Duration::try_from_secs_f64(cli.duration)
        .with_context(|| format!("Invalid duration: {}", cli.duration))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let mut server_handle = None;
    let notifier = if config.server.enabled {
        let server =
            ProgressServer::bind(config.server.listen_addr, config.server.channel_capacity).await?;
        info!("Serving progress on ws://{}", server.local_addr()?);
        if config.server.log_frames {
            logging_subscriber::spawn(server.subscribe());
        }
        let notifier = Notifier::with_sink(Arc::new(server.sink()));
        server_handle = Some(tokio::spawn(server.run(shutdown_rx)));
        notifier
    } else {
        Notifier::log_only()
    };

    let reporter = config.progress.reporter(notifier)?;
    tokio::task::spawn_blocking(move || reporter.run(|| simulate_work(duration)))
        .await
        .context("Simulated operation panicked")?;
    info!("Operation finished after {:?}.", duration);

    let _ = shutdown_tx.send(());
    if let Some(handle) = server_handle {
        handle.await??;
    }
    info!("Shutdown complete.");
    Ok(())
}

/// Stands in for a long blocking operation such as a training step.
fn simulate_work(duration: Duration) {
    let mut remaining = duration;
    while !remaining.is_zero() {
        let step = remaining.min(WORK_STEP);
        std::thread::sleep(step);
        remaining -= step;
    }
}
