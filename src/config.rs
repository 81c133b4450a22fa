//! Configuration management for progress-notify
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, a `progress-notify.toml`
//! file, `PROGRESS_NOTIFY_` environment variables and command-line flags.

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::cli::Cli;
use crate::notification::{notifier::DEFAULT_LOG_TAG, Notifier};
use crate::reporter::{interval_from_secs, ProgressReporter};

/// The file read when no `--config` flag is given. It may be absent.
pub const DEFAULT_CONFIG_FILE: &str = "progress-notify.toml";

/// Prefix for environment overrides. Nested keys are separated by `__`,
/// e.g. `PROGRESS_NOTIFY_PROGRESS__INTERVAL_SECONDS=1.5`.
pub const ENV_PREFIX: &str = "PROGRESS_NOTIFY_";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Settings for the periodic reporter.
    pub progress: ProgressConfig,
    /// Settings for the WebSocket progress server.
    pub server: ServerConfig,
}

/// Settings for the periodic reporter.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProgressConfig {
    /// The message reported while the operation runs.
    pub message: String,
    /// Seconds between repeated notifications.
    pub interval_seconds: f64,
    /// Seconds to wait for the background loop at teardown.
    pub join_timeout_seconds: f64,
    /// Tag prefixed to progress log lines.
    pub log_tag: String,
}

/// Settings for the WebSocket progress server.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Whether progress is served over WebSocket at all.
    pub enabled: bool,
    /// The address the server listens on.
    pub listen_addr: SocketAddr,
    /// Frames buffered per observer before it starts lagging.
    pub channel_capacity: usize,
    /// Log every published frame.
    #[serde(default)]
    pub log_frames: bool,
}

impl Config {
    /// Loads the configuration by layering defaults, the TOML file,
    /// environment variables and command-line arguments, then validates it.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the reporter or server cannot work with.
    pub fn validate(&self) -> Result<()> {
        interval_from_secs(self.progress.interval_seconds)?;
        interval_from_secs(self.progress.join_timeout_seconds).map_err(|_| {
            anyhow::anyhow!(
                "progress join timeout must be a positive, finite number of seconds (got {})",
                self.progress.join_timeout_seconds
            )
        })?;
        if self.server.channel_capacity == 0 {
            bail!("server channel capacity must be greater than zero");
        }
        Ok(())
    }
}

impl ProgressConfig {
    /// Builds a reporter for the configured message around `notifier`.
    pub fn reporter(&self, notifier: Notifier) -> Result<ProgressReporter> {
        let join_timeout = interval_from_secs(self.join_timeout_seconds)?;
        let reporter = ProgressReporter::new(notifier.with_tag(&self.log_tag), &self.message)
            .with_interval_secs(self.interval_seconds)?
            .with_join_timeout(join_timeout);
        Ok(reporter)
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            progress: ProgressConfig {
                message: "Working...".to_string(),
                interval_seconds: 5.0,
                join_timeout_seconds: 2.0,
                log_tag: DEFAULT_LOG_TAG.to_string(),
            },
            server: ServerConfig {
                enabled: false,
                listen_addr: SocketAddr::from(([127, 0, 0, 1], 8188)),
                channel_capacity: 64,
                log_frames: false,
            },
        }
    }
}
