//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the demo binary using
//! the `clap` crate. The arguments double as the highest-priority `figment`
//! provider when loading the configuration.

use clap::Parser;
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Runs a simulated long operation while reporting its progress.
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// The progress message to report.
    #[arg(short, long, value_name = "TEXT")]
    pub message: Option<String>,

    /// Seconds between progress notifications.
    #[arg(short, long, value_name = "SECONDS")]
    pub interval: Option<f64>,

    /// How long the simulated operation runs, in seconds.
    #[arg(short, long, value_name = "SECONDS", default_value_t = 12.0)]
    pub duration: f64,

    /// Serve progress over WebSocket on this address.
    #[arg(short, long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// The logging level (e.g. "debug").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();
        let mut progress = Dict::new();
        let mut server = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if let Some(message) = &self.message {
            progress.insert("message".into(), Value::from(message.clone()));
        }

        if let Some(interval) = self.interval {
            progress.insert("interval_seconds".into(), Value::from(interval));
        }

        // Giving an address is enough to turn the server on.
        if let Some(addr) = self.listen {
            server.insert("enabled".into(), Value::from(true));
            server.insert("listen_addr".into(), Value::from(addr.to_string()));
        }

        if !progress.is_empty() {
            dict.insert("progress".into(), Value::Dict(Tag::Default, progress));
        }
        if !server.is_empty() {
            dict.insert("server".into(), Value::Dict(Tag::Default, server));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
