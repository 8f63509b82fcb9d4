//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{messenger::DEFAULT_REQUEST_TIMEOUT, tasks::NOTIFICATION_POLL_PERIOD};

/// CLI argument parsing structure
#[derive(Debug, Clone, Parser)]
#[command(name = "focus-guard")]
#[command(about = "Background daemon for focus mode: pomodoro timer and website blocking")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Path of the persistent settings store
    #[arg(long, default_value = "focus-guard-store.json")]
    pub store: PathBuf,

    /// Base URL of the backend REST API
    #[arg(long, default_value = "http://localhost:8080/api/v1")]
    pub api_base_url: String,

    /// Base URL the block page is served under
    #[arg(long, default_value = "chrome-extension://focus-guard/")]
    pub extension_base_url: String,

    /// How long a messenger request waits for its response, in milliseconds
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT.as_millis() as u64)]
    pub request_timeout_ms: u64,

    /// Unread-notification poll interval in seconds
    #[arg(long, default_value_t = NOTIFICATION_POLL_PERIOD.as_secs())]
    pub notification_interval_secs: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn notification_interval(&self) -> Duration {
        Duration::from_secs(self.notification_interval_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_daemon() {
        let config = Config::parse_from(["focus-guard"]);
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.store, PathBuf::from("focus-guard-store.json"));
        assert_eq!(config.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.notification_interval(), Duration::from_secs(300));
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::parse_from([
            "focus-guard",
            "--port",
            "9000",
            "--request-timeout-ms",
            "250",
            "-v",
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.request_timeout(), Duration::from_millis(250));
        assert_eq!(config.log_level(), "debug");
    }
}
