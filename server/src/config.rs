//! Command line and environment configuration

use std::time::Duration;

use clap::Parser;

/// Every flag can also be set through the environment variable named after
/// it (`--log-level` -> `LOG_LEVEL`).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "amzn-oidc-validate-server",
    version,
    about = "Validates x-amzn-oidc-data headers signed by Application Load Balancers"
)]
pub struct Config {
    /// Listen host
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Listen port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Timeout for validation (e.g. 30s, 1m)
    #[arg(long, env = "TIMEOUT", default_value = "30s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Log level (debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Config {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
