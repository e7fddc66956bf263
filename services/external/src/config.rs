use std::time::Duration;

use serde::Deserialize;

use dari_core::config::Config;

/// External service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct ExternalConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// AMQP connection URL.
    pub broker_url: String,
    /// HTTP/WS listen port.
    #[serde(default = "default_port")]
    pub external_port: u16,

    #[serde(default = "default_ack_timeout_secs")]
    pub ack_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
    #[serde(default = "default_retry_ttl_ms")]
    pub retry_ttl_ms: i32,
}

impl Config for ExternalConfig {}

impl ExternalConfig {
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_port() -> u16 {
    3000
}

fn default_ack_timeout_secs() -> u64 {
    10
}

fn default_poll_interval_secs() -> u64 {
    5
}

fn default_max_retries() -> i32 {
    3
}

fn default_retry_ttl_ms() -> i32 {
    10_000
}
