use std::time::Duration;

use serde::Deserialize;

use dari_core::config::Config;

use crate::session::driver::SessionConfig;
use crate::usecase::report_transmit::TransmitSettings;

/// Central service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct CentralConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// AMQP connection URL.
    pub broker_url: String,
    /// Upstream alerting endpoint.
    pub cas_host: String,
    #[serde(default = "default_cas_port")]
    pub cas_port: u16,
    /// Our id on the link (`destId`).
    pub cas_dest_id: String,
    pub cas_password: String,
    /// Fixed magic number every frame header carries.
    pub cas_magic: u32,
    /// Sender id stamped on outbound report CAPs.
    pub central_id: String,
    /// Addressee system id stamped on outbound report CAPs.
    pub central_address: String,

    #[serde(default = "default_ten_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_ten_secs")]
    pub response_timeout_secs: u64,
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_ten_secs")]
    pub pong_timeout_secs: u64,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_ten_secs")]
    pub ack_timeout_secs: u64,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
    #[serde(default = "default_retry_ttl_ms")]
    pub retry_ttl_ms: i32,
}

impl Config for CentralConfig {}

impl CentralConfig {
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            host: self.cas_host.clone(),
            port: self.cas_port,
            dest_id: self.cas_dest_id.clone(),
            password: self.cas_password.clone(),
            magic: self.cas_magic,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            response_timeout: Duration::from_secs(self.response_timeout_secs),
            ping_interval: Duration::from_secs(self.ping_interval_secs),
            pong_timeout: Duration::from_secs(self.pong_timeout_secs),
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
        }
    }

    pub fn transmit(&self) -> TransmitSettings {
        TransmitSettings {
            max_retries: self.max_retries,
            ack_timeout: Duration::from_secs(self.ack_timeout_secs),
            central_id: self.central_id.clone(),
            central_address: self.central_address.clone(),
            magic: self.cas_magic,
        }
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn ack_timeout(&self) -> Duration {
        Duration::from_secs(self.ack_timeout_secs)
    }
}

fn default_cas_port() -> u16 {
    9977
}

fn default_ten_secs() -> u64 {
    10
}

fn default_ping_interval_secs() -> u64 {
    30
}

fn default_reconnect_delay_secs() -> u64 {
    60
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
