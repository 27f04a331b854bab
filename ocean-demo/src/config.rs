//! Runtime configuration for ocean-demo
//!
//! Merges the TOML file (resolved by `ocean_common::config`) with command
//! line overrides into the values the services are built from.

use crate::catalog::CatalogLatency;
use crate::error::{Error, Result};
use ocean_common::config::TomlConfig;
use ocean_common::time::millis_to_duration;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Values given on the command line (or their environment variables)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub step_unit_ms: Option<u64>,
    pub reply_delay_ms: Option<u64>,
    pub log_level: Option<String>,
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub host: String,
    pub port: u16,
    /// Wall-clock length of one scenario-step second
    pub step_unit: Duration,
    pub reply_delay_ms: u64,
    pub catalog_latency: CatalogLatency,
    pub responder_latency_ms: u64,
    pub log_level: String,
}

impl DemoConfig {
    pub fn resolve(file: &TomlConfig, overrides: &ConfigOverrides) -> Result<Self> {
        let step_unit_ms = overrides.step_unit_ms.unwrap_or(file.playback.step_unit_ms);
        if step_unit_ms == 0 {
            return Err(Error::Config("step unit must be greater than zero".to_string()));
        }

        Ok(Self {
            host: overrides.host.clone().unwrap_or_else(|| file.server.host.clone()),
            port: overrides.port.unwrap_or(file.server.port),
            step_unit: millis_to_duration(step_unit_ms),
            reply_delay_ms: overrides
                .reply_delay_ms
                .unwrap_or(file.conversation.reply_delay_ms),
            catalog_latency: CatalogLatency::from(&file.catalog),
            responder_latency_ms: file.responder.latency_ms,
            log_level: overrides
                .log_level
                .clone()
                .unwrap_or_else(|| file.logging.level.clone()),
        })
    }

    pub fn bind_address(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| Error::Config(format!("invalid host '{}': {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        let file = TomlConfig::default();
        Self {
            host: file.server.host,
            port: file.server.port,
            step_unit: millis_to_duration(file.playback.step_unit_ms),
            reply_delay_ms: file.conversation.reply_delay_ms,
            catalog_latency: CatalogLatency::from(&file.catalog),
            responder_latency_ms: file.responder.latency_ms,
            log_level: file.logging.level,
        }
    }
}
