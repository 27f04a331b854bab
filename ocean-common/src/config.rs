//! Configuration loading and config file resolution
//!
//! Configuration is resolved in priority order:
//! 1. Command-line argument (highest priority, handled by the binary)
//! 2. Environment variable (handled by the binary through clap's `env`)
//! 3. TOML config file
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable config file is never fatal: a warning is logged
//! and compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "OCEANGPT_CONFIG";

/// Config file name looked up in the platform config directories
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5780,
        }
    }
}

/// Scenario playback timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Wall-clock length of one scenario "second", in milliseconds
    pub step_unit_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self { step_unit_ms: 1000 }
    }
}

/// Conversation timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationSettings {
    /// Simulated latency before the assistant reply is appended
    pub reply_delay_ms: u64,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            reply_delay_ms: 1500,
        }
    }
}

/// Simulated catalog latencies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    pub list_latency_ms: u64,
    pub profile_latency_ms: u64,
    pub nearest_latency_ms: u64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            list_latency_ms: 500,
            profile_latency_ms: 800,
            nearest_latency_ms: 300,
        }
    }
}

/// Simulated query responder latency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderSettings {
    pub latency_ms: u64,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self { latency_ms: 1500 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Top-level TOML configuration file
///
/// Every section is optional; absent keys take compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub server: ServerConfig,
    pub playback: PlaybackSettings,
    pub conversation: ConversationSettings,
    pub catalog: CatalogSettings,
    pub responder: ResponderSettings,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the playback engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.playback.step_unit_ms == 0 {
            return Err(Error::Config(
                "playback.step_unit_ms must be greater than zero".to_string(),
            ));
        }
        if self.server.host.trim().is_empty() {
            return Err(Error::Config("server.host must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Load and validate a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    TomlConfig::from_toml_str(&content)
}

/// Locates the config file and loads it with graceful degradation
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    module_name: String,
    explicit_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            explicit_path: None,
        }
    }

    /// Use an explicit config path (from the command line)
    pub fn with_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    /// Find the config file to use, if any
    ///
    /// Order: explicit path, `OCEANGPT_CONFIG`, user config directory,
    /// then `/etc/oceangpt` on Linux. Explicit paths are returned even if
    /// they do not exist so that the caller can report them.
    pub fn locate(&self) -> Option<PathBuf> {
        if let Some(path) = &self.explicit_path {
            return Some(path.clone());
        }

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        let user_config = dirs::config_dir().map(|d| d.join("oceangpt").join(CONFIG_FILE_NAME));
        if let Some(path) = user_config {
            if path.exists() {
                return Some(path);
            }
        }

        if cfg!(target_os = "linux") {
            let system_config = PathBuf::from("/etc/oceangpt").join(CONFIG_FILE_NAME);
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Resolve configuration, falling back to compiled defaults
    pub fn resolve(&self) -> TomlConfig {
        let Some(path) = self.locate() else {
            info!(
                "{}: no config file found, using compiled defaults",
                self.module_name
            );
            return TomlConfig::default();
        };

        match load_toml_config(&path) {
            Ok(config) => {
                info!("{}: loaded config from {}", self.module_name, path.display());
                config
            }
            Err(e) => {
                warn!(
                    "{}: failed to load config {} ({}), using compiled defaults",
                    self.module_name,
                    path.display(),
                    e
                );
                TomlConfig::default()
            }
        }
    }
}
