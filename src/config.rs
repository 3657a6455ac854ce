// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use crate::core::acl::CapabilitySet;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// One device allowed to authenticate, and what it may do once it has.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub name: String,
    pub password: String,
    /// Capability names such as `"play"` or `"getState"`; `"all"` grants everything.
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "phone".to_string(),
            password: "pass".to_string(),
            capabilities: default_capabilities(),
        }
    }
}

fn default_capabilities() -> Vec<String> {
    vec!["all".to_string()]
}

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_metrics_port() -> u16 {
    8878
}

/// The complete server configuration.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    /// `0` binds an ephemeral port.
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Longest single wait of the accept loop before it re-checks its state.
    #[serde(default = "default_poll_timeout_ms")]
    pub accept_timeout_ms: u64,
    /// Longest single wait for a request line before the handler re-checks its state.
    #[serde(default = "default_poll_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Extra delay before announcing a closed connection to observers.
    #[serde(default)]
    pub close_notify_delay_ms: u64,
    /// The serialized catalog document served by `CHECK` and `UPDATE`.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
    #[serde(default = "default_devices")]
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    9999
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_poll_timeout_ms() -> u64 {
    50
}
fn default_catalog_path() -> String {
    "MusicLibrary.xml".to_string()
}
fn default_devices() -> Vec<DeviceConfig> {
    vec![DeviceConfig::default()]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            accept_timeout_ms: default_poll_timeout_ms(),
            read_timeout_ms: default_poll_timeout_ms(),
            close_notify_delay_ms: 0,
            catalog_path: default_catalog_path(),
            devices: default_devices(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("Invalid configuration in '{path}'"))?;
        Ok(config)
    }

    /// Like `from_file`, but a missing file yields the defaults. Used for the
    /// implicit `config.toml`; an explicitly named file must exist.
    pub fn from_file_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            info!("No config file at '{}', using defaults.", path);
            Ok(Self::default())
        }
    }

    /// Parses and validates a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn accept_timeout(&self) -> Duration {
        Duration::from_millis(self.accept_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn close_notify_delay(&self) -> Duration {
        Duration::from_millis(self.close_notify_delay_ms)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.accept_timeout_ms == 0 {
            return Err(anyhow!("accept_timeout_ms must be greater than 0"));
        }
        if self.read_timeout_ms == 0 {
            return Err(anyhow!("read_timeout_ms must be greater than 0"));
        }
        if self.devices.is_empty() {
            warn!("No devices configured. No client will be able to authenticate.");
        }

        let mut seen = HashSet::new();
        for (i, device) in self.devices.iter().enumerate() {
            if device.name.trim().is_empty() {
                return Err(anyhow!("device #{}: name cannot be empty", i + 1));
            }
            if !seen.insert(device.name.as_str()) {
                return Err(anyhow!("device '{}' is configured twice", device.name));
            }
            CapabilitySet::from_names(&device.capabilities)
                .map_err(|e| anyhow!("device '{}': {}", device.name, e))?;
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}

/// Parses a `--port` override. Unlike the config file, `0` is rejected here.
pub fn parse_port(value: &str) -> Result<u16> {
    let port: u16 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid port number: {value}"))?;
    if port == 0 {
        return Err(anyhow!("Port must be in the range 1 to 65535"));
    }
    Ok(port)
}
