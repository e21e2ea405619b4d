//! Figment-based configuration loading.
//!
//! Configuration priority (highest wins):
//! 1. CLI arguments (applied after Figment load)
//! 2. Config file (TOML)
//! 3. Environment variables (`PINGER_` prefix, `__` separates sections)
//! 4. Defaults

use std::{net::SocketAddr, path::Path, time::Duration};

use eyre::{Result, WrapErr, ensure};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use pinger_net_host::HostConfig;
use pinger_net_ping::{PING_INTERVAL, PingConfig, RESPONSE_TIMEOUT};
use pinger_observability::LogArgs;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

/// Complete pinger configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingerConfig {
    /// Host configuration.
    pub network: HostConfig,

    /// Probe timing.
    pub ping: PingSettings,

    /// Metrics exporter.
    pub metrics: MetricsSettings,

    /// Logging configuration.
    pub logs: LogArgs,
}

/// Probe timing in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PingSettings {
    pub interval_ms: u64,
    pub timeout_ms: u64,
}

impl Default for PingSettings {
    fn default() -> Self {
        Self {
            interval_ms: PING_INTERVAL.as_millis() as u64,
            timeout_ms: RESPONSE_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Prometheus exporter settings. No address means no exporter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<SocketAddr>,
}

impl PingerConfig {
    /// Load configuration from defaults, environment, and config file.
    /// CLI overrides should be applied separately after loading.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(PingerConfig::default()))
            .merge(Env::prefixed("PINGER_").split("__"));

        if let Some(path) = config_path {
            ensure!(path.exists(), "config file {} not found", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment.extract().wrap_err("Failed to load configuration")
    }

    /// Apply the flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.network.port = port;
        }
        if let Some(addr) = cli.addr {
            self.network.addr = addr;
        }
        if let Some(transport) = cli.transport {
            self.network.transport = transport;
        }
        if cli.seed.is_some() {
            self.network.seed = cli.seed;
        }
        if let Some(interval_ms) = cli.interval_ms {
            self.ping.interval_ms = interval_ms;
        }
        if let Some(timeout_ms) = cli.timeout_ms {
            self.ping.timeout_ms = timeout_ms;
        }
        if cli.metrics_addr.is_some() {
            self.metrics.addr = cli.metrics_addr;
        }

        // Verbosity is CLI-only.
        self.logs.verbosity = cli.logs.verbosity;
        self.logs.quiet |= cli.logs.quiet;
        self.logs.json |= cli.logs.json;
        if cli.logs.filter.is_some() {
            self.logs.filter = cli.logs.filter.clone();
        }
    }

    /// Reject settings the protocol cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.ping.timeout_ms > 0, "ping timeout must be positive");
        ensure!(self.network.idle_timeout_secs > 0, "idle timeout must be positive");
        Ok(())
    }

    pub fn ping_config(&self) -> PingConfig {
        PingConfig::default()
            .with_interval(Duration::from_millis(self.ping.interval_ms))
            .with_timeout(Duration::from_millis(self.ping.timeout_ms))
    }
}
