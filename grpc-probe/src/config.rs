//! Configuration management using Figment
//!
//! Configuration is layered with the following precedence (highest to lowest):
//! 1. Command-line flags ([`ProbeOverrides`])
//! 2. Environment variables (prefix: GRPC_PROBE_)
//! 3. An optional TOML file named on the command line
//! 4. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::dialer::Target;
use crate::error::{Error, Result};

/// Environment variable prefix for configuration keys
pub const ENV_PREFIX: &str = "GRPC_PROBE_";

/// Everything a single probe invocation needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Host to dial
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to dial
    #[serde(default = "default_port")]
    pub port: u16,

    /// Require TLS
    #[serde(default)]
    pub tls: bool,

    /// PEM trust root pinned for TLS (ignored without `tls`)
    #[serde(default)]
    pub ca_cert: Option<PathBuf>,

    /// Name the server certificate is verified against (ignored without `tls`)
    #[serde(default)]
    pub ca_name: Option<String>,

    /// Service whose status is queried; empty means the overall status
    #[serde(default)]
    pub service: String,

    /// Upper bound for dialing, including the TLS handshake
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Upper bound for the health check call
    #[serde(default = "default_timeout_ms")]
    pub rpc_timeout_ms: u64,

    /// Log filter (trace, debug, info, warn, error or an EnvFilter directive)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Values supplied on the command line
///
/// Unset fields are skipped when serialized, so they never clobber values
/// from lower-priority layers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProbeOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpc_timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    50051
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: false,
            ca_cert: None,
            ca_name: None,
            service: String::new(),
            connect_timeout_ms: default_timeout_ms(),
            rpc_timeout_ms: default_timeout_ms(),
            log_level: default_log_level(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from all layers
    ///
    /// `file` is an optional TOML file. Unlike the implicit layers, a file
    /// that is named explicitly must exist.
    pub fn load(file: Option<&Path>, overrides: ProbeOverrides) -> Result<Self> {
        let mut figment = Figment::new()
            // Start with defaults
            .merge(Serialized::defaults(ProbeConfig::default()));

        if let Some(path) = file {
            if !path.is_file() {
                return Err(figment::Error::from(format!(
                    "config file '{}' does not exist",
                    path.display()
                ))
                .into());
            }
            tracing::debug!("Loading configuration from: {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        let config: ProbeConfig = figment
            .merge(Env::prefixed(ENV_PREFIX))
            // Flags have highest priority
            .merge(Serialized::defaults(overrides))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject targets and timeouts that cannot possibly succeed
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::InvalidTarget("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(Error::InvalidTarget("port must be between 1 and 65535".to_string()));
        }
        if self.connect_timeout_ms == 0 {
            return Err(Error::InvalidTimeout(
                "connect_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.rpc_timeout_ms == 0 {
            return Err(Error::InvalidTimeout(
                "rpc_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// The dial target
    pub fn target(&self) -> Target {
        Target::new(self.host.trim(), self.port)
    }

    /// Connect timeout as a [`Duration`]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// RPC timeout as a [`Duration`]
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }
}
