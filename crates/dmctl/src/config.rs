//! dmctl configuration.
//!
//! The effective config is assembled from (highest priority first):
//! 1. Command-line flags (`--master-addr`, `--ssl-ca`, ...)
//! 2. `DM_MASTER_ADDR` for the master address
//! 3. The TOML file given by `--config`
//! 4. Built-in defaults

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Default deadline applied to every RPC
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// TLS settings used to reach the master.
///
/// All paths empty means plaintext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SecurityConfig {
    /// Path of the CA certificate used to verify the master
    pub ssl_ca: String,
    /// Path of the client certificate
    pub ssl_cert: String,
    /// Path of the client private key
    pub ssl_key: String,
    /// Common names the master certificate may carry
    pub cert_allowed_cn: Vec<String>,
}

/// Snapshot of the settings dmctl runs with.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Master address as `host:port`
    pub master_addr: String,
    /// Deadline for every RPC
    #[serde(with = "duration_secs")]
    pub rpc_timeout: Duration,
    #[serde(flatten)]
    pub security: SecurityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            master_addr: String::new(),
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    /// Parse a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Check the master address is a usable `host:port`.
    pub fn validate(&self) -> Result<()> {
        if self.master_addr.is_empty() {
            return Err(Error::validation("master-addr not provided"));
        }
        let addr = strip_scheme(&self.master_addr);
        let Some((host, port)) = addr.rsplit_once(':') else {
            return Err(Error::validation(format!(
                "master-addr {} must be in host:port format",
                self.master_addr
            )));
        };
        if host.is_empty() || port.parse::<u16>().is_err() {
            return Err(Error::validation(format!(
                "master-addr {} must be in host:port format",
                self.master_addr
            )));
        }
        if self.rpc_timeout.is_zero() {
            return Err(Error::validation("rpc-timeout must be greater than zero"));
        }
        Ok(())
    }
}

fn strip_scheme(addr: &str) -> &str {
    addr.strip_prefix("https://")
        .or_else(|| addr.strip_prefix("http://"))
        .unwrap_or(addr)
}

/// `rpc-timeout` is written as whole seconds in the config file
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
