//! Shared state for command execution.
//!
//! Holds the active [`Config`] and the active [`MasterConnection`]. Commands
//! receive a `&CtlContext` instead of reaching for process-wide globals, so
//! tests can run several independent contexts side by side.

use std::sync::RwLock;

use dmctl_proto::MasterClient;
use tonic::transport::Channel;
use tracing::info;

use crate::channel::{dial, MasterConnection};
use crate::config::Config;
use crate::{Error, Result};

/// Single-slot store for the active config and master connection.
#[derive(Debug, Default)]
pub struct CtlContext {
    config: RwLock<Option<Config>>,
    client: RwLock<Option<MasterConnection>>,
}

impl CtlContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `config`, replacing any previous value
    pub fn set_config(&self, config: Config) {
        if let Ok(mut guard) = self.config.write() {
            *guard = Some(config);
        }
    }

    /// Current config, or the default config if none was set
    pub fn config(&self) -> Config {
        self.config
            .read()
            .ok()
            .and_then(|g| g.clone())
            .unwrap_or_default()
    }

    /// Store `connection`, replacing any previous one.
    ///
    /// The previous connection is dropped, not shut down; clones of its client
    /// held elsewhere keep working.
    pub fn set_client(&self, connection: MasterConnection) {
        if let Ok(mut guard) = self.client.write() {
            *guard = Some(connection);
        }
    }

    /// Current connection, if one was registered
    pub fn client(&self) -> Option<MasterConnection> {
        self.client.read().ok().and_then(|g| g.clone())
    }

    /// Client handle for issuing RPCs, failing when not initialized
    pub fn master_client(&self) -> Result<MasterClient<Channel>> {
        self.client()
            .map(|conn| conn.client())
            .ok_or(Error::NotConnected)
    }

    /// Store `config` and connect to its master.
    ///
    /// The connection is registered only after the dial succeeds, so a failed
    /// dial leaves the previously registered client untouched.
    pub async fn init(&self, config: Config) -> Result<()> {
        let connection = dial(&config.master_addr, &config.security).await?;
        info!(addr = %connection.addr(), "dm-master client initialized");
        self.set_config(config);
        self.set_client(connection);
        Ok(())
    }
}
