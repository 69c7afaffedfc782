//! CLI commands

use std::io::Write;
use std::time::Duration;

use clap::Args;

use crate::config::Config;
use crate::context::CtlContext;
use crate::render::{print_response, print_response_with_check_task, Response};
use crate::Result;

pub mod handle_error;
pub mod operate_task;
pub mod query_status;
pub mod task;

/// Substring marking a pre-check report embedded in a response message
pub const CHECK_TASK_MARKER: &str = "detail";

/// Connection flags shared by every command
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Path to a TOML config file
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// dm-master address as host:port
    #[arg(long, global = true, env = "DM_MASTER_ADDR")]
    pub master_addr: Option<String>,

    /// RPC timeout in seconds
    #[arg(long, global = true)]
    pub rpc_timeout: Option<u64>,

    /// Path of the CA certificate
    #[arg(long, global = true)]
    pub ssl_ca: Option<String>,

    /// Path of the client certificate
    #[arg(long, global = true)]
    pub ssl_cert: Option<String>,

    /// Path of the client private key
    #[arg(long, global = true)]
    pub ssl_key: Option<String>,

    /// Allowed common names of the dm-master certificate
    #[arg(long, global = true, value_delimiter = ',')]
    pub cert_allowed_cn: Vec<String>,
}

impl GlobalArgs {
    /// Build the effective config: file values overridden by flags
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };

        if let Some(addr) = &self.master_addr {
            config.master_addr.clone_from(addr);
        }
        if let Some(secs) = self.rpc_timeout {
            config.rpc_timeout = Duration::from_secs(secs);
        }
        if let Some(ca) = &self.ssl_ca {
            config.security.ssl_ca.clone_from(ca);
        }
        if let Some(cert) = &self.ssl_cert {
            config.security.ssl_cert.clone_from(cert);
        }
        if let Some(key) = &self.ssl_key {
            config.security.ssl_key.clone_from(key);
        }
        if !self.cert_allowed_cn.is_empty() {
            config.security.cert_allowed_cn.clone_from(&self.cert_allowed_cn);
        }

        config.validate()?;
        Ok(config)
    }
}

/// `-s/--source` list accepted by task commands
#[derive(Args, Debug, Default, Clone)]
pub struct SourceArgs {
    /// MySQL source IDs to operate on, repeatable or comma separated
    #[arg(short = 's', long = "source", value_delimiter = ',')]
    pub sources: Vec<String>,
}

/// Wrap `message` in a request carrying the configured RPC deadline
pub fn rpc_request<T>(ctx: &CtlContext, message: T) -> tonic::Request<T> {
    let mut request = tonic::Request::new(message);
    request.set_timeout(ctx.config().rpc_timeout);
    request
}

/// Print a response, keeping an embedded pre-check report readable
pub fn print_task_response(out: &mut impl Write, resp: Response) {
    if !print_response_with_check_task(out, &resp, CHECK_TASK_MARKER) {
        print_response(out, &resp);
    }
}
