//! Dialing the dm-master gRPC endpoint.
//!
//! A dial either returns a connected channel or fails within
//! [`DIAL_TIMEOUT`]. Failed attempts are retried with exponential backoff whose
//! single delay never exceeds [`MAX_BACKOFF_DELAY`]. Nothing is registered
//! here; callers hand the result to [`crate::context::CtlContext::set_client`].
//!
//! TLS handshakes go through a rustls connector built from
//! [`TlsMaterial::client_config`], so the master's certificate is checked
//! against `cert-allowed-cn` rather than only the dialed host.

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dmctl_proto::MasterClient;
use hyper_util::rt::TokioIo;
use rustls::pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tonic::transport::{Channel, Endpoint, Uri};
use tower::service_fn;
use tracing::{debug, info};

use crate::config::SecurityConfig;
use crate::retry::{retry_forever, Backoff};
use crate::tls::TlsMaterial;
use crate::{Error, Result};

/// Overall bound on establishing the connection
pub const DIAL_TIMEOUT: Duration = Duration::from_secs(3);

/// Ceiling on the delay between two connection attempts
pub const MAX_BACKOFF_DELAY: Duration = Duration::from_secs(3);

/// Port assumed when a TLS address carries none
const DEFAULT_TLS_PORT: u16 = 443;

/// A live connection to dm-master.
#[derive(Clone, Debug)]
pub struct MasterConnection {
    client: MasterClient<Channel>,
    addr: String,
}

impl MasterConnection {
    /// Wrap an already connected channel
    pub fn new(channel: Channel, addr: impl Into<String>) -> Self {
        Self {
            client: MasterClient::new(channel),
            addr: addr.into(),
        }
    }

    /// Client handle sharing this connection
    pub fn client(&self) -> MasterClient<Channel> {
        self.client.clone()
    }

    /// Address the connection was dialed with
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

/// Connect to dm-master at `addr` using the TLS settings in `security`.
///
/// Fails with [`Error::InvalidTlsConfig`] before any network activity when
/// the TLS material cannot be loaded, and with [`Error::ConnectionFailed`]
/// when no connection is established within [`DIAL_TIMEOUT`]. The latter
/// carries the cause of the last failed attempt.
pub async fn dial(addr: &str, security: &SecurityConfig) -> Result<MasterConnection> {
    let tls = TlsMaterial::load(security)?
        .map(|material| material.client_config())
        .transpose()?
        .map(|config| TlsConnector::from(Arc::new(config)));

    let endpoint = Endpoint::from_shared(endpoint_uri(addr))
        .map_err(|e| Error::connection_failed(addr, error_chain(&e)))?
        .connect_timeout(DIAL_TIMEOUT);

    info!(addr = %addr, tls = tls.is_some(), "Connecting to dm-master");

    let last_error = Mutex::new(None::<String>);
    let backoff = Backoff::with_max_delay(MAX_BACKOFF_DELAY);
    let attempt = {
        let endpoint = &endpoint;
        let tls = &tls;
        let last_error = &last_error;
        move || async move {
            let result = match tls {
                Some(connector) => {
                    let connector = connector.clone();
                    endpoint
                        .connect_with_connector(service_fn(move |uri: Uri| {
                            connect_tls(connector.clone(), uri)
                        }))
                        .await
                }
                None => endpoint.connect().await,
            };
            result.inspect_err(|e| {
                if let Ok(mut guard) = last_error.lock() {
                    *guard = Some(error_chain(e));
                }
            })
        }
    };

    let channel = tokio::time::timeout(DIAL_TIMEOUT, retry_forever(&backoff, addr, attempt))
        .await
        .map_err(|_| {
            let cause = last_error
                .lock()
                .ok()
                .and_then(|mut guard| guard.take())
                .unwrap_or_else(|| format!("timed out after {:?}", DIAL_TIMEOUT));
            Error::connection_failed(addr, cause)
        })?;

    debug!(addr = %addr, "Connected to dm-master");
    Ok(MasterConnection::new(channel, addr))
}

/// Open a TCP connection to the URI's authority and run the TLS handshake.
async fn connect_tls(connector: TlsConnector, uri: Uri) -> io::Result<TokioIo<TlsStream<TcpStream>>> {
    let host = uri
        .host()
        .map(|h| h.trim_start_matches('[').trim_end_matches(']'))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("no host in {}", uri)))?;
    let port = uri.port_u16().unwrap_or(DEFAULT_TLS_PORT);
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let tcp = TcpStream::connect((host, port)).await?;
    let stream = connector.connect(server_name, tcp).await?;
    Ok(TokioIo::new(stream))
}

/// Turn `host:port` into the endpoint URI.
///
/// TLS is layered on by our own connector, so the URI always uses the
/// plain `http` scheme; a scheme already present is replaced.
fn endpoint_uri(addr: &str) -> String {
    let authority = addr.split_once("://").map_or(addr, |(_, rest)| rest);
    format!("http://{}", authority)
}

/// Display `err` followed by every distinct cause beneath it.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
