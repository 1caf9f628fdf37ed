//! Dialing the probe target

use std::fmt;
use std::time::Duration;

use tonic::transport::{Channel, Endpoint};

use crate::error::{Error, Result};
use crate::transport::TransportCredential;

/// Host and port of the service being probed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    /// Create a target
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `host:port`, with bare IPv6 literals bracketed
    pub fn authority(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Full URI for the given scheme
    pub fn uri(&self, scheme: &str) -> String {
        format!("{}://{}", scheme, self.authority())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority())
    }
}

/// An established channel to the target
///
/// Dropping a `Connection` drops its channel handle. Once the last clone is
/// gone, tonic's background task shuts the socket down asynchronously.
/// Clients built from [`Connection::channel`] must not outlive the query
/// they serve.
#[derive(Debug)]
pub struct Connection {
    channel: Channel,
    target: Target,
}

impl Connection {
    /// Channel to build gRPC clients on
    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    /// Target this connection was dialed to
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Drop the channel handle; the socket closes asynchronously
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        tracing::debug!(target_addr = %self.target, "Connection handle dropped");
    }
}

/// Connect to `target` with `credential`, bounded by `timeout`
///
/// For TLS this covers the handshake and certificate verification. Every
/// failure, including the timeout, comes back as [`Error::Connection`].
pub async fn dial(
    target: &Target,
    credential: TransportCredential,
    timeout: Duration,
) -> Result<Connection> {
    let uri = target.uri(credential.scheme());
    tracing::debug!(uri = %uri, timeout_ms = timeout.as_millis() as u64, "Dialing target");

    let authority = target.authority();
    let mut endpoint = Endpoint::from_shared(uri)
        .map_err(|e| Error::connection(authority.as_str(), &e))?
        .connect_timeout(timeout);

    if let Some(tls) = credential.client_tls_config() {
        endpoint = endpoint
            .tls_config(tls)
            .map_err(|e| Error::connection(authority.as_str(), &e))?;
    }

    let channel = match tokio::time::timeout(timeout, endpoint.connect()).await {
        Ok(Ok(channel)) => channel,
        Ok(Err(e)) => return Err(Error::connection(authority, &e)),
        Err(_) => {
            return Err(Error::Connection {
                target: authority,
                reason: format!("timed out after {}ms", timeout.as_millis()),
            })
        }
    };

    tracing::debug!(target_addr = %target, "Connected");

    Ok(Connection {
        channel,
        target: target.clone(),
    })
}
