//! Error types for the probe pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the probe
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while probing a health endpoint
///
/// Each variant is terminal for the invocation. The verdict mapper turns
/// them into exit codes; see [`crate::verdict::HealthVerdict::from_error`].
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(Box<figment::Error>),

    /// Host or port cannot be dialed
    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    /// A dial or call timeout that can never succeed
    #[error("Invalid timeout: {0}")]
    InvalidTimeout(String),

    /// Pinned CA file is missing or does not hold any PEM certificate
    #[error("Failed to load CA certificate '{}': {reason}", path.display())]
    CertificateLoad {
        /// Path that was read
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// Dial, TLS handshake or certificate name verification failed
    #[error("Connection to {target} failed: {reason}")]
    Connection {
        /// Authority that was dialed
        target: String,
        /// Full source chain of the failure
        reason: String,
    },

    /// The connection was up but the health check call failed
    #[error("Health check RPC failed: {0}")]
    Rpc(Box<tonic::Status>),
}

impl Error {
    /// Build a [`Error::Connection`] from any error, keeping its source chain
    pub(crate) fn connection(
        target: impl Into<String>,
        err: &(dyn std::error::Error + 'static),
    ) -> Self {
        Error::Connection {
            target: target.into(),
            reason: error_chain(err),
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(Box::new(err))
    }
}

impl From<tonic::Status> for Error {
    fn from(status: tonic::Status) -> Self {
        Error::Rpc(Box::new(status))
    }
}

/// Render an error and all of its sources as `outer: inner: root`
///
/// tonic's transport errors only say "transport error" at the top level, so
/// the interesting part (refused, handshake, name mismatch) lives in the chain.
pub(crate) fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !rendered.ends_with(&cause_text) {
            rendered.push_str(": ");
            rendered.push_str(&cause_text);
        }
        source = cause.source();
    }
    rendered
}
