//! Verdicts and the exit codes they map to

use std::fmt;

use crate::error::{Error, Result};

/// Process exit codes reported by the probe
pub mod exit_code {
    /// Target is healthy
    pub const SERVING: i32 = 0;
    /// Could not reach or trust the target, or the call failed
    pub const FAILURE: i32 = 1;
    /// Target says the service is not serving
    pub const NOT_SERVING: i32 = 3;
    /// Target reported `UNKNOWN`
    pub const UNKNOWN: i32 = 4;
    /// Target does not know the requested service
    pub const SERVICE_UNKNOWN: i32 = 5;
}

/// Outcome of one probe invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthVerdict {
    Serving,
    NotServing,
    Unknown,
    ServiceUnknown,
    /// Certificate load, dial, handshake or name verification failed
    ConnectionFailed,
    /// Connected, but the health check call failed
    ProtocolFailed,
}

impl HealthVerdict {
    /// Exit code for this verdict
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Serving => exit_code::SERVING,
            Self::ConnectionFailed | Self::ProtocolFailed => exit_code::FAILURE,
            Self::NotServing => exit_code::NOT_SERVING,
            Self::Unknown => exit_code::UNKNOWN,
            Self::ServiceUnknown => exit_code::SERVICE_UNKNOWN,
        }
    }

    /// Verdict for a pipeline error
    pub fn from_error(err: &Error) -> Self {
        match err {
            Error::Rpc(_) => Self::ProtocolFailed,
            Error::Config(_)
            | Error::InvalidTarget(_)
            | Error::InvalidTimeout(_)
            | Error::CertificateLoad { .. }
            | Error::Connection { .. } => Self::ConnectionFailed,
        }
    }

    /// Collapse a pipeline outcome into a verdict
    pub fn settle(outcome: Result<HealthVerdict>) -> Self {
        match outcome {
            Ok(verdict) => verdict,
            Err(err) => {
                let verdict = Self::from_error(&err);
                tracing::warn!(verdict = %verdict, error = %err, "Health probe failed");
                verdict
            }
        }
    }

    /// Whether the target is healthy
    pub fn is_serving(self) -> bool {
        matches!(self, Self::Serving)
    }
}

impl fmt::Display for HealthVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Serving => write!(f, "SERVING"),
            Self::NotServing => write!(f, "NOT_SERVING"),
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::ServiceUnknown => write!(f, "SERVICE_UNKNOWN"),
            Self::ConnectionFailed => write!(f, "connection failed"),
            Self::ProtocolFailed => write!(f, "health check call failed"),
        }
    }
}
