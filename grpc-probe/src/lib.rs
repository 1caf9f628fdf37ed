//! # grpc-probe
//!
//! A single-shot client for the standard gRPC health checking protocol, built
//! to back liveness and readiness probes.
//!
//! The pipeline is linear: pick a transport, dial, send one `Check`, and map
//! the outcome to an exit code.
//!
//! | Verdict | Exit code |
//! |---|---|
//! | `SERVING` | 0 |
//! | connection, TLS or call failure | 1 |
//! | `NOT_SERVING` | 3 |
//! | `UNKNOWN` | 4 |
//! | `SERVICE_UNKNOWN` | 5 |
//!
//! ## Example
//!
//! ```rust,no_run
//! use grpc_probe::prelude::*;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let config = ProbeConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 50051,
//!         service: "orders.v1.OrderService".to_string(),
//!         ..Default::default()
//!     };
//!
//!     init_tracing(&config);
//!
//!     let verdict = run(&config).await;
//!     std::process::exit(verdict.exit_code());
//! }
//! ```

pub mod config;
pub mod dialer;
pub mod error;
pub mod observability;
pub mod probe;
pub mod query;
pub mod transport;
pub mod verdict;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{ProbeConfig, ProbeOverrides};
    pub use crate::dialer::{dial, Connection, Target};
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;
    pub use crate::probe::run;
    pub use crate::query::query;
    pub use crate::transport::{TransportCredential, TransportPlan, TrustRoot};
    pub use crate::verdict::{exit_code, HealthVerdict};
}
