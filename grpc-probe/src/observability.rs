//! Diagnostic logging
//!
//! Logs go to stderr as JSON. They are for humans reading orchestrator
//! output; the exit code is the only contract.

use tracing_subscriber::EnvFilter;

use crate::config::ProbeConfig;

/// Initialize tracing for a probe run
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_tracing(config: &ProbeConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(log_level = %config.log_level, "Tracing initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        let config = ProbeConfig::default();
        init_tracing(&config);
        // This should not panic
        init_tracing(&config);
    }

    #[test]
    fn test_invalid_filter_falls_back() {
        let config = ProbeConfig {
            log_level: "not a [valid filter".to_string(),
            ..Default::default()
        };
        init_tracing(&config);
    }
}
