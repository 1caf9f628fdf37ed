use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use grpc_probe::prelude::*;

const EXIT_CODES: &str = "\
Exit codes:
  0  SERVING
  1  connection, TLS, configuration or RPC failure
  3  NOT_SERVING
  4  UNKNOWN
  5  SERVICE_UNKNOWN";

/// grpc-health-checker - probe a gRPC health endpoint and report through the exit code
#[derive(Parser, Debug)]
#[command(name = "grpc-health-checker")]
#[command(version, about, long_about = None, after_help = EXIT_CODES)]
pub struct Cli {
    /// Host to dial
    #[arg(long)]
    host: Option<String>,

    /// Port to dial
    #[arg(long)]
    port: Option<u16>,

    /// Connect with TLS
    #[arg(long)]
    tls: bool,

    /// PEM file with the CA certificate(s) to trust (TLS only)
    #[arg(long = "cacert", value_name = "PATH")]
    ca_cert: Option<PathBuf>,

    /// Name to verify the server certificate against (TLS only)
    #[arg(long = "caname", value_name = "NAME")]
    ca_name: Option<String>,

    /// Service to query; empty asks for the overall status
    #[arg(short = 's', long = "service", value_name = "NAME")]
    service: Option<String>,

    /// Dial timeout in milliseconds, including the TLS handshake
    #[arg(long = "connect-timeout", value_name = "MS")]
    connect_timeout_ms: Option<u64>,

    /// Health check call timeout in milliseconds
    #[arg(long = "rpc-timeout", value_name = "MS")]
    rpc_timeout_ms: Option<u64>,

    /// Log filter for the diagnostic output on stderr
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,

    /// TOML file with probe settings
    #[arg(short, long, env = "GRPC_PROBE_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ProbeOverrides {
        ProbeOverrides {
            host: self.host.clone(),
            port: self.port,
            // An absent flag must not switch TLS off when a lower layer enabled it
            tls: self.tls.then_some(true),
            ca_cert: self.ca_cert.clone(),
            ca_name: self.ca_name.clone(),
            service: self.service.clone(),
            connect_timeout_ms: self.connect_timeout_ms,
            rpc_timeout_ms: self.rpc_timeout_ms,
            log_level: self.log_level.clone(),
        }
    }

    fn load_config(&self) -> Result<ProbeConfig> {
        ProbeConfig::load(self.config.as_deref(), self.overrides())
            .context("Failed to load probe configuration")
    }
}

async fn execute(cli: Cli) -> i32 {
    let config = match cli.load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            return exit_code::FAILURE;
        }
    };

    init_tracing(&config);

    let verdict = run(&config).await;
    if !verdict.is_serving() {
        eprintln!(
            "{} {} is {}",
            "Unhealthy:".yellow().bold(),
            config.target(),
            verdict
        );
    }

    verdict.exit_code()
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // The channel handle is dropped inside `execute`; any socket tonic has
    // not shut down yet is closed by the OS at exit
    let code = execute(cli).await;

    std::process::exit(code);
}
