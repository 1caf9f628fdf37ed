//! Runs the built binary against in-process health servers and checks exit codes

use std::process::Command;

use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Identity, Server, ServerTlsConfig};
use tonic_health::server::HealthReporter;
use tonic_health::ServingStatus;

const CLI: &str = env!("CARGO_BIN_EXE_grpc-health-checker");
const TESTDATA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../grpc-probe/testdata");

struct HealthEndpoint {
    port: u16,
    reporter: HealthReporter,
    _shutdown: oneshot::Sender<()>,
}

async fn start_health_endpoint(tls: bool) -> HealthEndpoint {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (reporter, service) = tonic_health::server::health_reporter();
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let mut builder = Server::builder();
    if tls {
        let cert = std::fs::read(format!("{TESTDATA}/server.crt")).unwrap();
        let key = std::fs::read(format!("{TESTDATA}/server.key")).unwrap();
        builder = builder
            .tls_config(ServerTlsConfig::new().identity(Identity::from_pem(cert, key)))
            .unwrap();
    }

    tokio::spawn(async move {
        let _ = builder
            .add_service(service)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), async {
                let _ = shutdown_rx.await;
            })
            .await;
    });

    HealthEndpoint {
        port,
        reporter,
        _shutdown: shutdown_tx,
    }
}

/// Run the probe against `port` with extra arguments and return its exit code
async fn probe(port: u16, args: &[&str]) -> i32 {
    let mut command = Command::new(CLI);
    command
        .args(["--host", "127.0.0.1", "--port", &port.to_string()])
        .args(["--connect-timeout", "2000", "--rpc-timeout", "2000"]
            .chunks(2)
            .filter(|flag| !args.contains(&flag[0]))
            .flatten())
        .args(args)
        .env_remove("GRPC_PROBE_CONFIG")
        .env_remove("GRPC_PROBE_TLS")
        .env_remove("GRPC_PROBE_SERVICE");

    let status = tokio::task::spawn_blocking(move || command.status())
        .await
        .unwrap()
        .expect("failed to run grpc-health-checker");
    status.code().expect("probe was killed by a signal")
}

fn ca_cert() -> String {
    format!("{TESTDATA}/ca.crt")
}

#[tokio::test(flavor = "multi_thread")]
async fn serving() {
    let endpoint = start_health_endpoint(false).await;
    assert_eq!(probe(endpoint.port, &[]).await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn serving_tls() {
    let endpoint = start_health_endpoint(true).await;
    let ca = ca_cert();
    assert_eq!(probe(endpoint.port, &["--tls", "--cacert", &ca]).await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn serving_non_tls_client() {
    let endpoint = start_health_endpoint(true).await;
    assert_eq!(probe(endpoint.port, &[]).await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn serving_non_tls_server() {
    let endpoint = start_health_endpoint(false).await;
    let ca = ca_cert();
    assert_eq!(probe(endpoint.port, &["--tls", "--cacert", &ca]).await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn serving_tls_wrong_hostname() {
    let endpoint = start_health_endpoint(true).await;
    let ca = ca_cert();
    let code = probe(endpoint.port, &["--tls", "--cacert", &ca, "--caname", "foobar"]).await;
    assert_eq!(code, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn not_serving() {
    let mut endpoint = start_health_endpoint(false).await;
    endpoint
        .reporter
        .set_service_status("foobar.service", ServingStatus::NotServing)
        .await;
    assert_eq!(probe(endpoint.port, &["-s", "foobar.service"]).await, 3);
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_status() {
    let mut endpoint = start_health_endpoint(false).await;
    endpoint
        .reporter
        .set_service_status("warming.service", ServingStatus::Unknown)
        .await;
    assert_eq!(probe(endpoint.port, &["-s", "warming.service"]).await, 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_timeout() {
    let endpoint = start_health_endpoint(false).await;
    assert_eq!(probe(endpoint.port, &["--rpc-timeout", "0"]).await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn service_unknown() {
    let endpoint = start_health_endpoint(false).await;
    assert_eq!(probe(endpoint.port, &["-s", "not.registered"]).await, 5);
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_config_file() {
    let endpoint = start_health_endpoint(false).await;
    let code = probe(endpoint.port, &["--config", "/nonexistent/grpc-probe.toml"]).await;
    assert_eq!(code, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn nothing_listening() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    assert_eq!(probe(port, &[]).await, 1);
}
