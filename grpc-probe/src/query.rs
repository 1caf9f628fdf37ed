//! The health check RPC
//!
//! Implements the client side of the standard gRPC health checking protocol.
//! See: https://github.com/grpc/grpc/blob/master/doc/health-checking.md

use std::time::Duration;

use tonic::Code;
use tonic_health::pb::health_check_response::ServingStatus;
use tonic_health::pb::health_client::HealthClient;
use tonic_health::pb::HealthCheckRequest;

use crate::dialer::Connection;
use crate::error::{Error, Result};
use crate::verdict::HealthVerdict;

/// Ask the peer for the serving status of `service`
///
/// Exactly one `Check` call is made. An empty `service` asks for the
/// server's overall status. A `NOT_FOUND` reply is how the standard health
/// server reports a service it has never heard of, so it becomes
/// [`HealthVerdict::ServiceUnknown`]; any other failed call is [`Error::Rpc`].
pub async fn query(connection: &Connection, service: &str, timeout: Duration) -> Result<HealthVerdict> {
    let mut client = HealthClient::new(connection.channel());

    let mut request = tonic::Request::new(HealthCheckRequest {
        service: service.to_string(),
    });
    request.set_timeout(timeout);

    tracing::debug!(
        target_addr = %connection.target(),
        service = %service,
        timeout_ms = timeout.as_millis() as u64,
        "Sending health check"
    );

    let response = match tokio::time::timeout(timeout, client.check(request)).await {
        Ok(Ok(response)) => response.into_inner(),
        Ok(Err(status)) if status.code() == Code::NotFound => {
            tracing::debug!(service = %service, message = %status.message(), "Service not registered on peer");
            return Ok(HealthVerdict::ServiceUnknown);
        }
        Ok(Err(status)) => return Err(status.into()),
        Err(_) => {
            return Err(Error::from(tonic::Status::deadline_exceeded(format!(
                "no health check response within {}ms",
                timeout.as_millis()
            ))))
        }
    };

    Ok(verdict_for_status(response.status))
}

/// Map the wire value of `HealthCheckResponse.status`
///
/// Values outside the enumeration are treated as `UNKNOWN`.
pub fn verdict_for_status(status: i32) -> HealthVerdict {
    match ServingStatus::try_from(status) {
        Ok(ServingStatus::Serving) => HealthVerdict::Serving,
        Ok(ServingStatus::NotServing) => HealthVerdict::NotServing,
        Ok(ServingStatus::ServiceUnknown) => HealthVerdict::ServiceUnknown,
        Ok(ServingStatus::Unknown) => HealthVerdict::Unknown,
        Err(_) => {
            tracing::warn!(status, "Peer sent an unrecognized serving status");
            HealthVerdict::Unknown
        }
    }
}
