//! The probe pipeline: build transport, dial, query, settle

use crate::config::ProbeConfig;
use crate::dialer::dial;
use crate::error::Result;
use crate::query::query;
use crate::transport::{TransportCredential, TransportPlan};
use crate::verdict::HealthVerdict;

/// Run one probe and return its verdict
///
/// The connection handle opened here is dropped before this returns, whatever
/// the outcome. tonic closes the socket from its background task the next
/// time the runtime gets to it; if the process exits first, the OS closes it.
#[tracing::instrument(
    name = "probe",
    skip_all,
    fields(target_addr = %config.target(), service = %config.service, tls = config.tls)
)]
pub async fn run(config: &ProbeConfig) -> HealthVerdict {
    let verdict = HealthVerdict::settle(check(config).await);
    tracing::info!(verdict = %verdict, exit_code = verdict.exit_code(), "Health probe finished");
    verdict
}

async fn check(config: &ProbeConfig) -> Result<HealthVerdict> {
    config.validate()?;

    let plan = TransportPlan::select(config);
    let credential = TransportCredential::build(plan)?;

    let connection = dial(&config.target(), credential, config.connect_timeout()).await?;
    let verdict = query(&connection, &config.service, config.rpc_timeout()).await;
    connection.close();

    verdict
}
