use crate::{IpProbe, ProbeContext, ProbeError};
use futures::future::join_all;
use proxykit_containers::IpInfo;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Outcome for one container in a batch.
#[derive(Debug)]
pub struct ProbeResult {
    pub cookie_store_id: String,
    pub outcome: Result<IpInfo, ProbeError>,
}

/// Probe every context concurrently.
///
/// Results come back in input order; one failure never affects the others.
/// Probes still pending when `cancel` fires resolve to
/// [`ProbeError::Cancelled`].
pub async fn detect_all(
    probe: &dyn IpProbe,
    contexts: Vec<ProbeContext>,
    cancel: &CancellationToken,
) -> Vec<ProbeResult> {
    let total = contexts.len();
    let futures = contexts.into_iter().map(|ctx| async move {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(ProbeError::Cancelled),
            res = probe.detect(&ctx) => res,
        };
        ProbeResult {
            cookie_store_id: ctx.cookie_store_id,
            outcome,
        }
    });
    let results = join_all(futures).await;
    debug!(
        total,
        failed = results.iter().filter(|r| r.outcome.is_err()).count(),
        "probe.batch.done"
    );
    results
}
