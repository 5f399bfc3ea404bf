//! Periodic IP refresh.
//!
//! Every tick spawns an independent batch; a slow batch does not hold back the
//! next one, so two batches may overlap and publish out of order. Each
//! snapshot carries the tick that produced it.
use crate::refresh::{ContainerRow, IpRefresh};
use proxykit_common::ProxyKitError;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tick: u64,
    pub rows: Vec<ContainerRow>,
    /// False while the batch is still showing placeholders.
    pub complete: bool,
    /// Set when the host has no container support.
    pub unavailable: bool,
}

pub struct Refresher {
    pub snapshots: watch::Receiver<Snapshot>,
    task: JoinHandle<()>,
}

impl Refresher {
    /// Wait for the driver loop (and any batches in flight) to finish.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            warn!(error = %e, "ui.refresher.join_failed");
        }
    }
}

pub fn spawn_refresher(refresh: IpRefresh, every: Duration, cancel: CancellationToken) -> Refresher {
    let (tx, rx) = watch::channel(Snapshot::default());
    let task = tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut batches = JoinSet::new();
        let mut tick = 0u64;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {
                    tick += 1;
                    debug!(tick, in_flight = batches.len(), "ui.refresher.tick");
                    batches.spawn(run_batch(refresh.clone(), tick, tx.clone(), cancel.clone()));
                }
                Some(res) = batches.join_next(), if !batches.is_empty() => {
                    if let Err(e) = res {
                        warn!(error = %e, "ui.refresher.batch_panicked");
                    }
                }
            }
        }
        batches.shutdown().await;
    });
    Refresher { snapshots: rx, task }
}

async fn run_batch(
    refresh: IpRefresh,
    tick: u64,
    tx: watch::Sender<Snapshot>,
    cancel: CancellationToken,
) {
    let containers = match refresh.containers().await {
        Ok(list) => list,
        Err(ProxyKitError::HostCapabilityUnavailable(_)) => {
            tx.send_replace(Snapshot {
                tick,
                rows: Vec::new(),
                complete: true,
                unavailable: true,
            });
            return;
        }
        Err(e) => {
            warn!(error = %e, "ui.refresher.containers_failed");
            return;
        }
    };
    tx.send_replace(Snapshot {
        tick,
        rows: IpRefresh::placeholders(&containers),
        complete: false,
        unavailable: false,
    });
    let rows = refresh.refresh_batch(containers, &cancel).await;
    if cancel.is_cancelled() {
        return;
    }
    tx.send_replace(Snapshot {
        tick,
        rows,
        complete: true,
        unavailable: false,
    });
}
