//! Task tracking and shutdown signalling for the background process.
//!
//! Every long-lived task is spawned into one `JoinSet` and watches a shared
//! `CancellationToken`; shutdown cancels the token and then drains the set.
use anyhow::Result;
use std::future::Future;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub struct ActorSystem {
    joinset: JoinSet<Result<()>>,
    cancel: CancellationToken,
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorSystem {
    pub fn new() -> Self {
        Self {
            joinset: JoinSet::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn track(&mut self, fut: impl Future<Output = Result<()>> + Send + 'static) {
        self.joinset.spawn(fut);
    }

    pub fn signal_shutdown(&self) {
        self.cancel.cancel();
    }

    /// Cancel and wait for every tracked task; the first failure wins.
    pub async fn graceful_shutdown(mut self) -> Result<()> {
        self.cancel.cancel();
        while let Some(res) = self.joinset.join_next().await {
            res??;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_waits_for_tracked_tasks() {
        let mut system = ActorSystem::new();
        let token = system.cancel_token();
        let (tx, rx) = tokio::sync::oneshot::channel();
        system.track(async move {
            token.cancelled().await;
            let _ = tx.send(());
            Ok(())
        });
        system.graceful_shutdown().await.unwrap();
        rx.await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_surfaces_task_errors() {
        let mut system = ActorSystem::new();
        system.track(async { anyhow::bail!("task failed") });
        assert!(system.graceful_shutdown().await.is_err());
    }
}
