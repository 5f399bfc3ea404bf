//! Per-container IP reports for the UI.
//!
//! A probe result wins; otherwise the background's cached detection; otherwise
//! a placeholder. Nothing here returns an error to the caller.
use proxykit_actors::{BackgroundClient, Request, Response};
use proxykit_common::ProxyKitError;
use proxykit_containers::{ContainerHost, ContainerIdentity, HostError};
use proxykit_probe::{IpProbe, IpReport, ProbeContext, ProbeResult, assign_routes, detect_all};
use proxykit_store::DocumentStore;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRow {
    pub container: ContainerIdentity,
    pub report: IpReport,
}

#[derive(Clone)]
pub struct IpRefresh {
    background: BackgroundClient,
    host: Option<Arc<dyn ContainerHost>>,
    probe: Arc<dyn IpProbe>,
    documents: DocumentStore,
    route_through_proxy: bool,
}

impl IpRefresh {
    pub fn new(
        background: BackgroundClient,
        host: Option<Arc<dyn ContainerHost>>,
        probe: Arc<dyn IpProbe>,
        documents: DocumentStore,
        route_through_proxy: bool,
    ) -> Self {
        Self {
            background,
            host,
            probe,
            documents,
            route_through_proxy,
        }
    }

    /// Containers in host order, or `HostCapabilityUnavailable`.
    pub async fn containers(&self) -> Result<Vec<ContainerIdentity>, ProxyKitError> {
        let host = self
            .host
            .as_ref()
            .ok_or_else(|| ProxyKitError::from(HostError::Unavailable))?;
        Ok(host.query().await?)
    }

    /// One probe context per container, routed through its persona.
    pub async fn contexts(&self, containers: &[ContainerIdentity]) -> Vec<ProbeContext> {
        if !self.route_through_proxy {
            return assign_routes(containers, None);
        }
        let document = match self.documents.load().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "ui.refresh.document_unreadable");
                None
            }
        };
        assign_routes(containers, document.as_ref())
    }

    pub fn placeholders(containers: &[ContainerIdentity]) -> Vec<ContainerRow> {
        containers
            .iter()
            .map(|c| ContainerRow {
                container: c.clone(),
                report: IpReport::detecting(),
            })
            .collect()
    }

    /// Probe `containers` concurrently and resolve every row.
    pub async fn refresh_batch(
        &self,
        containers: Vec<ContainerIdentity>,
        cancel: &CancellationToken,
    ) -> Vec<ContainerRow> {
        let contexts = self.contexts(&containers).await;
        let results = detect_all(self.probe.as_ref(), contexts, cancel).await;
        let mut rows = Vec::with_capacity(containers.len());
        for (container, result) in containers.into_iter().zip(results) {
            let report = self.resolve(result).await;
            rows.push(ContainerRow { container, report });
        }
        rows
    }

    /// Refresh a single container by id.
    pub async fn refresh_one(&self, cookie_store_id: &str, cancel: &CancellationToken) -> IpReport {
        let containers = match self.containers().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "ui.refresh.containers_failed");
                return IpReport::error();
            }
        };
        let Some(ctx) = self
            .contexts(&containers)
            .await
            .into_iter()
            .find(|c| c.cookie_store_id == cookie_store_id)
        else {
            return IpReport::error();
        };
        let mut results = detect_all(self.probe.as_ref(), vec![ctx], cancel).await;
        match results.pop() {
            Some(result) => self.resolve(result).await,
            None => IpReport::error(),
        }
    }

    async fn resolve(&self, result: ProbeResult) -> IpReport {
        let id = result.cookie_store_id;
        match result.outcome {
            Ok(info) => {
                let report = IpReport::from(&info);
                let update = Request::UpdateIpInfo {
                    cookie_store_id: id,
                    ip_info: info,
                };
                if let Err(e) = self.background.request(update).await {
                    debug!(error = %e, "ui.refresh.cache_update_failed");
                }
                report
            }
            Err(e) => {
                debug!(id = %id, error = %e, "ui.refresh.probe_failed");
                self.cached(id).await
            }
        }
    }

    async fn cached(&self, cookie_store_id: String) -> IpReport {
        match self
            .background
            .request(Request::GetContainerInfo { cookie_store_id })
            .await
        {
            Ok(Response::ContainerInfo(Some(info))) => match info.ip_info {
                Some(ip) => IpReport::from(&ip),
                None => IpReport::no_active_tab(),
            },
            Ok(Response::ContainerInfo(None)) => IpReport::no_active_tab(),
            Ok(other) => {
                warn!(reply = ?other, "ui.refresh.unexpected_reply");
                IpReport::error()
            }
            Err(e) => {
                warn!(error = %e, "ui.refresh.background_unreachable");
                IpReport::error()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_ip, test_app};
    use proxykit_containers::NewContainer;
    use proxykit_generator::{Credentials, GeneratorOptions, build_document};

    async fn create(host: &dyn ContainerHost, name: &str) -> ContainerIdentity {
        host.create(NewContainer {
            name: name.into(),
            color: "blue".into(),
            icon: "fingerprint".into(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn successful_probe_updates_background_cache() {
        let t = test_app().await;
        let c = create(t.host.as_ref(), "Proxy 1").await;
        let refresh = t.app.controller.refresh();

        let report = refresh.refresh_one(&c.cookie_store_id, &CancellationToken::new()).await;
        assert_eq!(report, IpReport::new("203.0.113.7", "Austin, Texas US"));

        match t
            .app
            .background
            .request(Request::GetContainerInfo {
                cookie_store_id: c.cookie_store_id.clone(),
            })
            .await
            .unwrap()
        {
            Response::ContainerInfo(Some(info)) => {
                assert_eq!(info.ip_info.unwrap().ip, "203.0.113.7")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn failed_probe_falls_back_to_cache_then_placeholder() {
        let t = test_app().await;
        let cached = create(t.host.as_ref(), "Cached").await;
        let fresh = create(t.host.as_ref(), "Fresh").await;
        t.probe.fail_for(&cached.cookie_store_id);
        t.probe.fail_for(&fresh.cookie_store_id);
        t.app
            .background
            .request(Request::UpdateIpInfo {
                cookie_store_id: cached.cookie_store_id.clone(),
                ip_info: sample_ip("198.51.100.2"),
            })
            .await
            .unwrap();

        let refresh = t.app.controller.refresh();
        let containers = refresh.containers().await.unwrap();
        let rows = refresh
            .refresh_batch(containers, &CancellationToken::new())
            .await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].report.ip, "198.51.100.2");
        assert_eq!(rows[1].report, IpReport::no_active_tab());
    }

    #[tokio::test]
    async fn unknown_container_reports_error() {
        let t = test_app().await;
        let report = t
            .app
            .controller
            .refresh()
            .refresh_one("firefox-container-99", &CancellationToken::new())
            .await;
        assert_eq!(report, IpReport::error());
    }

    #[tokio::test]
    async fn probes_follow_persona_routes() {
        let t = test_app().await;
        let a = create(t.host.as_ref(), "A").await;
        let b = create(t.host.as_ref(), "B").await;
        let doc = build_document(
            &GeneratorOptions::new("na.proxys5.net", 6200, "US", 1),
            &Credentials::new("alice", "pw"),
        )
        .unwrap();
        DocumentStore::new(t.kv.clone()).save(&doc).await.unwrap();

        let refresh = t.app.controller.refresh().clone();
        let contexts = refresh.contexts(&[a, b]).await;
        let expected = &doc.data[0].username;
        assert!(contexts.iter().all(|c| c
            .route
            .as_ref()
            .is_some_and(|r| &r.username == expected)));

        let direct = IpRefresh::new(
            t.app.background.clone(),
            Some(t.host.clone() as Arc<dyn ContainerHost>),
            t.probe.clone() as Arc<dyn IpProbe>,
            DocumentStore::new(t.kv.clone()),
            false,
        );
        let containers = direct.containers().await.unwrap();
        assert!(direct.contexts(&containers).await.iter().all(|c| c.route.is_none()));
    }

    #[tokio::test]
    async fn placeholders_say_detecting() {
        let t = test_app().await;
        let c = create(t.host.as_ref(), "A").await;
        let rows = IpRefresh::placeholders(&[c]);
        assert_eq!(rows[0].report, IpReport::detecting());
    }
}
