//! The background process.
//!
//! [`BackgroundActor`] owns the container registry and the stored settings.
//! It answers protocol requests, consumes host events, and runs an IP probe
//! whenever a container tab finishes loading a web page.
use crate::actor::{spawn_actor_with_cancel, Actor, ActorHandle, Addr, Context};
use crate::protocol::{Request, Response};
use crate::system::ActorSystem;
use anyhow::Result;
use proxykit_common::ProxyKitError;
use proxykit_containers::{
    is_container_store, now_millis, ContainerHost, ContainerRegistry, HostError, HostEvent,
    IpInfo, NewContainer, TabInfo, TabStatus, DEFAULT_CONTAINER_COLOR, DEFAULT_CONTAINER_ICON,
};
use proxykit_generator::GeneratorOptions;
use proxykit_probe::{assign_routes, IpProbe, ProbeContext, ProxyRoute};
use proxykit_store::{DocumentStore, SettingsStore};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const MAILBOX: usize = 64;

pub enum BackgroundMsg {
    Request {
        request: Request,
        reply: oneshot::Sender<Response>,
    },
    Host(HostEvent),
    ProbeFinished {
        cookie_store_id: String,
        ip_info: IpInfo,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ActorError {
    #[error("background process is not running")]
    Closed,
    #[error("background process dropped the reply")]
    NoReply,
}

impl From<ActorError> for ProxyKitError {
    fn from(err: ActorError) -> Self {
        ProxyKitError::Internal(err.to_string())
    }
}

/// Everything the background process needs from its host.
#[derive(Clone)]
pub struct BackgroundDeps {
    pub settings: SettingsStore,
    pub documents: DocumentStore,
    /// `None` when the host has no container support.
    pub host: Option<Arc<dyn ContainerHost>>,
    /// `None` disables tab-triggered detection.
    pub probe: Option<Arc<dyn IpProbe>>,
    pub route_through_proxy: bool,
}

pub struct BackgroundActor {
    registry: ContainerRegistry,
    settings: GeneratorOptions,
    deps: BackgroundDeps,
}

impl BackgroundActor {
    /// Load settings, seeding `defaults` on first run. Storage failures are
    /// logged and the defaults are used in memory.
    pub async fn start(deps: BackgroundDeps, defaults: GeneratorOptions) -> Self {
        let settings = match deps.settings.load_or_seed(defaults.clone()).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "background.settings.load_failed");
                defaults
            }
        };
        info!(
            mode = %settings.mode(),
            containers = deps.host.is_some(),
            "background.started"
        );
        Self {
            registry: ContainerRegistry::new(),
            settings,
            deps,
        }
    }

    pub fn registry(&self) -> &ContainerRegistry {
        &self.registry
    }

    async fn handle_request(&mut self, request: Request) -> Response {
        debug!(action = request.action(), "background.request");
        match request {
            Request::GetConfig => Response::Config(self.settings.clone()),
            Request::SaveConfig { config } => match self.deps.settings.save(&config).await {
                Ok(()) => {
                    self.settings = config;
                    Response::Ack
                }
                Err(e) => {
                    warn!(error = %e, "background.settings.save_failed");
                    Response::Failure(e.to_string())
                }
            },
            Request::CreateContainer { name, color } => {
                let Some(host) = &self.deps.host else {
                    return Response::Failure(HostError::Unavailable.to_string());
                };
                let wanted = NewContainer {
                    name: name
                        .filter(|n| !n.is_empty())
                        .unwrap_or_else(proxykit_containers::random_container_name),
                    color: color
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| DEFAULT_CONTAINER_COLOR.to_string()),
                    icon: DEFAULT_CONTAINER_ICON.to_string(),
                };
                match host.create(wanted).await {
                    Ok(container) => Response::Container(container),
                    Err(e) => Response::Failure(e.to_string()),
                }
            }
            Request::GetContainers => match &self.deps.host {
                None => Response::Containers(Vec::new()),
                Some(host) => match host.query().await {
                    Ok(list) => Response::Containers(list),
                    Err(HostError::Unavailable) => Response::Containers(Vec::new()),
                    Err(e) => Response::Failure(e.to_string()),
                },
            },
            Request::UpdateIpInfo {
                cookie_store_id,
                ip_info,
            } => {
                self.registry
                    .update_ip_info(&cookie_store_id, ip_info, now_millis());
                Response::Ack
            }
            Request::GetContainerInfo { cookie_store_id } => {
                Response::ContainerInfo(self.registry.get(&cookie_store_id).cloned())
            }
            Request::GetAllContainerInfo => Response::AllContainerInfo(self.registry.all()),
        }
    }

    async fn handle_host_event(&mut self, event: HostEvent, ctx: &Context<Self>) {
        match event {
            HostEvent::ContainerCreated(identity) => {
                debug!(id = %identity.cookie_store_id, "background.container.created");
                self.registry.on_created(&identity, now_millis());
            }
            HostEvent::ContainerRemoved(identity) => {
                debug!(id = %identity.cookie_store_id, "background.container.removed");
                self.registry.on_removed(&identity.cookie_store_id);
            }
            HostEvent::TabCreated(tab) => self.on_tab_created(tab).await,
            HostEvent::TabUpdated { status, tab, .. } => {
                if status == TabStatus::Complete && tab.is_http() {
                    if let Some(id) = tab.cookie_store_id.filter(|id| is_container_store(id)) {
                        self.start_probe(id, ctx).await;
                    }
                }
            }
        }
    }

    async fn on_tab_created(&mut self, tab: TabInfo) {
        let Some(id) = tab.cookie_store_id.filter(|id| is_container_store(id)) else {
            return;
        };
        let now = now_millis();
        if self.registry.touch(&id, now) {
            return;
        }
        let Some(host) = &self.deps.host else {
            return;
        };
        match host.get(&id).await {
            Ok(Some(identity)) => self.registry.track_observed(&identity, now),
            Ok(None) => debug!(id = %id, "background.tab.unknown_container"),
            Err(e) => warn!(id = %id, error = %e, "background.tab.container_lookup_failed"),
        }
    }

    /// Route for `cookie_store_id`: its persona from the last document.
    async fn route_for(&self, cookie_store_id: &str) -> Option<ProxyRoute> {
        if !self.deps.route_through_proxy {
            return None;
        }
        let host = self.deps.host.as_ref()?;
        let containers = host.query().await.ok()?;
        let document = match self.deps.documents.load().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(error = %e, "background.document.load_failed");
                None
            }
        };
        assign_routes(&containers, document.as_ref())
            .into_iter()
            .find(|c| c.cookie_store_id == cookie_store_id)
            .and_then(|c| c.route)
    }

    async fn start_probe(&self, cookie_store_id: String, ctx: &Context<Self>) {
        let Some(probe) = self.deps.probe.clone() else {
            return;
        };
        let probe_ctx = ProbeContext {
            route: self.route_for(&cookie_store_id).await,
            cookie_store_id,
        };
        let Some(addr) = ctx.addr() else {
            return;
        };
        let cancel = ctx.cancel_token();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return,
                res = probe.detect(&probe_ctx) => res,
            };
            match outcome {
                Ok(ip_info) => {
                    let _ = addr
                        .send(BackgroundMsg::ProbeFinished {
                            cookie_store_id: probe_ctx.cookie_store_id,
                            ip_info,
                        })
                        .await;
                }
                Err(e) => warn!(
                    id = %probe_ctx.cookie_store_id,
                    error = %e,
                    "background.probe.failed"
                ),
            }
        });
    }
}

#[async_trait::async_trait]
impl Actor for BackgroundActor {
    type Msg = BackgroundMsg;

    async fn handle(&mut self, msg: Self::Msg, ctx: &mut Context<Self>) -> Result<()> {
        match msg {
            BackgroundMsg::Request { request, reply } => {
                let response = self.handle_request(request).await;
                if reply.send(response).is_err() {
                    debug!("background.request.reply_dropped");
                }
            }
            BackgroundMsg::Host(event) => self.handle_host_event(event, ctx).await,
            BackgroundMsg::ProbeFinished {
                cookie_store_id,
                ip_info,
            } => {
                debug!(id = %cookie_store_id, ip = %ip_info.ip, "background.probe.finished");
                self.registry
                    .update_ip_info(&cookie_store_id, ip_info, now_millis());
            }
        }
        Ok(())
    }
}

/// Cheap handle used by the UI side to talk to the background process.
#[derive(Clone)]
pub struct BackgroundClient {
    addr: Addr<BackgroundActor>,
}

impl BackgroundClient {
    pub async fn request(&self, request: Request) -> Result<Response, ActorError> {
        let (reply, rx) = oneshot::channel();
        self.addr
            .send(BackgroundMsg::Request { request, reply })
            .await
            .map_err(|_| ActorError::Closed)?;
        rx.await.map_err(|_| ActorError::NoReply)
    }

    /// Raw JSON in, raw JSON out.
    pub async fn dispatch_json(&self, message: Value) -> Value {
        let request = match Request::from_value(message) {
            Ok(r) => r,
            Err(reply) => {
                warn!("background.request.rejected");
                return reply.to_value();
            }
        };
        match self.request(request).await {
            Ok(response) => response.to_value(),
            Err(e) => Response::Failure(e.to_string()).to_value(),
        }
    }
}

/// Spawn the actor plus the task that forwards host events into its mailbox.
pub fn spawn_background(system: &mut ActorSystem, actor: BackgroundActor) -> BackgroundClient {
    let events = actor.deps.host.as_ref().map(|h| h.subscribe());
    let cancel = system.cancel_token();
    let ActorHandle { addr, task } = spawn_actor_with_cancel(actor, MAILBOX, cancel.clone());
    system.track(async move { task.await? });
    if let Some(events) = events {
        system.track(forward_host_events(events, addr.clone(), cancel));
    }
    BackgroundClient { addr }
}

async fn forward_host_events(
    mut events: broadcast::Receiver<HostEvent>,
    addr: Addr<BackgroundActor>,
    cancel: CancellationToken,
) -> Result<()> {
    loop {
        let event = tokio::select! {
            _ = cancel.cancelled() => break,
            ev = events.recv() => ev,
        };
        match event {
            Ok(ev) => {
                if addr.send(BackgroundMsg::Host(ev)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "background.host_events.lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    Ok(())
}
