use crate::controller::{ControllerDeps, PopupController};
use crate::refresh::IpRefresh;
use anyhow::Result;
use proxykit_actors::{
    ActorSystem, BackgroundActor, BackgroundClient, BackgroundDeps, spawn_background,
};
use proxykit_config::ProxyKitConfig;
use proxykit_containers::{ContainerHost, LocalContainerHost};
use proxykit_generator::GeneratorOptions;
use proxykit_probe::{HttpIpProbe, IpProbe};
use proxykit_store::{CredentialStore, DocumentStore, KeyValueStore, SettingsStore, SqliteStore};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// The running background process plus the UI controller talking to it.
pub struct App {
    pub config: ProxyKitConfig,
    pub controller: PopupController,
    pub background: BackgroundClient,
    system: ActorSystem,
}

impl App {
    /// Token cancelled on shutdown; UI-side tasks should watch a child of it.
    pub fn cancel_token(&self) -> CancellationToken {
        self.system.cancel_token()
    }

    pub async fn shutdown(self) -> Result<()> {
        self.system.graceful_shutdown().await
    }
}

fn default_options(cfg: &ProxyKitConfig) -> GeneratorOptions {
    let g = &cfg.generator;
    GeneratorOptions::new(&g.endpoint, g.port, &g.region, g.proxy_count)
}

/// Open storage from configuration and wire everything on top of it.
pub async fn build_from_config(cfg: ProxyKitConfig, containers_enabled: bool) -> Result<App> {
    let url = cfg.storage.resolved_database_url();
    let kv: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::connect(&url).await?);
    info!(database = %url, "app.storage.ready");

    let host: Arc<dyn ContainerHost> = if containers_enabled {
        Arc::new(LocalContainerHost::load(kv.clone()).await?)
    } else {
        Arc::new(LocalContainerHost::unavailable())
    };
    let probe: Arc<dyn IpProbe> = Arc::new(HttpIpProbe::new(&cfg.probe)?);
    build(cfg, kv, host, probe).await
}

pub async fn build(
    cfg: ProxyKitConfig,
    kv: Arc<dyn KeyValueStore>,
    host: Arc<dyn ContainerHost>,
    probe: Arc<dyn IpProbe>,
) -> Result<App> {
    let documents = DocumentStore::new(kv.clone());
    let route_through_proxy = cfg.probe.route_through_proxy;

    // -------- background process --------
    let mut system = ActorSystem::new();
    let deps = BackgroundDeps {
        settings: SettingsStore::new(kv.clone()),
        documents: documents.clone(),
        host: Some(host.clone()),
        probe: Some(probe.clone()),
        route_through_proxy,
    };
    let actor = BackgroundActor::start(deps, default_options(&cfg)).await;
    let background = spawn_background(&mut system, actor);

    // -------- UI side --------
    let refresh = IpRefresh::new(
        background.clone(),
        Some(host.clone()),
        probe,
        documents.clone(),
        route_through_proxy,
    );
    let mut controller = PopupController::new(ControllerDeps {
        credentials: CredentialStore::new(kv),
        documents,
        background: background.clone(),
        host: Some(host),
        refresh,
        generator: cfg.generator.clone(),
        ui: cfg.ui.clone(),
    });
    controller.restore().await;

    Ok(App {
        config: cfg,
        controller,
        background,
        system,
    })
}
