//! User-facing operations.
//!
//! Every operation reports its outcome on the banner and never propagates
//! a failure past the caller's `Result`.
use crate::banner::BannerSlot;
use crate::refresh::IpRefresh;
use proxykit_actors::{BackgroundClient, Request, Response};
use proxykit_common::{ProxyKitError, Result};
use proxykit_config::{GeneratorSettings, UiSettings};
use proxykit_containers::{
    ContainerHost, ContainerIdentity, DEFAULT_CONTAINER_ICON, HostError, NewContainer, TabInfo,
    random_container_color, random_container_name,
};
use proxykit_generator::{ConfigDocument, GeneratorOptions, build_document, write_document};
use proxykit_store::{CredentialStore, DocumentStore, StoredCredentials};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStatus {
    /// Username fingerprint and when the credentials were saved.
    Valid {
        account: String,
        saved_at: Option<String>,
    },
    Missing,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerateOverrides<'a> {
    pub count: Option<u32>,
    pub region: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalSummary {
    pub removed: usize,
    pub failed: usize,
}

pub struct ControllerDeps {
    pub credentials: CredentialStore,
    pub documents: DocumentStore,
    pub background: BackgroundClient,
    pub host: Option<Arc<dyn ContainerHost>>,
    pub refresh: IpRefresh,
    pub generator: GeneratorSettings,
    pub ui: UiSettings,
}

pub struct PopupController {
    credentials: CredentialStore,
    documents: DocumentStore,
    background: BackgroundClient,
    host: Option<Arc<dyn ContainerHost>>,
    refresh: IpRefresh,
    generator: GeneratorSettings,
    ui: UiSettings,
    banner: BannerSlot,
    current: Option<ConfigDocument>,
}

impl PopupController {
    pub fn new(deps: ControllerDeps) -> Self {
        Self {
            banner: BannerSlot::new(Duration::from_secs(deps.ui.banner_secs)),
            credentials: deps.credentials,
            documents: deps.documents,
            background: deps.background,
            host: deps.host,
            refresh: deps.refresh,
            generator: deps.generator,
            ui: deps.ui,
            current: None,
        }
    }

    /// Restore the last generated document, if any.
    pub async fn restore(&mut self) {
        match self.documents.load().await {
            Ok(doc) => self.current = doc,
            Err(e) => warn!(error = %e, "ui.document.restore_failed"),
        }
    }

    pub fn banner(&self) -> &BannerSlot {
        &self.banner
    }

    pub fn refresh(&self) -> &IpRefresh {
        &self.refresh
    }

    pub fn current_document(&self) -> Option<&ConfigDocument> {
        self.current.as_ref()
    }

    fn report<T>(&self, result: Result<T>, success: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.banner.success(success(value)),
            Err(e) => self.banner.error(format!("Error: {}", user_message(e))),
        }
        result
    }

    pub async fn credential_status(&self) -> CredentialStatus {
        match self.credentials.load().await {
            Ok(Some(stored)) if stored.is_complete() => CredentialStatus::Valid {
                account: proxykit_common::fingerprint(&stored.username),
                saved_at: stored.timestamp,
            },
            Ok(_) => CredentialStatus::Missing,
            Err(e) => {
                warn!(error = %e, "ui.credentials.load_failed");
                CredentialStatus::Missing
            }
        }
    }

    pub async fn save_credentials(&self, username: &str, password: &str) -> Result<StoredCredentials> {
        let result = self
            .credentials
            .save(username, password)
            .await
            .map_err(ProxyKitError::from);
        self.report(result, |_| "Credentials saved successfully!".to_string())
    }

    /// Log out. The cached document carries the old password, so it goes too.
    pub async fn clear_credentials(&mut self) -> Result<()> {
        let result = self.credentials.clear().await.map_err(ProxyKitError::from);
        if result.is_ok() {
            self.current = None;
        }
        self.report(result, |_| "Successfully logged out!".to_string())
    }

    /// Stored generator settings, falling back to configured defaults.
    async fn settings(&self) -> GeneratorOptions {
        match self.background.request(Request::GetConfig).await {
            Ok(Response::Config(options)) => options,
            other => {
                warn!(reply = ?other, "ui.settings.fallback_to_defaults");
                let g = &self.generator;
                GeneratorOptions::new(&g.endpoint, g.port, &g.region, g.proxy_count)
            }
        }
    }

    async fn try_generate(&mut self, overrides: GenerateOverrides<'_>) -> Result<ConfigDocument> {
        let stored = self.settings().await;
        let mut options = stored.clone();
        if let Some(count) = overrides.count {
            options.proxy_count = count;
        }
        if let Some(region) = overrides.region {
            options.region = region.trim().to_ascii_uppercase();
        }

        let credentials = self
            .credentials
            .load()
            .await?
            .map(|c| c.credentials())
            .unwrap_or_default();
        let document = build_document(&options, &credentials)?;

        self.documents.save(&document).await?;
        self.current = Some(document.clone());

        if options != stored {
            match self.background.request(Request::SaveConfig { config: options }).await {
                Ok(Response::Ack) => {}
                other => warn!(reply = ?other, "ui.settings.save_failed"),
            }
        }
        Ok(document)
    }

    pub async fn generate(&mut self, overrides: GenerateOverrides<'_>) -> Result<ConfigDocument> {
        let result = self.try_generate(overrides).await;
        self.report(result, |doc| {
            format!("Successfully generated {} unique proxies!", doc.data.len())
        })
    }

    /// Write the current document (generating one first if needed).
    /// Requires saved credentials.
    pub async fn export(&mut self, dir: &Path) -> Result<PathBuf> {
        if self.credential_status().await == CredentialStatus::Missing {
            let err = ProxyKitError::Validation(
                "Save your credentials before downloading a configuration".to_string(),
            );
            return self.report(Err(err), |_| String::new());
        }
        let document = match self.current.clone() {
            Some(doc) => doc,
            None => self.generate(GenerateOverrides::default()).await?,
        };
        let result = write_document(
            dir,
            &self.generator.export_prefix,
            &chrono::Local::now(),
            &document,
        )
        .map_err(ProxyKitError::from);
        self.report(result, |_| "Configuration downloaded successfully!".to_string())
    }

    fn host(&self) -> Result<&Arc<dyn ContainerHost>> {
        self.host
            .as_ref()
            .ok_or_else(|| ProxyKitError::from(HostError::Unavailable))
    }

    pub async fn list_containers(&self) -> Result<Vec<ContainerIdentity>> {
        self.refresh.containers().await
    }

    /// Create a container and open the IP check page in it.
    pub async fn create_container(
        &self,
        name: Option<String>,
        color: Option<String>,
    ) -> Result<ContainerIdentity> {
        let result = async {
            let host = self.host()?;
            let wanted = NewContainer {
                name: name.unwrap_or_else(random_container_name),
                color: color.unwrap_or_else(|| random_container_color().to_string()),
                icon: DEFAULT_CONTAINER_ICON.to_string(),
            };
            let container = host.create(wanted).await?;
            host.open_tab(&container.cookie_store_id, &self.ui.ip_check_url)
                .await?;
            Ok::<_, ProxyKitError>(container)
        }
        .await;
        self.report(result, |c| format!("Container \"{}\" created!", c.name))
    }

    pub async fn remove_container(&self, cookie_store_id: &str) -> Result<ContainerIdentity> {
        let result = match self.host() {
            Ok(host) => host.remove(cookie_store_id).await.map_err(ProxyKitError::from),
            Err(e) => Err(e),
        };
        self.report(result, |c| {
            format!("Container \"{}\" deleted successfully", c.name)
        })
    }

    /// Delete every container; individual failures are counted, not fatal.
    pub async fn remove_all_containers(&self) -> Result<RemovalSummary> {
        let host = match self.host() {
            Ok(h) => h,
            Err(e) => return self.report(Err(e), |_| String::new()),
        };
        let containers = match host.query().await {
            Ok(list) => list,
            Err(e) => return self.report(Err(e.into()), |_| String::new()),
        };
        if containers.is_empty() {
            self.banner.info("No containers to delete.");
            return Ok(RemovalSummary::default());
        }
        let mut summary = RemovalSummary::default();
        for container in containers {
            match host.remove(&container.cookie_store_id).await {
                Ok(_) => summary.removed += 1,
                Err(e) => {
                    warn!(id = %container.cookie_store_id, error = %e, "ui.containers.remove_failed");
                    summary.failed += 1;
                }
            }
        }
        self.report(Ok(summary), |s| {
            format!("Successfully deleted {} containers", s.removed)
        })
    }

    pub async fn open_in_container(&self, cookie_store_id: &str, url: Option<&str>) -> Result<TabInfo> {
        let url = url.unwrap_or(&self.ui.ip_check_url);
        let result = match self.host() {
            Ok(host) => host.open_tab(cookie_store_id, url).await.map_err(ProxyKitError::from),
            Err(e) => Err(e),
        };
        self.report(result, |tab| format!("Opened tab {} in {cookie_store_id}", tab.id))
    }

    /// Activate the container's first tab, or open `url` there if it has none.
    pub async fn switch_to_container(&self, cookie_store_id: &str, url: Option<&str>) -> Result<TabInfo> {
        let url = url.unwrap_or(&self.ui.ip_check_url);
        let result = async {
            let host = self.host()?;
            let tabs = host.query_tabs(cookie_store_id).await?;
            let tab = match tabs.first() {
                Some(first) => host.activate_tab(first.id).await?,
                None => host.open_tab(cookie_store_id, url).await?,
            };
            Ok::<_, ProxyKitError>(tab)
        }
        .await;
        self.report(result, |tab| format!("Switched to tab {} in {cookie_store_id}", tab.id))
    }
}

/// The inner message of an error, without the category prefix.
fn user_message(err: &ProxyKitError) -> String {
    match err {
        ProxyKitError::Validation(m)
        | ProxyKitError::HostCapabilityUnavailable(m)
        | ProxyKitError::NetworkLookup(m)
        | ProxyKitError::Persistence(m)
        | ProxyKitError::Config(m)
        | ProxyKitError::Internal(m) => m.clone(),
    }
}
