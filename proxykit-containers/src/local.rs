//! In-process container host.
//!
//! Identities are numbered `firefox-container-N` and optionally persisted as
//! one JSON record so a later run sees the same containers. Tabs only live
//! for the lifetime of the host.
use crate::host::ContainerHost;
use crate::types::{ContainerIdentity, HostEvent, NewContainer, TabInfo, TabStatus};
use crate::HostError;
use async_trait::async_trait;
use proxykit_store::{KeyValueStore, StoreError, CONTAINERS_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

const EVENT_CAPACITY: usize = 256;
const ID_PREFIX: &str = "firefox-container-";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Persisted {
    next_id: u64,
    containers: Vec<ContainerIdentity>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    next_tab: u64,
    containers: Vec<ContainerIdentity>,
    tabs: Vec<TabInfo>,
}

pub struct LocalContainerHost {
    available: bool,
    state: Mutex<State>,
    events: broadcast::Sender<HostEvent>,
    kv: Option<Arc<dyn KeyValueStore>>,
}

impl LocalContainerHost {
    /// A host whose containers vanish with the process.
    pub fn ephemeral() -> Self {
        Self::with_state(State::default(), None)
    }

    /// A host backed by `kv`, restoring previously created containers.
    pub async fn load(kv: Arc<dyn KeyValueStore>) -> Result<Self, HostError> {
        let persisted = match kv.get(CONTAINERS_KEY).await? {
            Some(value) => match serde_json::from_value::<Persisted>(value) {
                Ok(p) => p,
                Err(err) => {
                    warn!(error = %err, "containers.restore.invalid");
                    Persisted::default()
                }
            },
            None => Persisted::default(),
        };
        debug!(count = persisted.containers.len(), "containers.restore");
        let state = State {
            next_id: persisted.next_id,
            next_tab: 0,
            containers: persisted.containers,
            tabs: Vec::new(),
        };
        Ok(Self::with_state(state, Some(kv)))
    }

    /// A host without container support; every operation fails with
    /// [`HostError::Unavailable`].
    pub fn unavailable() -> Self {
        let mut host = Self::ephemeral();
        host.available = false;
        host
    }

    pub fn is_available(&self) -> bool {
        self.available
    }

    fn ensure_available(&self) -> Result<(), HostError> {
        if self.available {
            Ok(())
        } else {
            Err(HostError::Unavailable)
        }
    }

    fn with_state(state: State, kv: Option<Arc<dyn KeyValueStore>>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            available: true,
            state: Mutex::new(state),
            events,
            kv,
        }
    }

    async fn persist(&self, state: &State) -> Result<(), HostError> {
        let Some(kv) = &self.kv else {
            return Ok(());
        };
        let record = Persisted {
            next_id: state.next_id,
            containers: state.containers.clone(),
        };
        let value = serde_json::to_value(&record).map_err(StoreError::from)?;
        kv.set(CONTAINERS_KEY, value).await?;
        Ok(())
    }

    fn emit(&self, event: HostEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Hex code the host shows for a named container colour.
pub fn color_code(color: &str) -> Option<&'static str> {
    Some(match color {
        "blue" => "#37adff",
        "turquoise" => "#00c79a",
        "green" => "#51cd00",
        "yellow" => "#ffcb00",
        "orange" => "#ff9f00",
        "red" => "#ff613d",
        "pink" => "#ff4bda",
        "purple" => "#af51f5",
        "toolbar" => "#7c7c7d",
        _ => return None,
    })
}

#[async_trait]
impl ContainerHost for LocalContainerHost {
    async fn create(&self, wanted: NewContainer) -> Result<ContainerIdentity, HostError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        state.next_id += 1;
        let identity = ContainerIdentity {
            cookie_store_id: format!("{ID_PREFIX}{}", state.next_id),
            color_code: color_code(&wanted.color).map(str::to_string),
            name: wanted.name,
            color: wanted.color,
            icon: wanted.icon,
        };
        state.containers.push(identity.clone());
        self.persist(&state).await?;
        drop(state);

        info!(id = %identity.cookie_store_id, name = %identity.name, "containers.created");
        self.emit(HostEvent::ContainerCreated(identity.clone()));
        Ok(identity)
    }

    async fn query(&self) -> Result<Vec<ContainerIdentity>, HostError> {
        self.ensure_available()?;
        Ok(self.state.lock().await.containers.clone())
    }

    async fn get(&self, cookie_store_id: &str) -> Result<Option<ContainerIdentity>, HostError> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        Ok(state
            .containers
            .iter()
            .find(|c| c.cookie_store_id == cookie_store_id)
            .cloned())
    }

    async fn remove(&self, cookie_store_id: &str) -> Result<ContainerIdentity, HostError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        let pos = state
            .containers
            .iter()
            .position(|c| c.cookie_store_id == cookie_store_id)
            .ok_or_else(|| HostError::NotFound(cookie_store_id.to_string()))?;
        let removed = state.containers.remove(pos);
        state
            .tabs
            .retain(|t| t.cookie_store_id.as_deref() != Some(cookie_store_id));
        self.persist(&state).await?;
        drop(state);

        info!(id = %removed.cookie_store_id, "containers.removed");
        self.emit(HostEvent::ContainerRemoved(removed.clone()));
        Ok(removed)
    }

    async fn open_tab(&self, cookie_store_id: &str, url: &str) -> Result<TabInfo, HostError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        if !crate::is_container_store(cookie_store_id)
            || !state
                .containers
                .iter()
                .any(|c| c.cookie_store_id == cookie_store_id)
        {
            return Err(HostError::NotFound(cookie_store_id.to_string()));
        }
        state.next_tab += 1;
        let mut tab = TabInfo {
            id: state.next_tab,
            url: Some(url.to_string()),
            cookie_store_id: Some(cookie_store_id.to_string()),
            status: TabStatus::Loading,
            active: true,
        };
        for other in state.tabs.iter_mut() {
            other.active = false;
        }
        state.tabs.push(tab.clone());
        self.emit(HostEvent::TabCreated(tab.clone()));

        tab.status = TabStatus::Complete;
        if let Some(stored) = state.tabs.iter_mut().find(|t| t.id == tab.id) {
            stored.status = TabStatus::Complete;
        }
        drop(state);

        debug!(tab_id = tab.id, container = %cookie_store_id, "containers.tab.opened");
        self.emit(HostEvent::TabUpdated {
            tab_id: tab.id,
            status: TabStatus::Complete,
            tab: tab.clone(),
        });
        Ok(tab)
    }

    async fn query_tabs(&self, cookie_store_id: &str) -> Result<Vec<TabInfo>, HostError> {
        self.ensure_available()?;
        let state = self.state.lock().await;
        Ok(state
            .tabs
            .iter()
            .filter(|t| t.cookie_store_id.as_deref() == Some(cookie_store_id))
            .cloned()
            .collect())
    }

    async fn activate_tab(&self, tab_id: u64) -> Result<TabInfo, HostError> {
        self.ensure_available()?;
        let mut state = self.state.lock().await;
        if !state.tabs.iter().any(|t| t.id == tab_id) {
            return Err(HostError::TabNotFound(tab_id));
        }
        let mut activated = None;
        for tab in state.tabs.iter_mut() {
            tab.active = tab.id == tab_id;
            if tab.active {
                activated = Some(tab.clone());
            }
        }
        activated.ok_or(HostError::TabNotFound(tab_id))
    }

    fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proxykit_store::MemoryStore;

    fn named(name: &str) -> NewContainer {
        NewContainer {
            name: name.into(),
            color: "red".into(),
            icon: "fingerprint".into(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_and_emits() {
        let host = LocalContainerHost::ephemeral();
        let mut rx = host.subscribe();
        let a = host.create(named("Proxy 1")).await.unwrap();
        let b = host.create(named("Proxy 2")).await.unwrap();
        assert_eq!(a.cookie_store_id, "firefox-container-1");
        assert_eq!(b.cookie_store_id, "firefox-container-2");
        assert_eq!(a.color_code.as_deref(), Some("#ff613d"));
        assert_eq!(rx.recv().await.unwrap(), HostEvent::ContainerCreated(a));
    }

    #[tokio::test]
    async fn containers_survive_reload() {
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let host = LocalContainerHost::load(kv.clone()).await.unwrap();
        host.create(named("Proxy 1")).await.unwrap();
        let second = host.create(named("Proxy 2")).await.unwrap();
        host.remove("firefox-container-1").await.unwrap();

        let reloaded = LocalContainerHost::load(kv).await.unwrap();
        assert_eq!(reloaded.query().await.unwrap(), vec![second]);
        let next = reloaded.create(named("Proxy 3")).await.unwrap();
        assert_eq!(next.cookie_store_id, "firefox-container-3");
    }

    #[tokio::test]
    async fn unavailable_host_rejects_everything() {
        let host = LocalContainerHost::unavailable();
        assert!(!host.is_available());
        assert!(matches!(host.query().await, Err(HostError::Unavailable)));
        assert!(matches!(
            host.create(named("Proxy 1")).await,
            Err(HostError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn remove_unknown_is_not_found() {
        let host = LocalContainerHost::ephemeral();
        assert!(matches!(
            host.remove("firefox-container-9").await,
            Err(HostError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn open_tab_emits_created_then_complete() {
        let host = LocalContainerHost::ephemeral();
        let c = host.create(named("Proxy 1")).await.unwrap();
        let mut rx = host.subscribe();
        let tab = host
            .open_tab(&c.cookie_store_id, "https://ipinfo.io/what-is-my-ip")
            .await
            .unwrap();
        assert_eq!(tab.status, TabStatus::Complete);
        match rx.recv().await.unwrap() {
            HostEvent::TabCreated(t) => assert_eq!(t.status, TabStatus::Loading),
            other => panic!("unexpected {other:?}"),
        }
        match rx.recv().await.unwrap() {
            HostEvent::TabUpdated { status, tab, .. } => {
                assert_eq!(status, TabStatus::Complete);
                assert!(tab.is_http());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(host.query_tabs(&c.cookie_store_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn activate_switches_active_tab() {
        let host = LocalContainerHost::ephemeral();
        let c = host.create(named("Proxy 1")).await.unwrap();
        let first = host.open_tab(&c.cookie_store_id, "https://a.test").await.unwrap();
        host.open_tab(&c.cookie_store_id, "https://b.test").await.unwrap();
        let active = host.activate_tab(first.id).await.unwrap();
        assert!(active.active);
        let tabs = host.query_tabs(&c.cookie_store_id).await.unwrap();
        assert_eq!(tabs.iter().filter(|t| t.active).count(), 1);
        assert!(matches!(host.activate_tab(99).await, Err(HostError::TabNotFound(99))));
    }
}
