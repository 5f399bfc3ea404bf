use crate::types::{ContainerIdentity, HostEvent, NewContainer, TabInfo};
use crate::HostError;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Host capability for container and tab management.
#[async_trait]
pub trait ContainerHost: Send + Sync {
    async fn create(&self, container: NewContainer) -> Result<ContainerIdentity, HostError>;

    /// All containers in host order.
    async fn query(&self) -> Result<Vec<ContainerIdentity>, HostError>;

    async fn get(&self, cookie_store_id: &str) -> Result<Option<ContainerIdentity>, HostError>;

    /// Remove a container (and its tabs), returning what was removed.
    async fn remove(&self, cookie_store_id: &str) -> Result<ContainerIdentity, HostError>;

    async fn open_tab(&self, cookie_store_id: &str, url: &str) -> Result<TabInfo, HostError>;

    async fn query_tabs(&self, cookie_store_id: &str) -> Result<Vec<TabInfo>, HostError>;

    /// Make a tab the active one in its container.
    async fn activate_tab(&self, tab_id: u64) -> Result<TabInfo, HostError>;

    fn subscribe(&self) -> broadcast::Receiver<HostEvent>;
}
