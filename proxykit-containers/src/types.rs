use serde::{Deserialize, Serialize};

/// A container as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerIdentity {
    pub cookie_store_id: String,
    pub name: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_code: Option<String>,
    pub icon: String,
}

/// Request to create a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContainer {
    pub name: String,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabStatus {
    Loading,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: u64,
    pub url: Option<String>,
    pub cookie_store_id: Option<String>,
    pub status: TabStatus,
    pub active: bool,
}

impl TabInfo {
    pub fn is_http(&self) -> bool {
        self.url.as_deref().is_some_and(|u| u.starts_with("http"))
    }
}

/// Notifications delivered by the host, at least once and unordered across
/// subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    ContainerCreated(ContainerIdentity),
    ContainerRemoved(ContainerIdentity),
    TabCreated(TabInfo),
    TabUpdated { tab_id: u64, status: TabStatus, tab: TabInfo },
}

/// Public IP and coarse location detected for a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpInfo {
    pub ip: String,
    pub city: String,
    pub region: String,
    pub country: String,
    /// `lat,long` as reported by the lookup service, may be empty.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub org: String,
    /// Detection time, ms since epoch.
    pub detected: i64,
}

impl IpInfo {
    /// `"{city}, {region} {country}"`, the form shown next to the IP.
    pub fn place(&self) -> String {
        format!("{}, {} {}", self.city, self.region, self.country)
    }
}

/// What the background process knows about one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerInfo {
    pub cookie_store_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub created: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<i64>,
    pub ip_info: Option<IpInfo>,
}

impl ContainerInfo {
    pub fn from_identity(identity: &ContainerIdentity, created: i64) -> Self {
        Self {
            cookie_store_id: identity.cookie_store_id.clone(),
            name: Some(identity.name.clone()),
            color: Some(identity.color.clone()),
            icon: Some(identity.icon.clone()),
            created,
            last_used: None,
            last_updated: None,
            ip_info: None,
        }
    }
}
