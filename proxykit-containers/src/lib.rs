//! Container (isolated cookie store) identities.
//!
//! - [`ContainerHost`]: the host capability to create, list and remove
//!   containers, open tabs in them, and subscribe to [`HostEvent`]s
//! - [`LocalContainerHost`]: an in-process host, optionally persisted
//! - [`ContainerRegistry`]: the background process's cache of what it knows
//!   about each container (first seen, last used, detected IP)
use proxykit_common::ProxyKitError;
use rand::Rng;

pub mod host;
pub mod local;
pub mod registry;
pub mod types;

pub use host::ContainerHost;
pub use local::LocalContainerHost;
pub use registry::ContainerRegistry;
pub use types::{
    ContainerIdentity, ContainerInfo, HostEvent, IpInfo, NewContainer, TabInfo, TabStatus,
};

/// Cookie store of tabs that are not in any container.
pub const DEFAULT_COOKIE_STORE: &str = "firefox-default";
pub const DEFAULT_CONTAINER_ICON: &str = "fingerprint";
pub const DEFAULT_CONTAINER_COLOR: &str = "blue";
pub const CONTAINER_COLORS: [&str; 8] = [
    "blue",
    "turquoise",
    "green",
    "yellow",
    "orange",
    "red",
    "pink",
    "purple",
];
const RANDOM_NAME_RANGE: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("Container API not available")]
    Unavailable,
    #[error("no container with id {0}")]
    NotFound(String),
    #[error("no tab with id {0}")]
    TabNotFound(u64),
    #[error("persisting container state failed: {0}")]
    Persistence(#[from] proxykit_store::StoreError),
}

impl From<HostError> for ProxyKitError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Unavailable => {
                ProxyKitError::HostCapabilityUnavailable(HostError::Unavailable.to_string())
            }
            HostError::Persistence(e) => e.into(),
            other => ProxyKitError::Validation(other.to_string()),
        }
    }
}

/// True for ids that name a real container rather than the default store.
pub fn is_container_store(cookie_store_id: &str) -> bool {
    !cookie_store_id.is_empty() && cookie_store_id != DEFAULT_COOKIE_STORE
}

/// `Proxy <n>` with `n` in `0..1000`.
pub fn random_container_name() -> String {
    format!("Proxy {}", rand::thread_rng().gen_range(0..RANDOM_NAME_RANGE))
}

pub fn random_container_color() -> &'static str {
    CONTAINER_COLORS[rand::thread_rng().gen_range(0..CONTAINER_COLORS.len())]
}

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_is_not_a_container() {
        assert!(!is_container_store(DEFAULT_COOKIE_STORE));
        assert!(!is_container_store(""));
        assert!(is_container_store("firefox-container-3"));
    }

    #[test]
    fn random_names_stay_in_range() {
        for _ in 0..100 {
            let name = random_container_name();
            let n: u32 = name.strip_prefix("Proxy ").unwrap().parse().unwrap();
            assert!(n < 1000);
        }
        assert!(CONTAINER_COLORS.contains(&random_container_color()));
    }
}
