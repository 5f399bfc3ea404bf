use crate::types::{ContainerIdentity, ContainerInfo, IpInfo};
use std::collections::HashMap;

/// Per-container cache, keyed by cookie store id.
///
/// Owned by a single task; timestamps are passed in so callers control the
/// clock.
#[derive(Debug, Default)]
pub struct ContainerRegistry {
    entries: HashMap<String, ContainerInfo>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A container was created. Host events may arrive late or twice, so an
    /// existing entry only has its name, colour and icon refreshed.
    pub fn on_created(&mut self, identity: &ContainerIdentity, now: i64) {
        let info = self
            .entries
            .entry(identity.cookie_store_id.clone())
            .or_insert_with(|| ContainerInfo::from_identity(identity, now));
        info.name = Some(identity.name.clone());
        info.color = Some(identity.color.clone());
        info.icon = Some(identity.icon.clone());
    }

    pub fn on_removed(&mut self, cookie_store_id: &str) -> Option<ContainerInfo> {
        self.entries.remove(cookie_store_id)
    }

    /// Record use of a known container. False if the id is not tracked.
    pub fn touch(&mut self, cookie_store_id: &str, now: i64) -> bool {
        match self.entries.get_mut(cookie_store_id) {
            Some(info) => {
                info.last_used = Some(now);
                true
            }
            None => false,
        }
    }

    /// Start tracking a container first seen through one of its tabs.
    pub fn track_observed(&mut self, identity: &ContainerIdentity, now: i64) {
        let info = self
            .entries
            .entry(identity.cookie_store_id.clone())
            .or_insert_with(|| ContainerInfo::from_identity(identity, now));
        info.last_used = Some(now);
    }

    /// Store detected IP info, creating a bare entry for unknown ids.
    pub fn update_ip_info(&mut self, cookie_store_id: &str, ip_info: IpInfo, now: i64) -> bool {
        if cookie_store_id.is_empty() {
            return false;
        }
        let info = self
            .entries
            .entry(cookie_store_id.to_string())
            .or_insert_with(|| ContainerInfo {
                cookie_store_id: cookie_store_id.to_string(),
                name: None,
                color: None,
                icon: None,
                created: now,
                last_used: None,
                last_updated: None,
                ip_info: None,
            });
        info.ip_info = Some(ip_info);
        info.last_updated = Some(now);
        true
    }

    pub fn get(&self, cookie_store_id: &str) -> Option<&ContainerInfo> {
        self.entries.get(cookie_store_id)
    }

    /// Every entry, oldest first.
    pub fn all(&self) -> Vec<ContainerInfo> {
        let mut out: Vec<ContainerInfo> = self.entries.values().cloned().collect();
        out.sort_by(|a, b| {
            a.created
                .cmp(&b.created)
                .then_with(|| a.cookie_store_id.cmp(&b.cookie_store_id))
        });
        out
    }
}
