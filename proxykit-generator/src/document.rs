//! Document shapes consumed by the FoxyProxy add-on.
//!
//! Field names, order and nesting are fixed by the add-on's import schema.
use crate::GeneratorError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PROXY_TYPE_SOCKS5: &str = "socks5";

/// One proxy in the `data` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyEntry {
    pub active: bool,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub hostname: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub cc: String,
    pub city: String,
    pub color: String,
    pub pac: String,
    #[serde(rename = "pacString")]
    pub pac_string: String,
    #[serde(rename = "proxyDNS")]
    pub proxy_dns: bool,
    pub include: Vec<Value>,
    pub exclude: Vec<Value>,
    #[serde(rename = "tabProxy")]
    pub tab_proxy: Vec<Value>,
}

/// Keyboard command bindings; always empty in generated documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commands {
    pub set_proxy: String,
    pub set_tab_proxy: String,
    pub include_host: String,
    pub exclude_host: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    pub mode: String,
    pub sync: bool,
    pub auto_backup: bool,
    pub passthrough: String,
    pub theme: String,
    pub container: Map<String, Value>,
    pub commands: Commands,
    pub data: Vec<ProxyEntry>,
}

impl ConfigDocument {
    /// Wrap entries in the top-level shape with every placeholder field empty.
    pub fn new(mode: String, data: Vec<ProxyEntry>) -> Self {
        Self {
            mode,
            sync: false,
            auto_backup: false,
            passthrough: String::new(),
            theme: String::new(),
            container: Map::new(),
            commands: Commands::default(),
            data,
        }
    }

    /// Pretty JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String, GeneratorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self, GeneratorError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Session ids of all entries, in order.
    pub fn session_ids(&self) -> Vec<&str> {
        self.data.iter().filter_map(ProxyEntry::session_id).collect()
    }
}

impl ProxyEntry {
    /// The `sessid` segment of the derived username, if present.
    pub fn session_id(&self) -> Option<&str> {
        let rest = self.username.split("-sessid-").nth(1)?;
        rest.split("-sessTime-").next()
    }
}
