//! Key-value persistence for settings, credentials and generated documents.
//!
//! Every record is one flat JSON value under a fixed key. [`SqliteStore`] keeps
//! them in a single SQLite table; [`MemoryStore`] is the process-local variant
//! used by tests and ephemeral sessions. Typed access lives in [`records`].
use async_trait::async_trait;
use proxykit_common::ProxyKitError;
use serde_json::Value;

pub mod memory;
pub mod records;
pub mod sqlite;

pub use memory::MemoryStore;
pub use records::{CredentialStore, DocumentStore, SettingsStore, StoredCredentials};
pub use sqlite::SqliteStore;

/// Generator options and related settings.
pub const SETTINGS_KEY: &str = "proxyConfig";
/// The last generated FoxyProxy document.
pub const DOCUMENT_KEY: &str = "foxyProxyConfig";
/// Raw account credentials.
pub const CREDENTIALS_KEY: &str = "proxyCredentials";
/// Container identities kept by the local container host.
pub const CONTAINERS_KEY: &str = "contextualIdentities";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("stored value is not valid JSON for this record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Validation(String),
}

impl From<StoreError> for ProxyKitError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ProxyKitError::Validation(msg),
            other => ProxyKitError::Persistence(other.to_string()),
        }
    }
}

/// Host persistence capability: flat JSON values under string keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
