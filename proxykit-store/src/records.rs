//! Typed records on top of a [`KeyValueStore`].
use crate::{KeyValueStore, StoreError, CREDENTIALS_KEY, DOCUMENT_KEY, SETTINGS_KEY};
use chrono::Utc;
use proxykit_generator::{ConfigDocument, Credentials, GeneratorOptions};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

async fn read<T: DeserializeOwned>(
    kv: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match kv.get(key).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

async fn write<T: Serialize>(kv: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
    kv.set(key, serde_json::to_value(value)?).await
}

/// Credentials as persisted, with the time they were saved.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl fmt::Debug for StoredCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredentials")
            .field("username", &proxykit_common::fingerprint(&self.username))
            .field("password", &"<redacted>")
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

impl StoredCredentials {
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.username.clone(), self.password.clone())
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    kv: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn load(&self) -> Result<Option<StoredCredentials>, StoreError> {
        read(self.kv.as_ref(), CREDENTIALS_KEY).await
    }

    /// Trim, reject empties, stamp and persist.
    pub async fn save(&self, username: &str, password: &str) -> Result<StoredCredentials, StoreError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(StoreError::Validation(
                "Please enter both username and password".into(),
            ));
        }
        let record = StoredCredentials {
            username: username.to_string(),
            password: password.to_string(),
            timestamp: Some(Utc::now().to_rfc3339()),
        };
        write(self.kv.as_ref(), CREDENTIALS_KEY, &record).await?;
        info!(
            account = %proxykit_common::fingerprint(username),
            "store.credentials.saved"
        );
        Ok(record)
    }

    pub async fn clear(&self) -> Result<(), StoreError> {
        self.kv.remove(CREDENTIALS_KEY).await?;
        info!("store.credentials.cleared");
        Ok(())
    }
}

#[derive(Clone)]
pub struct SettingsStore {
    kv: Arc<dyn KeyValueStore>,
}

impl SettingsStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn load(&self) -> Result<Option<GeneratorOptions>, StoreError> {
        read(self.kv.as_ref(), SETTINGS_KEY).await
    }

    pub async fn save(&self, options: &GeneratorOptions) -> Result<(), StoreError> {
        write(self.kv.as_ref(), SETTINGS_KEY, options).await
    }

    /// Load the stored settings, seeding and persisting `defaults` when absent.
    /// An unreadable record is replaced by the defaults.
    pub async fn load_or_seed(&self, defaults: GeneratorOptions) -> Result<GeneratorOptions, StoreError> {
        match self.load().await {
            Ok(Some(existing)) => return Ok(existing),
            Ok(None) => info!("store.settings.seeding_defaults"),
            Err(StoreError::Json(e)) => warn!(error = %e, "store.settings.unreadable_reseeding"),
            Err(other) => return Err(other),
        }
        self.save(&defaults).await?;
        Ok(defaults)
    }
}

#[derive(Clone)]
pub struct DocumentStore {
    kv: Arc<dyn KeyValueStore>,
}

impl DocumentStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    pub async fn load(&self) -> Result<Option<ConfigDocument>, StoreError> {
        read(self.kv.as_ref(), DOCUMENT_KEY).await
    }

    pub async fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        write(self.kv.as_ref(), DOCUMENT_KEY, doc).await
    }
}
