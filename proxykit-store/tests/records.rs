use proxykit_generator::{build_document, Credentials, GeneratorOptions};
use proxykit_store::{
    CredentialStore, DocumentStore, KeyValueStore, MemoryStore, SettingsStore, SqliteStore,
    StoreError, CREDENTIALS_KEY, SETTINGS_KEY,
};
use serde_json::json;
use std::sync::Arc;

async fn backends() -> Vec<Arc<dyn KeyValueStore>> {
    vec![
        Arc::new(MemoryStore::new()),
        Arc::new(SqliteStore::in_memory().await.unwrap()),
    ]
}

#[tokio::test]
async fn credentials_are_trimmed_and_stamped() {
    for kv in backends().await {
        let store = CredentialStore::new(kv.clone());
        assert!(store.load().await.unwrap().is_none());

        let saved = store.save("  alice ", " secret\n").await.unwrap();
        assert_eq!(saved.username, "alice");
        assert_eq!(saved.password, "secret");
        assert!(saved.timestamp.is_some());

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.credentials(), Credentials::new("alice", "secret"));

        let raw = kv.get(CREDENTIALS_KEY).await.unwrap().unwrap();
        assert_eq!(raw["username"], "alice");
    }
}

#[tokio::test]
async fn blank_credentials_are_rejected_and_not_written() {
    for kv in backends().await {
        let store = CredentialStore::new(kv.clone());
        let err = store.save("   ", "pw").await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(kv.get(CREDENTIALS_KEY).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn logout_clears_credentials() {
    for kv in backends().await {
        let store = CredentialStore::new(kv);
        store.save("u", "p").await.unwrap();
        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}

#[tokio::test]
async fn settings_are_seeded_once() {
    for kv in backends().await {
        let store = SettingsStore::new(kv.clone());
        let defaults = GeneratorOptions::new("na.proxys5.net", 6200, "US", 10);
        let seeded = store.load_or_seed(defaults.clone()).await.unwrap();
        assert_eq!(seeded, defaults);

        let changed = GeneratorOptions {
            region: "DE".into(),
            ..defaults.clone()
        };
        store.save(&changed).await.unwrap();
        let again = store.load_or_seed(defaults).await.unwrap();
        assert_eq!(again, changed);
    }
}

#[tokio::test]
async fn unreadable_settings_are_reseeded() {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    kv.set(SETTINGS_KEY, json!({"endpoint": 42})).await.unwrap();
    let store = SettingsStore::new(kv);
    let defaults = GeneratorOptions::new("h", 1, "US", 1);
    assert_eq!(store.load_or_seed(defaults.clone()).await.unwrap(), defaults);
}

#[tokio::test]
async fn last_document_round_trips() {
    for kv in backends().await {
        let store = DocumentStore::new(kv);
        let doc = build_document(
            &GeneratorOptions::new("na.proxys5.net", 6200, "US", 3),
            &Credentials::new("abc", "xyz"),
        )
        .unwrap();
        store.save(&doc).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(doc));
    }
}
