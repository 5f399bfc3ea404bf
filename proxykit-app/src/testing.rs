//! Fakes shared by the app's unit tests.
use crate::wiring::{self, App};
use async_trait::async_trait;
use proxykit_config::ProxyKitConfig;
use proxykit_containers::{ContainerHost, IpInfo, LocalContainerHost};
use proxykit_probe::{IpProbe, ProbeContext, ProbeError};
use proxykit_store::{KeyValueStore, MemoryStore};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
pub struct FakeProbe {
    pub failing: Mutex<HashSet<String>>,
    pub slow: Mutex<HashSet<String>>,
    pub delay: Duration,
    pub calls: Mutex<Vec<ProbeContext>>,
}

impl FakeProbe {
    pub fn fail_for(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }
}

pub fn sample_ip(ip: &str) -> IpInfo {
    IpInfo {
        ip: ip.into(),
        city: "Austin".into(),
        region: "Texas".into(),
        country: "US".into(),
        location: String::new(),
        org: String::new(),
        detected: 1,
    }
}

#[async_trait]
impl IpProbe for FakeProbe {
    async fn detect(&self, ctx: &ProbeContext) -> Result<IpInfo, ProbeError> {
        self.calls.lock().unwrap().push(ctx.clone());
        let slow = self.slow.lock().unwrap().contains(&ctx.cookie_store_id);
        if slow {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.lock().unwrap().contains(&ctx.cookie_store_id) {
            return Err(ProbeError::Exhausted {
                primary: "503".into(),
                fallback: "503".into(),
            });
        }
        Ok(sample_ip("203.0.113.7"))
    }
}

pub struct TestApp {
    pub app: App,
    pub kv: Arc<dyn KeyValueStore>,
    pub host: Arc<LocalContainerHost>,
    pub probe: Arc<FakeProbe>,
}

pub async fn test_app_with(host: LocalContainerHost, probe: FakeProbe) -> TestApp {
    let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let host = Arc::new(host);
    let probe = Arc::new(probe);
    let app = wiring::build(
        ProxyKitConfig::default(),
        kv.clone(),
        host.clone() as Arc<dyn ContainerHost>,
        probe.clone() as Arc<dyn IpProbe>,
    )
    .await
    .unwrap();
    TestApp {
        app,
        kv,
        host,
        probe,
    }
}

pub async fn test_app() -> TestApp {
    test_app_with(LocalContainerHost::ephemeral(), FakeProbe::default()).await
}
