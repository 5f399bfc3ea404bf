//! Best-effort public IP and location detection per container.
//!
//! A probe is a primary lookup with a single fallback. Failures never escalate
//! past the caller: they turn into an [`IpReport`] placeholder.
use async_trait::async_trait;
use proxykit_common::ProxyKitError;
use proxykit_containers::IpInfo;
use proxykit_http::HttpError;

pub use proxykit_http::ProxyRoute;

pub mod batch;
pub mod http_probe;
pub mod report;
pub mod routing;

pub use batch::{detect_all, ProbeResult};
pub use http_probe::HttpIpProbe;
pub use report::IpReport;
pub use routing::{assign_routes, route_for_entry};

/// What to probe: a container, and the proxy its traffic goes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeContext {
    pub cookie_store_id: String,
    pub route: Option<ProxyRoute>,
}

impl ProbeContext {
    pub fn direct(cookie_store_id: impl Into<String>) -> Self {
        Self {
            cookie_store_id: cookie_store_id.into(),
            route: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error("primary lookup failed ({primary}); fallback failed ({fallback})")]
    Exhausted { primary: String, fallback: String },
    #[error("probe cancelled")]
    Cancelled,
}

impl From<ProbeError> for ProxyKitError {
    fn from(err: ProbeError) -> Self {
        ProxyKitError::NetworkLookup(err.to_string())
    }
}

#[async_trait]
pub trait IpProbe: Send + Sync {
    async fn detect(&self, ctx: &ProbeContext) -> Result<IpInfo, ProbeError>;
}
