use crate::{IpProbe, ProbeContext, ProbeError};
use async_trait::async_trait;
use proxykit_config::ProbeSettings;
use proxykit_containers::{now_millis, IpInfo};
use proxykit_http::{HttpClient, HttpError};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Deserialize)]
struct IpifyResponse {
    ip: String,
}

#[derive(Debug, Default, Deserialize)]
struct IpinfoResponse {
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
    loc: Option<String>,
    org: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct IpapiResponse {
    ip: Option<String>,
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    org: Option<String>,
}

fn or_unknown(v: Option<String>) -> String {
    v.filter(|s| !s.is_empty()).unwrap_or_else(|| UNKNOWN.to_string())
}

/// ipify + ipinfo, falling back to ipapi.
#[derive(Clone)]
pub struct HttpIpProbe {
    direct: HttpClient,
    primary_ip_url: String,
    primary_geo_url: String,
    fallback_url: String,
    timeout: Duration,
}

impl HttpIpProbe {
    pub fn new(settings: &ProbeSettings) -> Result<Self, ProbeError> {
        let timeout = Duration::from_secs(settings.timeout_secs);
        Ok(Self {
            direct: HttpClient::new()?.with_timeout(timeout),
            primary_ip_url: settings.primary_ip_url.clone(),
            primary_geo_url: settings.primary_geo_url.trim_end_matches('/').to_string(),
            fallback_url: settings.fallback_url.clone(),
            timeout,
        })
    }

    fn client_for(&self, ctx: &ProbeContext) -> Result<HttpClient, HttpError> {
        match &ctx.route {
            Some(route) => Ok(HttpClient::via_proxy(route.clone())?
                .with_timeout(self.timeout)),
            None => Ok(self.direct.clone()),
        }
    }

    async fn primary(&self, client: &HttpClient) -> Result<IpInfo, HttpError> {
        let ipify: IpifyResponse = client.get_json(&self.primary_ip_url).await?;
        let geo_url = format!("{}/{}/json", self.primary_geo_url, ipify.ip);
        let geo: IpinfoResponse = client.get_json(&geo_url).await?;
        Ok(IpInfo {
            ip: ipify.ip,
            city: or_unknown(geo.city),
            region: or_unknown(geo.region),
            country: or_unknown(geo.country),
            location: geo.loc.unwrap_or_default(),
            org: geo.org.unwrap_or_default(),
            detected: now_millis(),
        })
    }

    async fn fallback(&self, client: &HttpClient) -> Result<IpInfo, HttpError> {
        let data: IpapiResponse = client.get_json(&self.fallback_url).await?;
        let location = match (data.latitude, data.longitude) {
            (Some(lat), Some(lon)) => format!("{lat},{lon}"),
            _ => String::new(),
        };
        Ok(IpInfo {
            ip: or_unknown(data.ip),
            city: or_unknown(data.city),
            region: or_unknown(data.region),
            country: or_unknown(data.country_name),
            location,
            org: data.org.unwrap_or_default(),
            detected: now_millis(),
        })
    }
}

#[async_trait]
impl IpProbe for HttpIpProbe {
    async fn detect(&self, ctx: &ProbeContext) -> Result<IpInfo, ProbeError> {
        let client = self.client_for(ctx)?;
        let primary_err = match self.primary(&client).await {
            Ok(info) => {
                debug!(container = %ctx.cookie_store_id, source = "primary", "probe.detected");
                return Ok(info);
            }
            Err(e) => e,
        };
        warn!(
            container = %ctx.cookie_store_id,
            error = %primary_err,
            "probe.fallback"
        );
        match self.fallback(&client).await {
            Ok(info) => {
                debug!(container = %ctx.cookie_store_id, source = "fallback", "probe.detected");
                Ok(info)
            }
            Err(fallback_err) => Err(ProbeError::Exhausted {
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            }),
        }
    }
}
