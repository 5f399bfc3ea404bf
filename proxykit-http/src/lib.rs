//! Small JSON-over-HTTP client with safe logging and proxy routing.
//!
//! - GET requests against absolute URLs (lookups hit several unrelated hosts)
//! - One attempt per call; callers decide whether to try another source
//! - Optional SOCKS5 route with credentials, DNS resolved by the proxy
//! - Proxy credentials are never logged
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), proxykit_http::HttpError> {
//! let client = proxykit_http::HttpClient::new()?;
//! let got: serde_json::Value = client
//!     .get_json("https://api.ipify.org/?format=json")
//!     .await?;
//! # Ok(()) }
//! ```

use reqwest::{Client, Proxy, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const BODY_SNIPPET_MAX: usize = 500;

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}")]
    Api { status: StatusCode, message: String },
}

// ==============================
// Proxy route
// ==============================

/// An authenticated SOCKS5 endpoint to tunnel requests through.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for ProxyRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyRoute")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &"<redacted>")
            .field("password", &"<redacted>")
            .finish()
    }
}

impl ProxyRoute {
    /// `socks5h://` URL with percent-encoded credentials.
    ///
    /// ```
    /// use proxykit_http::ProxyRoute;
    ///
    /// let route = ProxyRoute {
    ///     host: "na.proxys5.net".into(),
    ///     port: 6200,
    ///     username: "u-region-US".into(),
    ///     password: "p@ss".into(),
    /// };
    /// let url = route.to_url().unwrap();
    /// assert_eq!(url.scheme(), "socks5h");
    /// assert_eq!(url.port(), Some(6200));
    /// assert_eq!(url.password(), Some("p%40ss"));
    /// ```
    pub fn to_url(&self) -> Result<Url, HttpError> {
        let mut url = Url::parse(&format!("socks5h://{}:{}", self.host, self.port))
            .map_err(|e| HttpError::Url(e.to_string()))?;
        url.set_username(&self.username)
            .map_err(|_| HttpError::Url("proxy username rejected".into()))?;
        url.set_password(Some(&self.password))
            .map_err(|_| HttpError::Url("proxy password rejected".into()))?;
        Ok(url)
    }

    /// `host:port` only, for log lines.
    pub fn display_target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ==============================
// Client
// ==============================

#[derive(Clone)]
pub struct HttpClient {
    inner: Client,
    route: Option<ProxyRoute>,
    pub timeout: Duration,
}

impl HttpClient {
    /// Direct client with a 15 s timeout.
    ///
    /// ```
    /// use proxykit_http::HttpClient;
    /// use std::time::Duration;
    ///
    /// let client = HttpClient::new().unwrap();
    /// assert_eq!(client.timeout, Duration::from_secs(15));
    /// assert!(client.route().is_none());
    /// ```
    pub fn new() -> Result<Self, HttpError> {
        Self::build(None)
    }

    /// Client whose every request goes through `route`.
    pub fn via_proxy(route: ProxyRoute) -> Result<Self, HttpError> {
        Self::build(Some(route))
    }

    fn build(route: Option<ProxyRoute>) -> Result<Self, HttpError> {
        let mut builder = Client::builder().connect_timeout(Duration::from_secs(5));
        if let Some(r) = &route {
            let proxy = Proxy::all(r.to_url()?.as_str())
                .map_err(|e| HttpError::Build(e.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let inner = builder
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            inner,
            route,
            timeout: Duration::from_secs(15),
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.timeout = dur;
        self
    }

    pub fn route(&self) -> Option<&ProxyRoute> {
        self.route.as_ref()
    }

    /// GET an absolute URL once and decode the JSON body into `T`.
    pub async fn get_json<T>(&self, url: &str) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let url = Url::parse(url).map_err(|e| HttpError::Url(e.to_string()))?;
        let req_id = format!("r{}", uuid::Uuid::new_v4().simple());
        let via = self
            .route
            .as_ref()
            .map(ProxyRoute::display_target)
            .unwrap_or_else(|| "direct".into());

        tracing::debug!(
            req_id=%req_id,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            timeout_ms=self.timeout.as_millis() as u64,
            via=%via,
            "http.request.start"
        );

        let t0 = std::time::Instant::now();
        let resp = self
            .inner
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(req_id=%req_id, message=%e, "http.network_error");
                HttpError::Network(e.to_string())
            })?;
        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| HttpError::Network(e.to_string()))?;

        let snippet = snip_body(&bytes);
        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=t0.elapsed().as_millis() as u64,
            body_len=bytes.len(),
            "http.response"
        );
        tracing::trace!(req_id=%req_id, body_snippet=%snippet, "http.response.body_snippet");

        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id=%req_id,
                    serde_err=%e,
                    body_snippet=%snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        let message = extract_error_message(&bytes);
        tracing::warn!(req_id=%req_id, %status, message=%message, "http.error");
        Err(HttpError::Api { status, message })
    }
}

// ==============================
// Helpers
// ==============================

fn extract_error_message(body: &[u8]) -> String {
    // {"error":{"message":"..."}}, {"error":"..."}, {"message":"..."}, {"reason":"..."}
    #[derive(Deserialize)]
    struct Nested {
        error: NestedDetail,
    }
    #[derive(Deserialize)]
    struct NestedDetail {
        message: String,
    }
    #[derive(Deserialize)]
    struct Flat {
        #[serde(default)]
        message: String,
        #[serde(default)]
        error: String,
        #[serde(default)]
        reason: String,
    }

    if let Ok(n) = serde_json::from_slice::<Nested>(body) {
        return n.error.message;
    }
    if let Ok(f) = serde_json::from_slice::<Flat>(body) {
        for candidate in [f.message, f.error, f.reason] {
            if !candidate.is_empty() {
                return candidate;
            }
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > BODY_SNIPPET_MAX {
        let mut cut = BODY_SNIPPET_MAX;
        while !snip.is_char_boundary(cut) {
            cut -= 1;
        }
        snip.truncate(cut);
        snip.push_str("...");
    }
    snip
}
