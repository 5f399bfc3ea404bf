use crate::GeneratorError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minutes the upstream provider keeps a session sticky. Part of the
/// username contract, not a setting.
pub const SESSION_MINUTES: u32 = 15;

/// Where the proxies live and how many to emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorOptions {
    pub endpoint: String,
    pub port: u16,
    /// Short uppercase country code, e.g. `US`.
    pub region: String,
    pub proxy_count: u32,
}

impl GeneratorOptions {
    pub fn new(endpoint: impl Into<String>, port: u16, region: impl Into<String>, proxy_count: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            port,
            region: region.into(),
            proxy_count,
        }
    }

    /// `endpoint:port`, the document's `mode` value.
    pub fn mode(&self) -> String {
        format!("{}:{}", self.endpoint, self.port)
    }

    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.proxy_count == 0 {
            return Err(GeneratorError::Validation(
                "proxy count must be at least 1".into(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(GeneratorError::Validation("proxy endpoint is empty".into()));
        }
        if self.region.is_empty() || !self.region.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(GeneratorError::Validation(format!(
                "region must be an uppercase code, got {:?}",
                self.region
            )));
        }
        Ok(())
    }
}

/// Account credentials for the upstream proxy provider.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &proxykit_common::fingerprint(&self.username))
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.is_complete() {
            Ok(())
        } else {
            Err(GeneratorError::Validation(
                "Username and password are required to generate proxy configuration".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_joins_endpoint_and_port() {
        assert_eq!(GeneratorOptions::new("h", 1, "US", 1).mode(), "h:1");
    }

    #[test]
    fn lowercase_region_is_rejected() {
        let opts = GeneratorOptions::new("h", 1, "us", 1);
        assert!(matches!(opts.validate(), Err(GeneratorError::Validation(_))));
    }

    #[test]
    fn zero_count_is_rejected() {
        let opts = GeneratorOptions::new("h", 1, "US", 0);
        assert!(opts.validate().is_err());
    }

    #[test]
    fn options_use_camel_case_on_the_wire() {
        let json = serde_json::to_value(GeneratorOptions::new("h", 6200, "US", 2)).unwrap();
        assert_eq!(json["proxyCount"], 2);
        assert!(json.get("sessionMinutes").is_none());
    }

    #[test]
    fn stored_session_minutes_are_ignored() {
        let back: GeneratorOptions = serde_json::from_value(serde_json::json!({
            "endpoint": "h", "port": 6200, "region": "US", "proxyCount": 2, "sessionMinutes": 0
        }))
        .unwrap();
        assert_eq!(back, GeneratorOptions::new("h", 6200, "US", 2));
    }

    #[test]
    fn debug_never_prints_password() {
        let creds = Credentials::new("alice", "hunter2");
        let dbg = format!("{creds:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("alice"));
    }

    #[test]
    fn incomplete_credentials_fail_validation() {
        assert!(Credentials::new("", "p").validate().is_err());
        assert!(Credentials::new("u", "").validate().is_err());
        assert!(Credentials::new("u", "p").validate().is_ok());
    }
}
