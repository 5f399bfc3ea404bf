//! Loader for proxykit configuration with YAML + environment overlays.
//!
//! Sources are merged in the order they are added, then `PROXYKIT__`-prefixed
//! environment variables are applied on top (`PROXYKIT__GENERATOR__REGION=DE`).
//! String values may reference other environment variables as `${VAR}`.
//! Every section has defaults, so an empty configuration is valid.
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct ProxyKitConfig {
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub probe: ProbeSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub ui: UiSettings,
}

/// Defaults for proxy document generation.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GeneratorSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default = "default_proxy_count")]
    pub proxy_count: u32,
    #[serde(default = "default_export_prefix")]
    pub export_prefix: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            port: default_port(),
            region: default_region(),
            proxy_count: default_proxy_count(),
            export_prefix: default_export_prefix(),
        }
    }
}

/// Public IP / geolocation lookup endpoints.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ProbeSettings {
    #[serde(default = "default_primary_ip_url")]
    pub primary_ip_url: String,
    /// Base URL; the lookup requests `{base}/{ip}/json`.
    #[serde(default = "default_primary_geo_url")]
    pub primary_geo_url: String,
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,
    /// Send each container's probe through the proxy entry assigned to it.
    #[serde(default = "default_true")]
    pub route_through_proxy: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            primary_ip_url: default_primary_ip_url(),
            primary_geo_url: default_primary_geo_url(),
            fallback_url: default_fallback_url(),
            timeout_secs: default_probe_timeout_secs(),
            route_through_proxy: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct StorageSettings {
    /// sqlx connection string. `None` resolves to a file under the platform
    /// data directory, see [`StorageSettings::resolved_database_url`].
    #[serde(default)]
    pub database_url: Option<String>,
}

impl StorageSettings {
    pub fn resolved_database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}", default_database_path().display()),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct UiSettings {
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    #[serde(default = "default_banner_secs")]
    pub banner_secs: u64,
    #[serde(default = "default_ip_check_url")]
    pub ip_check_url: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            banner_secs: default_banner_secs(),
            ip_check_url: default_ip_check_url(),
        }
    }
}

fn default_endpoint() -> String {
    "na.proxys5.net".into()
}
fn default_port() -> u16 {
    6200
}
fn default_region() -> String {
    "US".into()
}
fn default_proxy_count() -> u32 {
    10
}
fn default_export_prefix() -> String {
    "proxykit-foxyproxy".into()
}
fn default_primary_ip_url() -> String {
    "https://api.ipify.org/?format=json".into()
}
fn default_primary_geo_url() -> String {
    "https://ipinfo.io".into()
}
fn default_fallback_url() -> String {
    "https://ipapi.co/json/".into()
}
fn default_probe_timeout_secs() -> u64 {
    10
}
fn default_true() -> bool {
    true
}
fn default_refresh_interval_secs() -> u64 {
    30
}
fn default_banner_secs() -> u64 {
    3
}
fn default_ip_check_url() -> String {
    "https://ipinfo.io/what-is-my-ip".into()
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("proxykit")
        .join("proxykit.db")
}

impl ProxyKitConfig {
    /// Reject values that would make generation or polling meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.generator.proxy_count == 0 {
            return Err(ConfigError::Message(
                "generator.proxy_count must be at least 1".into(),
            ));
        }
        if self.generator.port == 0 {
            return Err(ConfigError::Message("generator.port must be non-zero".into()));
        }
        if self.generator.endpoint.trim().is_empty() {
            return Err(ConfigError::Message("generator.endpoint is empty".into()));
        }
        let region = &self.generator.region;
        if region.is_empty() || !region.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ConfigError::Message(format!(
                "generator.region must be an uppercase code, got {region:?}"
            )));
        }
        if self.ui.refresh_interval_secs == 0 {
            return Err(ConfigError::Message(
                "ui.refresh_interval_secs must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => {
            let mut cur = std::mem::take(s);
            for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                let expanded = match shellexpand::env(&cur) {
                    Ok(cow) => cow.into_owned(),
                    Err(_) => break,
                };
                if expanded == cur {
                    break;
                }
                cur = expanded;
            }
            *s = cur;
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct ProxyKitConfigLoader {
    files: Vec<(PathBuf, bool)>,
    inline: Vec<String>,
}

impl Default for ProxyKitConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyKitConfigLoader {
    /// Start with no files; `PROXYKIT__` environment overrides always apply.
    ///
    /// ```
    /// use proxykit_config::ProxyKitConfigLoader;
    ///
    /// let config = ProxyKitConfigLoader::new().load().expect("defaults are valid");
    /// assert_eq!(config.generator.endpoint, "na.proxys5.net");
    /// assert_eq!(config.generator.port, 6200);
    /// assert_eq!(config.ui.refresh_interval_secs, 30);
    /// ```
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is skipped when missing, so a bare environment works.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use proxykit_config::ProxyKitConfigLoader;
    ///
    /// let cfg = ProxyKitConfigLoader::new()
    ///     .with_yaml_str("generator:\n  region: DE\n  proxy_count: 3\n")
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.generator.region, "DE");
    /// assert_eq!(cfg.generator.proxy_count, 3);
    /// assert_eq!(cfg.generator.port, 6200);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders and validate.
    pub fn load(self) -> Result<ProxyKitConfig, ConfigError> {
        let mut builder = Config::builder();
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix("PROXYKIT")
                .separator("__")
                .try_parsing(true),
        );

        let mut v: Value = builder.build()?.try_deserialize()?;
        expand_env_in_value(&mut v);

        let mut typed: ProxyKitConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        // Region codes are matched case-sensitively by the provider.
        typed.generator.region = typed.generator.region.trim().to_ascii_uppercase();
        typed.validate()?;
        Ok(typed)
    }
}
