//! Router configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (MIZU_*)
//! 2. TOML config file (if MIZU_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Everything the router treats as policy lives here: the current cache
//! generation, legacy partition names, the static asset list, the per-action
//! max-age table and the sweep interval.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::router::lifecycle::CacheGeneration;

mod validation;

pub use validation::ConfigError;

/// Router configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (MIZU_*)
/// 2. TOML config file (if MIZU_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Path to the SQLite cache store.
    ///
    /// Set via MIZU_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Origin the app shell is served from; static asset paths resolve
    /// against it when precaching.
    ///
    /// Set via MIZU_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// The generation this router owns.
    ///
    /// Set via MIZU_GENERATION__VERSION, MIZU_GENERATION__STATIC_PARTITION
    /// and MIZU_GENERATION__DYNAMIC_PARTITION.
    #[serde(default)]
    pub generation: CacheGeneration,

    /// Partition names of earlier generations, deleted on activation.
    #[serde(default = "default_legacy_partitions")]
    pub legacy_partitions: Vec<String>,

    /// Hosts of the remote data API. Subdomains match too.
    #[serde(default = "default_api_hosts")]
    pub api_hosts: Vec<String>,

    /// App-shell paths that are precached and served stale-while-revalidate.
    #[serde(default = "default_static_assets")]
    pub static_assets: Vec<String>,

    /// Max age in milliseconds per logical API action.
    #[serde(default = "default_action_max_age_ms")]
    pub action_max_age_ms: BTreeMap<String, u64>,

    /// Max age for actions missing from `action_max_age_ms`.
    #[serde(default = "default_max_age_ms")]
    pub default_max_age_ms: u64,

    /// Query parameters callers append to defeat caching. Ignored when keying.
    #[serde(default = "default_cache_busting_params")]
    pub cache_busting_params: Vec<String>,

    /// Whether API responses are kept in the dynamic partition.
    ///
    /// Set via MIZU_API_CACHE_ENABLED environment variable.
    #[serde(default = "default_true")]
    pub api_cache_enabled: bool,

    /// Whether install precaches `static_assets`.
    #[serde(default = "default_true")]
    pub precache_on_install: bool,

    /// Interval of the expiry sweep in milliseconds.
    ///
    /// Set via MIZU_SWEEP_INTERVAL_MS environment variable.
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,

    /// How long a control-channel caller waits for a reply.
    #[serde(default = "default_control_timeout_ms")]
    pub control_timeout_ms: u64,

    /// User-Agent string for network requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./mizu-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8788".into()
}

fn default_legacy_partitions() -> Vec<String> {
    [
        "meter-reading-app-v4-performance",
        "meter-reading-app-v3-cloudflare-fixed",
        "meter-reading-app-v2-optimized",
        "v2-optimized",
        "meter-reading-app-v1",
        "meter-reading-data-v4",
        "meter-reading-data-v3",
        "meter-reading-data-v2",
        "meter-reading-data-v1",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_api_hosts() -> Vec<String> {
    vec!["script.google.com".into(), "script.googleusercontent.com".into()]
}

fn default_static_assets() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/property_select.html",
        "/room_select.html",
        "/meter_reading.html",
        "/css_styles/pwa-styles.css",
        "/css_styles/property_select.css",
        "/css_styles/room_select.css",
        "/css_styles/meter_reading.css",
        "/pwa-utils.js",
        "/manifest.json",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_action_max_age_ms() -> BTreeMap<String, u64> {
    [
        ("getProperties", 3_600_000),
        ("getPropertiesLight", 3_600_000),
        ("getRooms", 120_000),
        ("getRoomsLight", 120_000),
        ("getMeterReadings", 600_000),
        ("getDeltaData", 300_000),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn default_max_age_ms() -> u64 {
    120_000
}

fn default_cache_busting_params() -> Vec<String> {
    ["cache", "_", "_t", "t", "timestamp", "nocache"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_sweep_interval_ms() -> u64 {
    30_000
}

fn default_control_timeout_ms() -> u64 {
    3_000
}

fn default_user_agent() -> String {
    "mizu-router/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_true() -> bool {
    true
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            generation: CacheGeneration::default(),
            legacy_partitions: default_legacy_partitions(),
            api_hosts: default_api_hosts(),
            static_assets: default_static_assets(),
            action_max_age_ms: default_action_max_age_ms(),
            default_max_age_ms: default_max_age_ms(),
            cache_busting_params: default_cache_busting_params(),
            api_cache_enabled: true,
            precache_on_install: true,
            sweep_interval_ms: default_sweep_interval_ms(),
            control_timeout_ms: default_control_timeout_ms(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl RouterConfig {
    /// Network timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    /// Max age for a logical API action, falling back to the default.
    pub fn max_age_for(&self, action: Option<&str>) -> u64 {
        action
            .and_then(|a| self.action_max_age_ms.get(a).copied())
            .unwrap_or(self.default_max_age_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `MIZU_`
    /// 2. TOML file from `MIZU_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("MIZU_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("MIZU_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
