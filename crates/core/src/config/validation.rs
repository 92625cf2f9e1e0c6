//! Configuration validation rules.
//!
//! This module provides validation logic for `RouterConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::RouterConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl RouterConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - the generation has an empty version or partition name
    /// - the static and dynamic partitions share a name
    /// - `sweep_interval_ms` is under one second
    /// - `default_max_age_ms` or any per-action max age is 0
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `control_timeout_ms` is less than 100ms
    /// - `origin` is not an absolute http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        let generation = &self.generation;
        if generation.version.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "generation.version".into(),
                hint: "Set MIZU_GENERATION__VERSION".into(),
            });
        }
        if generation.static_partition.trim().is_empty() || generation.dynamic_partition.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "generation".into(),
                reason: "partition names must not be empty".into(),
            });
        }
        if generation.static_partition == generation.dynamic_partition {
            return Err(ConfigError::Invalid {
                field: "generation".into(),
                reason: "static and dynamic partitions must differ".into(),
            });
        }

        if self.sweep_interval_ms < 1_000 {
            return Err(ConfigError::Invalid {
                field: "sweep_interval_ms".into(),
                reason: "must be at least 1000ms".into(),
            });
        }

        if self.default_max_age_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "default_max_age_ms".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if let Some((action, _)) = self.action_max_age_ms.iter().find(|(_, age)| **age == 0) {
            return Err(ConfigError::Invalid {
                field: format!("action_max_age_ms.{action}"),
                reason: "must be greater than 0".into(),
            });
        }

        if self.timeout_ms < 100 {
            return Err(ConfigError::Invalid { field: "timeout_ms".into(), reason: "must be at least 100ms".into() });
        }
        if self.timeout_ms > 300_000 {
            return Err(ConfigError::Invalid {
                field: "timeout_ms".into(),
                reason: "must not exceed 5 minutes (300000ms)".into(),
            });
        }

        if self.control_timeout_ms < 100 {
            return Err(ConfigError::Invalid {
                field: "control_timeout_ms".into(),
                reason: "must be at least 100ms".into(),
            });
        }

        match url::Url::parse(&self.origin) {
            Ok(origin) if matches!(origin.scheme(), "http" | "https") => {}
            Ok(origin) => {
                return Err(ConfigError::Invalid {
                    field: "origin".into(),
                    reason: format!("unsupported scheme: {}", origin.scheme()),
                });
            }
            Err(e) => return Err(ConfigError::Invalid { field: "origin".into(), reason: e.to_string() }),
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        if self.legacy_partitions.iter().any(|name| generation.owns(name)) {
            tracing::warn!(
                version = %generation.version,
                "legacy_partitions names a current partition; it will be kept"
            );
        }

        if self.api_hosts.is_empty() {
            tracing::warn!("api_hosts is empty; no request will be routed network-only");
        }

        Ok(())
    }
}
