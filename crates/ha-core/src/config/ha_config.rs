//! Top-level HA configuration with layered resolution.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{
    AckPolicy, HealthConfig, MonitorConfig, ObservabilityConfig, PipelineConfig, StoreBackend,
    StoreConfig,
};
use crate::errors::ConfigError;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. Environment variables (`HA_*`)
/// 2. Config file
/// 3. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HaConfig {
    pub store: StoreConfig,
    pub health: HealthConfig,
    pub pipeline: PipelineConfig,
    pub monitor: MonitorConfig,
    pub observability: ObservabilityConfig,
}

impl HaConfig {
    /// Load configuration from an optional TOML file, then apply `HA_*`
    /// environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    })?;
                toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?
            }
            None => Self::default(),
        };

        Self::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML string (for testing and embedding).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// Recognized: `HA_STORE_BACKEND`, `HA_DB_PATH`, `HA_KEY_PREFIX`,
    /// `HA_MAX_HISTORY`, `HA_ACK_POLICY`, `HA_LOG_LEVEL`.
    pub fn apply_env_overrides<F>(config: &mut HaConfig, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(backend) = lookup("HA_STORE_BACKEND") {
            config.store.backend = match backend.to_ascii_lowercase().as_str() {
                "memory" => StoreBackend::Memory,
                "sqlite" => StoreBackend::Sqlite,
                other => return Err(invalid("store.backend", format!("unknown backend {other}"))),
            };
        }
        if let Some(path) = lookup("HA_DB_PATH") {
            config.store.db_path = path;
        }
        if let Some(prefix) = lookup("HA_KEY_PREFIX") {
            config.store.key_prefix = prefix;
        }
        if let Some(depth) = lookup("HA_MAX_HISTORY") {
            config.health.max_history = depth
                .parse()
                .map_err(|_| invalid("health.max_history", format!("not a number: {depth}")))?;
        }
        if let Some(policy) = lookup("HA_ACK_POLICY") {
            config.pipeline.ack_policy = match policy.to_ascii_lowercase().as_str() {
                "always" => AckPolicy::Always,
                "on_success" => AckPolicy::OnSuccess,
                other => return Err(invalid("pipeline.ack_policy", format!("unknown policy {other}"))),
            };
        }
        if let Some(level) = lookup("HA_LOG_LEVEL") {
            config.observability.log_level = level;
        }
        Ok(())
    }

    /// Validate the configuration values.
    pub fn validate(config: &HaConfig) -> Result<(), ConfigError> {
        if config.health.max_history == 0 {
            return Err(invalid("health.max_history", "must be at least 1"));
        }
        if config.health.max_update_retries == 0 {
            return Err(invalid("health.max_update_retries", "must be at least 1"));
        }
        if !config.store.key_prefix.starts_with('/') || config.store.key_prefix.contains('$') {
            return Err(invalid(
                "store.key_prefix",
                "must start with '/' and contain no placeholders",
            ));
        }
        if config.pipeline.poll_interval_ms == 0 {
            return Err(invalid("pipeline.poll_interval_ms", "must be greater than 0"));
        }
        if config.monitor.action_queue_size == 0 {
            return Err(invalid("monitor.action_queue_size", "must be greater than 0"));
        }
        for (i, watcher) in config.pipeline.watchers.iter().enumerate() {
            if watcher.message_type.is_empty() || watcher.consumer_group.is_empty() {
                return Err(invalid(
                    &format!("pipeline.watchers[{i}]"),
                    "message_type and consumer_group are required",
                ));
            }
        }
        for (i, rule) in config.monitor.rules.iter().enumerate() {
            if rule.resource_type.is_empty() || rule.event_type.is_empty() {
                return Err(invalid(
                    &format!("monitor.rules[{i}]"),
                    "resource_type and event_type are required",
                ));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.into(),
    }
}
