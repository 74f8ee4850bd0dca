use serde::{Deserialize, Serialize};

use super::defaults;

/// One bootstrap rule: (resource_type, event_type) -> actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub resource_type: String,
    pub event_type: String,
    pub actions: Vec<String>,
}

/// Health Monitor rule engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub enabled: bool,
    pub consumer_group: String,
    /// Capacity of the action dispatch queue. A full queue drops actions.
    pub action_queue_size: usize,
    /// Rules loaded into the store when the monitor starts.
    pub rules: Vec<RuleConfig>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::DEFAULT_MONITOR_ENABLED,
            consumer_group: defaults::DEFAULT_MONITOR_GROUP.to_string(),
            action_queue_size: defaults::DEFAULT_ACTION_QUEUE_SIZE,
            rules: Vec::new(),
        }
    }
}
