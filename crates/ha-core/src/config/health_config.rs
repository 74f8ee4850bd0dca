use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::models::HealthStatus;

/// System health engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Maximum number of events retained per entity (history depth N).
    pub max_history: usize,
    /// Optimistic-concurrency attempts per entity update before giving up.
    pub max_update_retries: u32,
    /// Hierarchy schema JSON file. `None` selects the built-in schema.
    pub schema_path: Option<String>,
    /// Additional or overriding raw event_type -> status entries.
    pub status_map: BTreeMap<String, HealthStatus>,
    /// Additional raw resource_type -> component type entries.
    pub resource_map: BTreeMap<String, String>,
    /// Per-level rollup fallback event_type, keyed by parent component type.
    pub fallback_overrides: BTreeMap<String, String>,
}

impl Default for HealthConfig {
    fn default() -> Self {
        let mut fallback_overrides = BTreeMap::new();
        fallback_overrides.insert("node".to_string(), defaults::DEFAULT_NODE_FALLBACK.to_string());
        Self {
            max_history: defaults::DEFAULT_MAX_HISTORY,
            max_update_retries: defaults::DEFAULT_MAX_UPDATE_RETRIES,
            schema_path: None,
            status_map: BTreeMap::new(),
            resource_map: BTreeMap::new(),
            fallback_overrides,
        }
    }
}
