//! HealthEvent: the transient canonical message flowing through the pipeline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known event sources.
pub mod sources {
    /// Pod / process monitor. Drives generation-id reconciliation for nodes.
    pub const MONITOR: &str = "monitor";
    /// Hardware sensor alerts.
    pub const HARDWARE: &str = "hw";
    /// Informational event messages.
    pub const IEM: &str = "iem";
    /// Events derived inside the HA engine (rollups, synthetic failovers).
    pub const HA: &str = "ha";
}

/// Ancestor id fields in hierarchy order, as they appear on the wire.
pub const ANCESTOR_ID_FIELDS: [&str; 5] =
    ["cluster_id", "site_id", "rack_id", "storageset_id", "node_id"];

/// Canonical health event. Created by a parser or a rollup step,
/// never persisted, discarded after processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthEvent {
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub event_id: String,
    pub event_type: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub site_id: String,
    #[serde(default)]
    pub rack_id: String,
    #[serde(default)]
    pub cluster_id: String,
    #[serde(default)]
    pub storageset_id: String,
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub host_id: String,
    pub resource_type: String,
    pub resource_id: String,
    /// Unix seconds, as a string.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub specific_info: Option<Map<String, Value>>,
}

impl HealthEvent {
    /// Decode a bus payload.
    pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }

    /// Encode as a bus payload.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Look up one `specific_info` entry.
    pub fn specific(&self, key: &str) -> Option<&Value> {
        self.specific_info.as_ref().and_then(|info| info.get(key))
    }

    /// A string-valued `specific_info` entry.
    pub fn specific_str(&self, key: &str) -> Option<&str> {
        self.specific(key).and_then(Value::as_str)
    }

    /// Insert a `specific_info` entry, creating the map if needed.
    pub fn set_specific(&mut self, key: &str, value: Value) {
        self.specific_info
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value);
    }

    /// Timestamp as unix seconds; unparsable or empty timestamps read as 0.
    pub fn timestamp_secs(&self) -> i64 {
        self.timestamp.trim().parse().unwrap_or(0)
    }

    /// Non-empty ancestor ids keyed by their placeholder name.
    pub fn ancestor_ids(&self) -> BTreeMap<String, String> {
        let values = [
            &self.cluster_id,
            &self.site_id,
            &self.rack_id,
            &self.storageset_id,
            &self.node_id,
        ];
        ANCESTOR_ID_FIELDS
            .iter()
            .zip(values)
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// Copy ancestor ids back from a placeholder map. Unknown keys are ignored.
    pub fn apply_ancestor_ids(&mut self, ids: &BTreeMap<String, String>) {
        for (key, value) in ids {
            match key.as_str() {
                "cluster_id" => self.cluster_id = value.clone(),
                "site_id" => self.site_id = value.clone(),
                "rack_id" => self.rack_id = value.clone(),
                "storageset_id" => self.storageset_id = value.clone(),
                "node_id" => self.node_id = value.clone(),
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_specific_info_decodes_as_none() {
        let ev = HealthEvent::from_json(
            r#"{"event_type":"online","resource_type":"node","resource_id":"n1","specific_info":null}"#,
        )
        .unwrap();
        assert!(ev.specific_info.is_none());
        assert_eq!(ev.timestamp_secs(), 0);
    }

    #[test]
    fn ancestor_ids_skip_empty() {
        let ev = HealthEvent {
            cluster_id: "c1".into(),
            rack_id: "r1".into(),
            ..Default::default()
        };
        let ids = ev.ancestor_ids();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids["rack_id"], "r1");
    }
}
