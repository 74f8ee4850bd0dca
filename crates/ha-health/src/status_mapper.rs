//! Raw event type -> canonical status.

use std::collections::{BTreeMap, HashMap};

use ha_core::constants::{event_types, COMPONENT_NODE};
use ha_core::errors::HealthError;
use ha_core::models::{sources, HealthEvent, HealthStatus};

/// Built-in mapping table. `health.status_map` entries extend or replace it.
pub const DEFAULT_STATUS_TABLE: [(&str, HealthStatus); 16] = [
    ("online", HealthStatus::Online),
    ("fault_resolved", HealthStatus::Online),
    ("insertion", HealthStatus::Online),
    ("offline", HealthStatus::Offline),
    ("missing", HealthStatus::Offline),
    ("failed", HealthStatus::Failed),
    ("fault", HealthStatus::Failed),
    ("threshold_breached:low", HealthStatus::Degraded),
    ("threshold_breached:high", HealthStatus::Degraded),
    ("degraded", HealthStatus::Degraded),
    ("unknown", HealthStatus::Unknown),
    ("recovering", HealthStatus::Recovering),
    ("repairing", HealthStatus::Repairing),
    ("repaired", HealthStatus::Repaired),
    ("rebalance", HealthStatus::Rebalancing),
    ("rebalancing", HealthStatus::Rebalancing),
];

#[derive(Debug, Clone)]
pub struct StatusMapper {
    table: HashMap<String, HealthStatus>,
}

impl StatusMapper {
    pub fn new(overrides: &BTreeMap<String, HealthStatus>) -> Self {
        let mut table: HashMap<String, HealthStatus> = DEFAULT_STATUS_TABLE
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect();
        for (event_type, status) in overrides {
            table.insert(event_type.to_ascii_lowercase(), *status);
        }
        Self { table }
    }

    /// Table lookup only, without the source-specific override.
    pub fn lookup(&self, event_type: &str) -> Option<HealthStatus> {
        self.table.get(&event_type.to_ascii_lowercase()).copied()
    }

    /// Canonical status of `event` for the resolved `component`.
    ///
    /// A node reported online by the pod monitor is still warming up and maps
    /// to `starting`.
    pub fn map(&self, event: &HealthEvent, component: &str) -> Result<HealthStatus, HealthError> {
        let status = self
            .lookup(&event.event_type)
            .ok_or_else(|| HealthError::UnknownEventType {
                event_type: event.event_type.clone(),
            })?;
        if event.source == sources::MONITOR
            && event.event_type.eq_ignore_ascii_case(event_types::ONLINE)
            && component == COMPONENT_NODE
        {
            return Ok(HealthStatus::Starting);
        }
        Ok(status)
    }
}

impl Default for StatusMapper {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(source: &str, event_type: &str) -> HealthEvent {
        HealthEvent {
            source: source.to_string(),
            event_type: event_type.to_string(),
            resource_type: "node".to_string(),
            resource_id: "n1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn table_entries() {
        let mapper = StatusMapper::default();
        assert_eq!(mapper.lookup("fault_resolved"), Some(HealthStatus::Online));
        assert_eq!(mapper.lookup("threshold_breached:low"), Some(HealthStatus::Degraded));
        assert_eq!(mapper.lookup("FAULT"), Some(HealthStatus::Failed));
        assert_eq!(mapper.lookup("rebalance"), Some(HealthStatus::Rebalancing));
    }

    #[test]
    fn monitor_node_online_is_starting() {
        let mapper = StatusMapper::default();
        assert_eq!(mapper.map(&event("monitor", "online"), "node").unwrap(), HealthStatus::Starting);
        assert_eq!(mapper.map(&event("hw", "online"), "node").unwrap(), HealthStatus::Online);
        assert_eq!(mapper.map(&event("monitor", "online"), "disk").unwrap(), HealthStatus::Online);
        assert_eq!(mapper.map(&event("monitor", "failed"), "node").unwrap(), HealthStatus::Failed);
    }

    #[test]
    fn unknown_event_type_is_an_error() {
        let err = StatusMapper::default().map(&event("hw", "exploded"), "node").unwrap_err();
        assert!(matches!(err, HealthError::UnknownEventType { .. }));
    }

    #[test]
    fn overrides_replace_and_extend() {
        let mut overrides = BTreeMap::new();
        overrides.insert("missing".to_string(), HealthStatus::Failed);
        overrides.insert("Maintenance".to_string(), HealthStatus::Repairing);
        let mapper = StatusMapper::new(&overrides);
        assert_eq!(mapper.lookup("missing"), Some(HealthStatus::Failed));
        assert_eq!(mapper.lookup("maintenance"), Some(HealthStatus::Repairing));
    }
}
