#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use ha_core::config::HaConfig;
use ha_core::errors::HaResult;
use ha_core::models::HealthEvent;
use ha_core::traits::EventPublisher;
use ha_health::{HaContext, SystemHealth};
use ha_store::MemoryKvStore;

/// Publisher that keeps everything it is handed.
#[derive(Default)]
pub struct RecordingPublisher {
    pub events: Mutex<Vec<HealthEvent>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<HealthEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count_for(&self, resource_type: &str, resource_id: &str) -> usize {
        self.published()
            .iter()
            .filter(|e| e.resource_type == resource_type && e.resource_id == resource_id)
            .count()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: &HealthEvent) -> HaResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn engine_with(config: HaConfig) -> (SystemHealth, Arc<RecordingPublisher>) {
    let publisher = Arc::new(RecordingPublisher::default());
    let ctx = HaContext::new(config, Arc::new(MemoryKvStore::new()), publisher.clone()).unwrap();
    (SystemHealth::new(Arc::new(ctx)), publisher)
}

pub fn engine() -> (SystemHealth, Arc<RecordingPublisher>) {
    engine_with(HaConfig::default())
}

/// Engine over the flat cluster -> rack -> node schema fixture.
pub fn rack_engine() -> (SystemHealth, Arc<RecordingPublisher>) {
    let mut config = HaConfig::default();
    config.health.schema_path = Some(
        test_fixtures::fixture_path("schema/rack_nodes.json")
            .to_string_lossy()
            .into_owned(),
    );
    engine_with(config)
}

pub fn ids(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn node_ids(node: &str) -> BTreeMap<String, String> {
    ids(&[
        ("cluster_id", "c1"),
        ("site_id", "s1"),
        ("rack_id", "r1"),
        ("storageset_id", "ss1"),
        ("node_id", node),
    ])
}

/// Hardware event about a node in c1/s1/r1/ss1.
pub fn node_event(node: &str, event_type: &str) -> HealthEvent {
    HealthEvent {
        source: "hw".to_string(),
        event_id: format!("{node}-{event_type}"),
        event_type: event_type.to_string(),
        severity: "informational".to_string(),
        cluster_id: "c1".to_string(),
        site_id: "s1".to_string(),
        rack_id: "r1".to_string(),
        storageset_id: "ss1".to_string(),
        node_id: node.to_string(),
        resource_type: "node".to_string(),
        resource_id: node.to_string(),
        timestamp: "1700000000".to_string(),
        ..Default::default()
    }
}

/// Pod-monitor event about a node, carrying a generation id.
pub fn monitor_event(node: &str, event_type: &str, generation: &str) -> HealthEvent {
    let mut event = node_event(node, event_type);
    event.source = "monitor".to_string();
    event.set_specific("generation_id", serde_json::Value::String(generation.to_string()));
    event
}

/// Hardware event about a disk on node `node`.
pub fn disk_event(node: &str, disk: &str, cvg: Option<&str>, event_type: &str) -> HealthEvent {
    let mut event = node_event(node, event_type);
    event.resource_type = "node:fru:disk".to_string();
    event.resource_id = disk.to_string();
    if let Some(cvg) = cvg {
        event.set_specific("cvg_id", serde_json::Value::String(cvg.to_string()));
    }
    event
}
