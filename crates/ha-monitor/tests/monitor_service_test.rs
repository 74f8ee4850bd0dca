use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ha_core::config::{HaConfig, RuleConfig};
use ha_core::errors::HaResult;
use ha_core::models::{HealthEvent, RuleKey};
use ha_core::traits::{ActionHandler, MessageProducer};
use ha_health::{HaContext, SystemHealth};
use ha_monitor::HealthMonitorService;
use ha_pipeline::{BusEventPublisher, InMemoryBus};
use ha_store::{HealthStore, MemoryKvStore};

#[derive(Default)]
struct RecordingHandler {
    handled: Mutex<Vec<(String, String, Vec<String>)>>,
}

impl RecordingHandler {
    fn handled(&self) -> Vec<(String, String, Vec<String>)> {
        self.handled.lock().unwrap().clone()
    }
}

impl ActionHandler for RecordingHandler {
    fn handle(&self, event: &HealthEvent, actions: &[String]) -> HaResult<()> {
        self.handled.lock().unwrap().push((
            event.resource_id.clone(),
            event.event_type.clone(),
            actions.to_vec(),
        ));
        Ok(())
    }
}

fn config_with_rule_table() -> HaConfig {
    let mut config = HaConfig::default();
    config.pipeline.poll_interval_ms = 10;
    config.monitor.rules = test_fixtures::load_fixture::<Vec<RuleConfig>>("rules/rule_table.json");
    config
}

fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    check()
}

fn node_event(node: &str, event_type: &str) -> HealthEvent {
    HealthEvent {
        source: "hw".into(),
        event_id: format!("{node}-{event_type}"),
        event_type: event_type.into(),
        severity: "critical".into(),
        cluster_id: "c1".into(),
        site_id: "s1".into(),
        rack_id: "r1".into(),
        storageset_id: "ss1".into(),
        node_id: node.into(),
        resource_type: "node".into(),
        resource_id: node.into(),
        timestamp: "1700000000".into(),
        ..Default::default()
    }
}

#[test]
fn rule_table_is_bootstrapped_once() {
    let bus = InMemoryBus::new();
    let store = HealthStore::in_memory();
    let config = config_with_rule_table();
    let handler = Arc::new(RecordingHandler::default());

    let first = HealthMonitorService::new(&config, &bus, &store, handler.clone()).unwrap();
    let second = HealthMonitorService::new(&config, &bus, &store, handler).unwrap();

    let rules = second.monitor().rules().rules().unwrap();
    assert_eq!(rules.len(), 3);
    let node_failed = rules
        .iter()
        .find(|(key, _)| *key == RuleKey::new("node", "failed"))
        .map(|(_, actions)| actions.clone())
        .unwrap();
    assert_eq!(node_failed, vec!["stop_node_services", "notify_operator"]);

    first.shutdown().unwrap();
    second.shutdown().unwrap();
}

#[test]
fn published_events_drive_actions() {
    let bus = InMemoryBus::new();
    let store = HealthStore::in_memory();
    let config = config_with_rule_table();
    let handler = Arc::new(RecordingHandler::default());
    let service = HealthMonitorService::new(&config, &bus, &store, handler.clone()).unwrap();
    service.start().unwrap();

    bus.publish("ha_events", &node_event("n1", "failed").to_json().unwrap()).unwrap();
    bus.publish("ha_events", &node_event("n1", "online").to_json().unwrap()).unwrap();
    assert!(wait_until(|| service.watcher().stats().processed == 2));
    service.shutdown().unwrap();

    assert_eq!(
        handler.handled(),
        vec![(
            "n1".to_string(),
            "failed".to_string(),
            vec!["stop_node_services".to_string(), "notify_operator".to_string()],
        )]
    );
}

#[test]
fn health_changes_reach_the_monitor_through_the_bus() {
    let bus = InMemoryBus::new();
    let config = config_with_rule_table();
    let publisher = Arc::new(BusEventPublisher::new(
        Arc::new(bus.clone()),
        config.pipeline.publish_topic.clone(),
    ));
    let ctx = HaContext::new(config.clone(), Arc::new(MemoryKvStore::new()), publisher).unwrap();
    let engine = SystemHealth::new(Arc::new(ctx));

    let handler = Arc::new(RecordingHandler::default());
    let service =
        HealthMonitorService::new(&config, &bus, &engine.context().store, handler.clone()).unwrap();
    service.start().unwrap();

    engine.process_event(&node_event("n1", "online")).unwrap();
    engine.process_event(&node_event("n1", "offline")).unwrap();

    assert!(wait_until(|| !handler.handled().is_empty()));
    service.shutdown().unwrap();

    let handled = handler.handled();
    assert_eq!(handled[0], ("n1".to_string(), "offline".to_string(), vec!["fence_node".to_string()]));
}

#[test]
fn disabled_monitor_does_not_consume() {
    let bus = InMemoryBus::new();
    let store = HealthStore::in_memory();
    let mut config = config_with_rule_table();
    config.monitor.enabled = false;
    let handler = Arc::new(RecordingHandler::default());
    let service = HealthMonitorService::new(&config, &bus, &store, handler.clone()).unwrap();
    service.start().unwrap();

    bus.publish("ha_events", &node_event("n1", "failed").to_json().unwrap()).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(service.watcher().stats().received, 0);
    assert_eq!(bus.pending("ha_events", "health_monitor"), 1);
    service.shutdown().unwrap();
    assert!(handler.handled().is_empty());
}

#[test]
fn starting_twice_is_rejected() {
    let bus = InMemoryBus::new();
    let service = HealthMonitorService::new(
        &config_with_rule_table(),
        &bus,
        &HealthStore::in_memory(),
        Arc::new(RecordingHandler::default()),
    )
    .unwrap();
    service.start().unwrap();
    assert!(service.start().is_err());
    service.shutdown().unwrap();
}
