use ha_core::models::*;
use proptest::prelude::*;
use serde_json::Map;

fn entity_event(ts: i64, status: HealthStatus) -> EntityEvent {
    EntityEvent {
        event_timestamp: ts,
        created_timestamp: ts,
        status,
        specific_info: Map::new(),
    }
}

#[test]
fn health_event_wire_format_round_trips_the_documented_fields() {
    let payload = r#"{
        "source": "hw", "event_id": "e-1", "event_type": "fault", "severity": "critical",
        "site_id": "s1", "rack_id": "r1", "cluster_id": "c1", "storageset_id": "ss1",
        "node_id": "n1", "host_id": "host-1", "resource_type": "disk", "resource_id": "d7",
        "timestamp": "1700000000", "specific_info": {"cvg_id": "cvg-0"}
    }"#;
    let ev = HealthEvent::from_json(payload).unwrap();
    assert_eq!(ev.timestamp_secs(), 1_700_000_000);
    assert_eq!(ev.specific_str("cvg_id"), Some("cvg-0"));
    let back: serde_json::Value = serde_json::from_str(&ev.to_json().unwrap()).unwrap();
    assert_eq!(back["resource_id"], "d7");
    assert_eq!(back["storageset_id"], "ss1");
}

#[test]
fn entity_health_persisted_shape() {
    let mut health = EntityHealth::default();
    health.add_event(entity_event(10, HealthStatus::Online), 5);
    health.set_action(ActionStatus::Pending, 11);
    let value: serde_json::Value = serde_json::from_str(&health.write().unwrap()).unwrap();
    assert_eq!(value["events"][0]["status"], "online");
    assert_eq!(value["action"]["status"], "pending");
    assert_eq!(value["action"]["modified_timestamp"], 11);
    assert!(value["attributes"].is_object());
}

#[test]
fn status_query_result_serializes_tree() {
    let result = StatusQueryResult {
        status: ResultStatus::Succeeded,
        output: vec![ComponentStatus {
            component_type: "rack".into(),
            id: "r1".into(),
            status: HealthStatus::Degraded,
            last_changed: 5,
            children: vec![],
        }],
        error: None,
    };
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["status"], "Succeeded");
    assert_eq!(value["output"][0]["type"], "rack");
    assert_eq!(value["output"][0]["lastChanged"], 5);
}

proptest! {
    #[test]
    fn history_never_exceeds_bound(max in 1usize..16, inserts in 0usize..64) {
        let mut health = EntityHealth::default();
        for i in 0..inserts {
            health.add_event(entity_event(i as i64, HealthStatus::Online), max);
            prop_assert!(health.events.len() <= max);
        }
        prop_assert_eq!(health.events.len(), inserts.min(max));
        if inserts > 0 {
            prop_assert_eq!(health.events[0].event_timestamp, inserts as i64 - 1);
        }
    }
}
