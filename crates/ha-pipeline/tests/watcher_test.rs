mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use common::*;
use ha_core::config::{AckPolicy, FilterRules, MessageKind};
use ha_core::errors::{HaError, PipelineError};
use ha_core::traits::{MessageConsumer, MessageProducer, Subscriber};
use ha_pipeline::{Handled, InMemoryBus, InMemoryConsumer, MessageFilter, MessageParser, Watcher};
use ha_store::HealthStore;

const T: Duration = Duration::from_millis(50);

/// A watcher over a consumer the test can also inspect.
fn harness(
    filter: MessageFilter,
    parser: MessageParser,
    subscriber: Arc<dyn Subscriber>,
    ack_policy: AckPolicy,
) -> (InMemoryBus, Arc<InMemoryConsumer>, Watcher) {
    let bus = InMemoryBus::new();
    let consumer = Arc::new(bus.open_consumer("alerts", "g"));
    let watcher = Watcher::new(
        "alerts/g",
        consumer.clone(),
        filter,
        parser,
        subscriber,
        ack_policy,
        Duration::from_millis(10),
    );
    (bus, consumer, watcher)
}

fn deliver(bus: &InMemoryBus, consumer: &InMemoryConsumer, watcher: &Watcher, payload: &str) {
    bus.publish("alerts", payload).unwrap();
    let message = consumer.receive(T).unwrap().expect("message delivered");
    watcher.process_message(&message);
}

#[test]
fn inclusion_fixture_passes_fan_and_drops_psu() {
    let subscriber = Arc::new(RecordingSubscriber::default());
    let filter = MessageFilter::Alert(fixture_rules("filters/alert_inclusion.json").resolve().unwrap());
    let (bus, consumer, watcher) = harness(filter, MessageParser::Alert, subscriber.clone(), AckPolicy::Always);

    deliver(&bus, &consumer, &watcher, &test_fixtures::load_fixture_str("alerts/fan_fault.json"));
    deliver(&bus, &consumer, &watcher, &test_fixtures::load_fixture_str("alerts/psu_fault.json"));

    assert_eq!(subscriber.resource_ids(), vec!["fan-0".to_string()]);
    let stats = watcher.stats();
    assert_eq!(stats.received, 2);
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.filtered, 1);
    assert_eq!(stats.acknowledged, 2);
    assert_eq!(consumer.in_flight(), 0);
}

#[test]
fn exclusion_fixture_drops_fan_and_passes_psu() {
    let subscriber = Arc::new(RecordingSubscriber::default());
    let filter = MessageFilter::Alert(fixture_rules("filters/alert_exclusion.json").resolve().unwrap());
    let (bus, consumer, watcher) = harness(filter, MessageParser::Alert, subscriber.clone(), AckPolicy::Always);

    deliver(&bus, &consumer, &watcher, &test_fixtures::load_fixture_str("alerts/fan_fault.json"));
    deliver(&bus, &consumer, &watcher, &test_fixtures::load_fixture_str("alerts/psu_fault.json"));

    assert_eq!(subscriber.resource_ids(), vec!["psu-1".to_string()]);
    let event = &subscriber.received()[0];
    assert_eq!(event.source, "hw");
    assert_eq!(event.event_type, "fault");
    assert_eq!(event.timestamp, "1700000005");
}

#[test]
fn poison_message_is_acknowledged_under_always() {
    let subscriber = Arc::new(RecordingSubscriber::default());
    let (bus, consumer, watcher) = harness(
        MessageFilter::Alert(FilterRules::default()),
        MessageParser::Alert,
        subscriber.clone(),
        AckPolicy::Always,
    );

    deliver(&bus, &consumer, &watcher, &test_fixtures::load_fixture_str("alerts/malformed.json"));

    assert!(subscriber.received().is_empty());
    assert_eq!(watcher.stats().failed, 1);
    assert_eq!(watcher.stats().acknowledged, 1);
    assert_eq!(consumer.in_flight(), 0);
    assert_eq!(bus.pending("alerts", "g"), 0);
}

#[test]
fn poison_message_is_redelivered_under_on_success() {
    let subscriber = Arc::new(RecordingSubscriber::default());
    let (bus, consumer, watcher) = harness(
        MessageFilter::Alert(FilterRules::default()),
        MessageParser::Alert,
        subscriber,
        AckPolicy::OnSuccess,
    );

    deliver(&bus, &consumer, &watcher, "not json at all");

    assert_eq!(watcher.stats().rejected, 1);
    assert_eq!(watcher.stats().acknowledged, 0);
    assert_eq!(bus.pending("alerts", "g"), 1);
    assert_eq!(consumer.receive(T).unwrap().unwrap().payload, "not json at all");
}

#[test]
fn subscriber_errors_follow_the_ack_policy() {
    let fan = test_fixtures::load_fixture_str("alerts/fan_fault.json");

    let failing = Arc::new(FailingSubscriber::default());
    let (bus, consumer, watcher) = harness(
        MessageFilter::Alert(FilterRules::default()),
        MessageParser::Alert,
        failing.clone(),
        AckPolicy::Always,
    );
    deliver(&bus, &consumer, &watcher, &fan);
    assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    assert_eq!(watcher.stats().acknowledged, 1);
    assert_eq!(bus.pending("alerts", "g"), 0);

    let (bus, consumer, watcher) = harness(
        MessageFilter::Alert(FilterRules::default()),
        MessageParser::Alert,
        Arc::new(FailingSubscriber::default()),
        AckPolicy::OnSuccess,
    );
    deliver(&bus, &consumer, &watcher, &fan);
    assert_eq!(watcher.stats().rejected, 1);
    assert_eq!(bus.pending("alerts", "g"), 1);
}

#[test]
fn panicking_subscriber_does_not_stop_the_watcher() {
    let subscriber = Arc::new(PanicOnceSubscriber::default());
    let (bus, consumer, watcher) = harness(
        MessageFilter::Alert(FilterRules::default()),
        MessageParser::Alert,
        subscriber.clone(),
        AckPolicy::Always,
    );

    deliver(&bus, &consumer, &watcher, &test_fixtures::load_fixture_str("alerts/fan_fault.json"));
    deliver(&bus, &consumer, &watcher, &test_fixtures::load_fixture_str("alerts/psu_fault.json"));

    assert_eq!(subscriber.inner.resource_ids(), vec!["psu-1".to_string()]);
    let stats = watcher.stats();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.acknowledged, 2);
}

#[test]
fn iem_node_status_resolves_host_to_node() {
    let store = HealthStore::in_memory();
    store.register_host("srv-2.example.com", "n2").unwrap();
    let subscriber = Arc::new(RecordingSubscriber::default());
    let mut pipeline = pipeline_config(AckPolicy::Always);
    pipeline.iem_filter = fixture_rules("filters/iem_components.json");
    let bus = InMemoryBus::new();
    let watcher = watcher(&bus, &store, &pipeline, "iem", MessageKind::Iem, subscriber.clone());

    let raw = test_fixtures::load_fixture_str("iem/node_offline.json");
    let message = ha_core::traits::Message { id: 1, topic: "iem".into(), payload: raw };
    assert_eq!(watcher.handle(&message).unwrap(), Handled::Processed);

    let event = &subscriber.received()[0];
    assert_eq!(event.source, "iem");
    assert_eq!(event.event_type, "offline");
    assert_eq!(event.resource_type, "node");
    assert_eq!(event.resource_id, "n2");
    assert_eq!(event.node_id, "n2");
    assert_eq!(event.host_id, "srv-2.example.com");
    assert_eq!(event.timestamp, "1700000100");
}

#[test]
fn iem_from_unmapped_host_is_a_parse_error() {
    let store = HealthStore::in_memory();
    let bus = InMemoryBus::new();
    let pipeline = pipeline_config(AckPolicy::Always);
    let watcher = watcher(
        &bus,
        &store,
        &pipeline,
        "iem",
        MessageKind::Iem,
        Arc::new(RecordingSubscriber::default()),
    );
    let message = ha_core::traits::Message {
        id: 1,
        topic: "iem".into(),
        payload: test_fixtures::load_fixture_str("iem/unknown_host.json"),
    };
    let err = watcher.handle(&message).unwrap_err();
    assert!(matches!(err, HaError::Pipeline(PipelineError::Parse { .. })), "{err}");
}

#[test]
fn spawned_watcher_consumes_until_stopped() {
    let bus = InMemoryBus::new();
    let store = HealthStore::in_memory();
    let subscriber = Arc::new(RecordingSubscriber::default());
    let pipeline = pipeline_config(AckPolicy::Always);
    let watcher = Arc::new(watcher(&bus, &store, &pipeline, "alerts", MessageKind::Alert, subscriber.clone()));
    assert_eq!(watcher.name(), "alerts/test_group");

    let handle = Arc::clone(&watcher).spawn().unwrap();
    bus.publish("alerts", &test_fixtures::load_fixture_str("alerts/fan_fault.json")).unwrap();
    assert!(wait_until(|| subscriber.received().len() == 1));

    watcher.stop(true);
    handle.join().unwrap();
    assert!(watcher.is_stopped());

    bus.publish("alerts", &test_fixtures::load_fixture_str("alerts/psu_fault.json")).unwrap();
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(subscriber.received().len(), 1);
}
