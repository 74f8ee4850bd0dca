#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ha_core::config::{AckPolicy, FilterRules, MessageKind, PipelineConfig, WatcherConfig};
use ha_core::errors::{HaResult, HealthError};
use ha_core::models::HealthEvent;
use ha_core::traits::{MessageBus, Subscriber};
use ha_pipeline::{InMemoryBus, Watcher};
use ha_store::HealthStore;

/// Subscriber that keeps every event it is handed.
#[derive(Default)]
pub struct RecordingSubscriber {
    pub events: Mutex<Vec<HealthEvent>>,
}

impl RecordingSubscriber {
    pub fn received(&self) -> Vec<HealthEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn resource_ids(&self) -> Vec<String> {
        self.received().into_iter().map(|e| e.resource_id).collect()
    }
}

impl Subscriber for RecordingSubscriber {
    fn process_event(&self, event: &HealthEvent) -> HaResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Fails every event with a health error.
#[derive(Default)]
pub struct FailingSubscriber {
    pub calls: AtomicUsize,
}

impl Subscriber for FailingSubscriber {
    fn process_event(&self, event: &HealthEvent) -> HaResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(HealthError::UnknownEventType {
            event_type: event.event_type.clone(),
        }
        .into())
    }
}

/// Panics on the first call, records afterwards.
#[derive(Default)]
pub struct PanicOnceSubscriber {
    pub calls: AtomicUsize,
    pub inner: RecordingSubscriber,
}

impl Subscriber for PanicOnceSubscriber {
    fn process_event(&self, event: &HealthEvent) -> HaResult<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("subscriber exploded on {}", event.resource_id);
        }
        self.inner.process_event(event)
    }
}

pub fn pipeline_config(ack_policy: AckPolicy) -> PipelineConfig {
    PipelineConfig {
        ack_policy,
        poll_interval_ms: 10,
        ..Default::default()
    }
}

pub fn watcher_config(topic: &str, kind: MessageKind) -> WatcherConfig {
    WatcherConfig {
        message_type: topic.to_string(),
        consumer_group: "test_group".to_string(),
        kind,
    }
}

/// Rules loaded from a filter fixture file.
pub fn fixture_rules(name: &str) -> FilterRules {
    FilterRules {
        rules_path: Some(test_fixtures::fixture_path(name).to_string_lossy().into_owned()),
        ..Default::default()
    }
}

pub fn watcher(
    bus: &InMemoryBus,
    store: &HealthStore,
    pipeline: &PipelineConfig,
    topic: &str,
    kind: MessageKind,
    subscriber: Arc<dyn Subscriber>,
) -> Watcher {
    let bus: &dyn MessageBus = bus;
    Watcher::from_config(&watcher_config(topic, kind), pipeline, bus, store, subscriber).unwrap()
}

/// Poll `check` until it holds or five seconds pass.
pub fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    check()
}
