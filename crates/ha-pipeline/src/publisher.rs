//! Publishes health changes back onto the bus as canonical events.

use std::sync::Arc;

use ha_core::errors::HaResult;
use ha_core::models::HealthEvent;
use ha_core::traits::{EventPublisher, MessageProducer};

#[derive(Clone)]
pub struct BusEventPublisher {
    producer: Arc<dyn MessageProducer>,
    topic: String,
}

impl BusEventPublisher {
    pub fn new(producer: Arc<dyn MessageProducer>, topic: impl Into<String>) -> Self {
        Self {
            producer,
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl EventPublisher for BusEventPublisher {
    fn publish(&self, event: &HealthEvent) -> HaResult<()> {
        self.producer.publish(&self.topic, &event.to_json()?)
    }
}
