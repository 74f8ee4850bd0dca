//! Message-bus abstraction. The broker protocol itself lives outside this system.

use std::time::Duration;

use crate::errors::HaResult;

/// One delivered message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Delivery id, unique per consumer.
    pub id: u64,
    pub topic: String,
    pub payload: String,
}

/// A consumer bound to one (topic, consumer group).
///
/// `stop` may be called from a different thread than the one blocked in
/// `receive`; after `stop`, `receive` returns `Ok(None)` within one poll
/// interval and keeps doing so.
pub trait MessageConsumer: Send + Sync {
    /// Block up to `timeout` for the next message.
    fn receive(&self, timeout: Duration) -> HaResult<Option<Message>>;

    /// Acknowledge a delivered message.
    fn ack(&self, message: &Message) -> HaResult<()>;

    /// Reject a delivered message so the broker redelivers it.
    fn nack(&self, message: &Message) -> HaResult<()>;

    /// Stop consuming. With `flush`, outstanding deliveries are acknowledged.
    fn stop(&self, flush: bool);

    fn is_stopped(&self) -> bool;
}

pub trait MessageProducer: Send + Sync {
    fn publish(&self, topic: &str, payload: &str) -> HaResult<()>;
}

/// Broker handle able to produce and to open consumers.
pub trait MessageBus: MessageProducer {
    fn consumer(&self, topic: &str, consumer_group: &str) -> HaResult<Box<dyn MessageConsumer>>;
}
