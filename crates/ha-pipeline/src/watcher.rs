//! Watcher: the consumer loop for one (topic, consumer group).
//!
//! Nothing a single message does can stop the loop: errors and panics are
//! caught per message and logged, then the ack policy decides whether the
//! message is acknowledged or handed back for redelivery.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ha_core::config::{AckPolicy, PipelineConfig, WatcherConfig};
use ha_core::errors::HaResult;
use ha_core::tracing::{events, spans};
use ha_core::traits::{Message, MessageBus, MessageConsumer, Subscriber};
use ha_store::HealthStore;

use crate::filter::MessageFilter;
use crate::parser::MessageParser;
use crate::stats::{PipelineStats, StatsSnapshot};

/// What happened to a message that was handled without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    Processed,
    Filtered,
}

pub struct Watcher {
    name: String,
    consumer: Arc<dyn MessageConsumer>,
    filter: MessageFilter,
    parser: MessageParser,
    subscriber: Arc<dyn Subscriber>,
    ack_policy: AckPolicy,
    poll_interval: Duration,
    stats: PipelineStats,
}

impl Watcher {
    pub fn new(
        name: impl Into<String>,
        consumer: Arc<dyn MessageConsumer>,
        filter: MessageFilter,
        parser: MessageParser,
        subscriber: Arc<dyn Subscriber>,
        ack_policy: AckPolicy,
        poll_interval: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            consumer,
            filter,
            parser,
            subscriber,
            ack_policy,
            poll_interval,
            stats: PipelineStats::default(),
        }
    }

    /// Open a consumer for `watcher` and pick the filter and parser of its kind.
    pub fn from_config(
        watcher: &WatcherConfig,
        pipeline: &PipelineConfig,
        bus: &dyn MessageBus,
        store: &HealthStore,
        subscriber: Arc<dyn Subscriber>,
    ) -> HaResult<Self> {
        let consumer: Arc<dyn MessageConsumer> =
            Arc::from(bus.consumer(&watcher.message_type, &watcher.consumer_group)?);
        Ok(Self::new(
            format!("{}/{}", watcher.message_type, watcher.consumer_group),
            consumer,
            MessageFilter::for_kind(watcher.kind, pipeline)?,
            MessageParser::for_kind(watcher.kind, store),
            subscriber,
            pipeline.ack_policy,
            Duration::from_millis(pipeline.poll_interval_ms),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Filter, parse, and deliver one message. Errors are returned as-is.
    pub fn handle(&self, message: &Message) -> HaResult<Handled> {
        if !self.filter.filter_event(&message.payload)? {
            return Ok(Handled::Filtered);
        }
        let event = self.parser.parse_event(&message.payload)?;
        self.subscriber.process_event(&event)?;
        Ok(Handled::Processed)
    }

    /// Handle one message with errors and panics contained, then ack or nack.
    pub fn process_message(&self, message: &Message) {
        self.stats.record_received();
        events::event_received(&self.name, message.id);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handle(message)));
        let succeeded = match outcome {
            Ok(Ok(Handled::Processed)) => {
                self.stats.record_processed();
                true
            }
            Ok(Ok(Handled::Filtered)) => {
                self.stats.record_filtered();
                events::event_filtered_out(&self.name, message.id);
                true
            }
            Ok(Err(e)) => {
                self.stats.record_failed();
                events::watcher_error(&self.name, message.id, &e.to_string());
                false
            }
            Err(payload) => {
                self.stats.record_failed();
                events::watcher_error(&self.name, message.id, &panic_message(payload.as_ref()));
                false
            }
        };

        if succeeded || self.ack_policy == AckPolicy::Always {
            match self.consumer.ack(message) {
                Ok(()) => self.stats.record_acknowledged(),
                Err(e) => tracing::warn!(watcher = %self.name, message_id = message.id, error = %e, "ack failed"),
            }
        } else {
            match self.consumer.nack(message) {
                Ok(()) => self.stats.record_rejected(),
                Err(e) => tracing::warn!(watcher = %self.name, message_id = message.id, error = %e, "nack failed"),
            }
        }
    }

    /// Block in the receive loop until the consumer is stopped.
    pub fn run(&self) {
        let _span = spans::watcher_span(&self.name).entered();
        tracing::info!(watcher = %self.name, "watcher started");
        while !self.consumer.is_stopped() {
            match self.consumer.receive(self.poll_interval) {
                Ok(Some(message)) => self.process_message(&message),
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(watcher = %self.name, error = %e, "receive failed");
                    thread::sleep(self.poll_interval);
                }
            }
        }
        tracing::info!(watcher = %self.name, "watcher stopped");
    }

    /// Run the loop on a named thread.
    pub fn spawn(self: Arc<Self>) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name(format!("watcher-{}", self.name))
            .spawn(move || self.run())
    }

    /// Stop the consumer; safe to call from any thread while `run` is active.
    pub fn stop(&self, flush: bool) {
        self.consumer.stop(flush);
    }

    pub fn is_stopped(&self) -> bool {
        self.consumer.is_stopped()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic".to_string()
    }
}
