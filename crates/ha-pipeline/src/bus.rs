//! InMemoryBus: in-process topics with consumer-group semantics.
//!
//! Every consumer group on a topic sees every message; consumers within one
//! group share the group's queue. A group created after messages were
//! published starts from the oldest message still in the topic's replay log,
//! which keeps only the newest `replay_capacity` payloads. Unacknowledged
//! deliveries are requeued on `nack` or on `stop(false)`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use dashmap::DashMap;

use ha_core::config::{defaults, PipelineConfig};
use ha_core::errors::{HaResult, PipelineError};
use ha_core::traits::{Message, MessageBus, MessageConsumer, MessageProducer};

#[derive(Clone)]
struct GroupQueue {
    tx: Sender<Message>,
    rx: Receiver<Message>,
}

#[derive(Default)]
struct Topic {
    log: VecDeque<String>,
    published: usize,
    groups: HashMap<String, GroupQueue>,
}

impl Topic {
    fn retain(&mut self, payload: &str, capacity: usize) {
        self.published += 1;
        if capacity == 0 {
            return;
        }
        if self.log.len() == capacity {
            self.log.pop_front();
        }
        self.log.push_back(payload.to_string());
    }
}

struct BusInner {
    topics: DashMap<String, Topic>,
    next_id: AtomicU64,
    replay_capacity: usize,
}

impl BusInner {
    fn delivery(&self, topic: &str, payload: &str) -> Message {
        Message {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            topic: topic.to_string(),
            payload: payload.to_string(),
        }
    }
}

/// Cloneable handle; clones share the same topics.
#[derive(Clone)]
pub struct InMemoryBus {
    inner: Arc<BusInner>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::with_replay_capacity(defaults::DEFAULT_REPLAY_CAPACITY)
    }

    pub fn with_replay_capacity(replay_capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                topics: DashMap::new(),
                next_id: AtomicU64::new(0),
                replay_capacity,
            }),
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::with_replay_capacity(config.replay_capacity)
    }

    /// Messages waiting in a group's queue (not counting in-flight ones).
    pub fn pending(&self, topic: &str, consumer_group: &str) -> usize {
        self.inner
            .topics
            .get(topic)
            .and_then(|t| t.groups.get(consumer_group).map(|g| g.rx.len()))
            .unwrap_or(0)
    }

    /// Total messages ever published on `topic`, including ones no longer
    /// in the replay log.
    pub fn published(&self, topic: &str) -> usize {
        self.inner.topics.get(topic).map_or(0, |t| t.published)
    }

    /// Payloads still in `topic`'s replay log, oldest first.
    pub fn payloads(&self, topic: &str) -> Vec<String> {
        self.inner
            .topics
            .get(topic)
            .map(|t| t.log.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Open a consumer with the concrete type (tests reach its in-flight count).
    pub fn open_consumer(&self, topic: &str, consumer_group: &str) -> InMemoryConsumer {
        let mut entry = self.inner.topics.entry(topic.to_string()).or_default();
        let topic_state = entry.value_mut();
        let queue = match topic_state.groups.get(consumer_group) {
            Some(queue) => queue.clone(),
            None => {
                let (tx, rx) = unbounded();
                for payload in &topic_state.log {
                    // The receiver is held in `queue`, so the send cannot fail.
                    let _ = tx.send(self.inner.delivery(topic, payload));
                }
                let queue = GroupQueue { tx, rx };
                topic_state
                    .groups
                    .insert(consumer_group.to_string(), queue.clone());
                queue
            }
        };
        InMemoryConsumer {
            topic: topic.to_string(),
            consumer_group: consumer_group.to_string(),
            queue,
            in_flight: DashMap::new(),
            stopped: AtomicBool::new(false),
        }
    }
}

impl Default for InMemoryBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProducer for InMemoryBus {
    fn publish(&self, topic: &str, payload: &str) -> HaResult<()> {
        let mut entry = self.inner.topics.entry(topic.to_string()).or_default();
        let topic_state = entry.value_mut();
        topic_state.retain(payload, self.inner.replay_capacity);
        for (group, queue) in &topic_state.groups {
            queue
                .tx
                .send(self.inner.delivery(topic, payload))
                .map_err(|e| PipelineError::Bus {
                    message: format!("group {group} on {topic}: {e}"),
                })?;
        }
        Ok(())
    }
}

impl MessageBus for InMemoryBus {
    fn consumer(&self, topic: &str, consumer_group: &str) -> HaResult<Box<dyn MessageConsumer>> {
        Ok(Box::new(self.open_consumer(topic, consumer_group)))
    }
}

pub struct InMemoryConsumer {
    topic: String,
    consumer_group: String,
    queue: GroupQueue,
    in_flight: DashMap<u64, Message>,
    stopped: AtomicBool,
}

impl InMemoryConsumer {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn consumer_group(&self) -> &str {
        &self.consumer_group
    }

    /// Delivered but neither acked nor nacked.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn requeue(&self, message: Message) -> HaResult<()> {
        self.queue.tx.send(message).map_err(|e| {
            PipelineError::Bus {
                message: format!("requeue on {}: {e}", self.topic),
            }
            .into()
        })
    }
}

impl MessageConsumer for InMemoryConsumer {
    fn receive(&self, timeout: Duration) -> HaResult<Option<Message>> {
        if self.is_stopped() {
            return Ok(None);
        }
        match self.queue.rx.recv_timeout(timeout) {
            Ok(message) => {
                // A stop that raced the receive leaves the message for the group.
                if self.is_stopped() {
                    self.requeue(message)?;
                    return Ok(None);
                }
                self.in_flight.insert(message.id, message.clone());
                Ok(Some(message))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(PipelineError::Bus {
                message: format!("{}/{} disconnected", self.topic, self.consumer_group),
            }
            .into()),
        }
    }

    fn ack(&self, message: &Message) -> HaResult<()> {
        self.in_flight.remove(&message.id);
        Ok(())
    }

    fn nack(&self, message: &Message) -> HaResult<()> {
        match self.in_flight.remove(&message.id) {
            Some((_, message)) => self.requeue(message),
            None => Ok(()),
        }
    }

    fn stop(&self, flush: bool) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        let ids: Vec<u64> = self.in_flight.iter().map(|e| *e.key()).collect();
        for id in ids {
            let Some((_, message)) = self.in_flight.remove(&id) else {
                continue;
            };
            if !flush {
                if let Err(e) = self.requeue(message) {
                    tracing::warn!(topic = %self.topic, error = %e, "in-flight message lost on stop");
                }
            }
        }
        tracing::debug!(topic = %self.topic, group = %self.consumer_group, flush, "consumer stopped");
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}
