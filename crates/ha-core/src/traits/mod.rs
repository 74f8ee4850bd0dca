//! Seam traits between the engine and its external collaborators.

pub mod action_handler;
pub mod kv_store;
pub mod message_bus;
pub mod publisher;
pub mod subscriber;

pub use action_handler::ActionHandler;
pub use kv_store::{Expect, KvStore, Versioned};
pub use message_bus::{Message, MessageBus, MessageConsumer, MessageProducer};
pub use publisher::{EventPublisher, NullPublisher};
pub use subscriber::Subscriber;
