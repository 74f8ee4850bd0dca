//! # ha-pipeline
//!
//! The Event Analyzer: one [`Watcher`] per (topic, consumer group) pulls raw
//! messages off the bus, filters and parses them into canonical
//! [`HealthEvent`](ha_core::HealthEvent)s, and hands them to a
//! [`Subscriber`](ha_core::traits::Subscriber).

pub mod analyzer;
pub mod bus;
pub mod filter;
pub mod parser;
pub mod publisher;
pub mod stats;
pub mod watcher;

pub use analyzer::EventAnalyzer;
pub use bus::{InMemoryBus, InMemoryConsumer};
pub use filter::MessageFilter;
pub use parser::MessageParser;
pub use publisher::BusEventPublisher;
pub use stats::{PipelineStats, StatsSnapshot};
pub use watcher::{Handled, Watcher};
