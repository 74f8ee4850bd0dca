//! # ha-monitor
//!
//! The Health Monitor: a [`Subscriber`](ha_core::traits::Subscriber) that looks
//! up recovery actions for each canonical event in a rule table kept in the
//! KV store, and hands matches to an external
//! [`ActionHandler`](ha_core::traits::ActionHandler) without blocking the
//! consumer that delivered the event.

pub mod dispatcher;
pub mod monitor;
pub mod rule_store;
pub mod service;

pub use dispatcher::{ActionDispatcher, DispatchStats};
pub use monitor::HealthMonitor;
pub use rule_store::RuleStore;
pub use service::HealthMonitorService;
