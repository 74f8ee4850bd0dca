//! Tracing setup, span names, and structured log events.

pub mod events;
pub mod setup;
pub mod spans;

pub use setup::{init_tracing, init_tracing_with_config};
