//! # ha-core
//!
//! Foundation crate for the cluster HA control plane.
//! Defines the canonical event and health models, the seam traits
//! (KV store, message bus, subscriber, publisher, action handler),
//! errors, config, constants, and tracing setup.
//! Every other crate in the workspace depends on this.

pub mod config;
pub mod constants;
pub mod errors;
pub mod models;
pub mod tracing;
pub mod traits;

// Re-export the most commonly used types at the crate root.
pub use config::HaConfig;
pub use errors::{HaError, HaResult};
pub use models::{EntityHealth, HealthEvent, HealthStatus};
