//! Error handling for the HA control plane.
//! One error enum per subsystem, `thiserror` only, aggregated by [`HaError`].

pub mod config_error;
pub mod error_code;
pub mod ha_error;
pub mod health_error;
pub mod monitor_error;
pub mod pipeline_error;
pub mod schema_error;
pub mod store_error;

pub use config_error::ConfigError;
pub use error_code::HaErrorCode;
pub use ha_error::{HaError, HaResult};
pub use health_error::HealthError;
pub use monitor_error::MonitorError;
pub use pipeline_error::PipelineError;
pub use schema_error::SchemaError;
pub use store_error::StoreError;
