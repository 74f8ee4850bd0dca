//! Configuration system for the HA control plane.
//! TOML-based, 3-layer resolution: env > config file > defaults.

pub mod defaults;
pub mod ha_config;
pub mod health_config;
pub mod monitor_config;
pub mod observability_config;
pub mod pipeline_config;
pub mod store_config;

pub use ha_config::HaConfig;
pub use health_config::HealthConfig;
pub use monitor_config::{MonitorConfig, RuleConfig};
pub use observability_config::ObservabilityConfig;
pub use pipeline_config::{AckPolicy, FilterMode, FilterRules, MessageKind, PipelineConfig, WatcherConfig};
pub use store_config::{StoreBackend, StoreConfig};
