//! Canonical models shared by every subsystem.

pub mod entity_health;
pub mod health_event;
pub mod rule;
pub mod status;
pub mod status_query;

pub use entity_health::{ActionStatus, EntityAction, EntityEvent, EntityHealth};
pub use health_event::{sources, HealthEvent};
pub use rule::{RuleAdminResult, RuleKey};
pub use status::HealthStatus;
pub use status_query::{ComponentStatus, ResultStatus, StatusQueryResult};
