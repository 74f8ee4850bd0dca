use crate::errors::HaResult;
use crate::models::HealthEvent;

/// External executor of recovery actions selected by the Health Monitor.
pub trait ActionHandler: Send + Sync {
    fn handle(&self, event: &HealthEvent, actions: &[String]) -> HaResult<()>;
}
