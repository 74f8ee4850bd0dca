use crate::errors::HaResult;
use crate::models::HealthEvent;

/// Outbound channel for health changes the rest of the cluster should see.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &HealthEvent) -> HaResult<()>;
}

/// Publisher that drops everything. Used when no outbound topic is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

impl EventPublisher for NullPublisher {
    fn publish(&self, _event: &HealthEvent) -> HaResult<()> {
        Ok(())
    }
}
