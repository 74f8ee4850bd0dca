use std::sync::Arc;

use crate::errors::HaResult;
use crate::models::HealthEvent;

/// Single-capability consumer of canonical health events.
pub trait Subscriber: Send + Sync {
    fn process_event(&self, event: &HealthEvent) -> HaResult<()>;
}

impl<T: Subscriber + ?Sized> Subscriber for Arc<T> {
    fn process_event(&self, event: &HealthEvent) -> HaResult<()> {
        (**self).process_event(event)
    }
}
