//! Generation-id reconciliation for pod-monitor node events.
//!
//! A changed generation id means the monitored pod was replaced. If the new
//! generation reports online, the old one is failed first so consumers never
//! see the replacement as a plain recovery. A changed id arriving while the
//! `pod_restart` flag is still set is the late delivery of that failure.

use serde_json::Value;

use ha_core::constants::{
    event_types, ATTR_GENERATION_ID, ATTR_POD_RESTART, COMPONENT_NODE, GENERATION_ID_FIELD,
};
use ha_core::errors::{HaResult, HealthError};
use ha_core::models::{sources, EntityHealth, HealthEvent};
use ha_core::tracing::events;
use ha_core::traits::Expect;

use super::SystemHealth;
use crate::identity::EntityIdentity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Reconciliation {
    Proceed,
    /// Flag cleared; the event is fully consumed.
    Duplicate,
    Failover { old_generation: String },
}

impl SystemHealth {
    pub(super) fn reconcile_generation(&self, event: &HealthEvent) -> HaResult<Reconciliation> {
        let Some(incoming) = event.specific_str(GENERATION_ID_FIELD) else {
            return Ok(Reconciliation::Proceed);
        };
        let ctx = &self.ctx;
        let identity = EntityIdentity::for_event(&ctx.schema, &ctx.store, COMPONENT_NODE, event)?;
        let Some(raw) = ctx.store.get(&identity.key)? else {
            return Ok(Reconciliation::Proceed);
        };
        let health = EntityHealth::read(&identity.key, &raw)?;
        let Some(stored) = health.attribute_str(ATTR_GENERATION_ID) else {
            return Ok(Reconciliation::Proceed);
        };
        if stored == incoming {
            return Ok(Reconciliation::Proceed);
        }

        if event.event_type.eq_ignore_ascii_case(event_types::ONLINE) {
            events::generation_failover(&event.resource_id, stored, incoming);
            return Ok(Reconciliation::Failover {
                old_generation: stored.to_string(),
            });
        }
        if health.attribute_flag(ATTR_POD_RESTART) {
            self.clear_pod_restart(&identity)?;
            events::duplicate_restart(&event.resource_id, incoming);
            return Ok(Reconciliation::Duplicate);
        }
        Ok(Reconciliation::Proceed)
    }

    /// Reset the flag in place: no new event, no action change.
    fn clear_pod_restart(&self, identity: &EntityIdentity) -> HaResult<()> {
        let store = &self.ctx.store;
        let attempts = self.ctx.config.health.max_update_retries;
        for _ in 0..attempts {
            let Some(stored) = store.get_raw(&identity.key)? else {
                return Ok(());
            };
            let mut health = EntityHealth::read(&identity.key, &stored.value)?;
            if !health.attribute_flag(ATTR_POD_RESTART) {
                return Ok(());
            }
            health.set_attribute(ATTR_POD_RESTART, Value::Bool(false));
            match store.set_if(&identity.key, &health.write()?, Expect::Version(stored.version)) {
                Ok(_) => return Ok(()),
                Err(e) if e.is_version_conflict() => continue,
                Err(e) => return Err(e),
            }
        }
        Err(HealthError::RetriesExhausted {
            key: identity.key.clone(),
            attempts,
        }
        .into())
    }
}

/// The FAILED event standing in for the replaced generation.
pub(super) fn failover_event(event: &HealthEvent, old_generation: &str) -> HealthEvent {
    let mut synthetic = event.clone();
    synthetic.source = sources::HA.to_string();
    synthetic.event_id = uuid::Uuid::new_v4().to_string();
    synthetic.event_type = event_types::FAILED.to_string();
    synthetic.severity = "critical".to_string();
    synthetic.set_specific(GENERATION_ID_FIELD, Value::String(old_generation.to_string()));
    synthetic
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failover_event_carries_old_generation() {
        let mut incoming = HealthEvent {
            source: "monitor".into(),
            event_type: "online".into(),
            resource_type: "node".into(),
            resource_id: "n1".into(),
            ..Default::default()
        };
        incoming.set_specific(GENERATION_ID_FIELD, Value::String("g2".into()));
        let synthetic = failover_event(&incoming, "g1");
        assert_eq!(synthetic.event_type, "failed");
        assert_eq!(synthetic.source, "ha");
        assert_eq!(synthetic.specific_str(GENERATION_ID_FIELD), Some("g1"));
        assert_ne!(synthetic.event_id, incoming.event_id);
    }
}
