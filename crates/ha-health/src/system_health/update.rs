use chrono::Utc;
use serde_json::Value;

use ha_core::constants::{ATTR_GENERATION_ID, ATTR_POD_RESTART, COMPONENT_NODE};
use ha_core::errors::{HaResult, HealthError};
use ha_core::models::{ActionStatus, EntityEvent, EntityHealth, HealthEvent, HealthStatus};
use ha_core::tracing::{events, spans};
use ha_core::traits::Expect;

use super::SystemHealth;
use crate::identity::EntityIdentity;

/// Result of one entity update attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Suppressed: nothing written.
    Ignored,
    /// First record for this identity.
    Created,
    /// An existing record was replaced.
    Updated { previous: Option<HealthStatus> },
}

/// Attribute changes carried along with an event write.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeUpdate {
    pub generation: Option<String>,
    pub pod_restart: Option<bool>,
}

impl AttributeUpdate {
    fn apply(&self, health: &mut EntityHealth) {
        if let Some(generation) = &self.generation {
            health.set_attribute(ATTR_GENERATION_ID, Value::String(generation.clone()));
        }
        if let Some(flag) = self.pod_restart {
            health.set_attribute(ATTR_POD_RESTART, Value::Bool(flag));
        }
    }
}

/// Why an update with `incoming` over `previous` is suppressed, if it is.
pub(crate) fn suppression_reason(
    component: &str,
    previous: Option<HealthStatus>,
    incoming: HealthStatus,
) -> Option<&'static str> {
    match previous {
        Some(p) if p == incoming => Some("status unchanged"),
        Some(HealthStatus::Offline)
            if component == COMPONENT_NODE && incoming == HealthStatus::Failed =>
        {
            Some("offline node is not marked failed")
        }
        _ => None,
    }
}

impl SystemHealth {
    /// Process `event` and each derived parent event in turn. `attrs` only
    /// applies to the first write.
    pub(super) fn run_chain(&self, event: HealthEvent, attrs: AttributeUpdate) -> HaResult<()> {
        let mut next = Some((event, attrs));
        while let Some((event, attrs)) = next.take() {
            next = self
                .apply(&event, &attrs)?
                .map(|parent| (parent, AttributeUpdate::default()));
        }
        Ok(())
    }

    /// One level: map, store, publish, and derive the parent's event.
    fn apply(&self, event: &HealthEvent, attrs: &AttributeUpdate) -> HaResult<Option<HealthEvent>> {
        let ctx = &self.ctx;
        let component = ctx.resolver.resolve(&event.resource_type, &ctx.schema)?;
        let _span =
            spans::process_event_span(&component, &event.resource_id, &event.event_type).entered();

        let status = ctx.mapper.map(event, &component)?;
        let identity = EntityIdentity::for_event(&ctx.schema, &ctx.store, &component, event)?;
        let id = identity.id(&ctx.schema).to_string();

        match self.update_entity(&identity, status, event, attrs)? {
            UpdateOutcome::Ignored => return Ok(None),
            UpdateOutcome::Created => {
                events::health_updated(&component, &id, None, status.as_str());
            }
            UpdateOutcome::Updated { previous } => {
                events::health_updated(&component, &id, previous.map(|p| p.as_str()), status.as_str());
                match ctx.publisher().publish(event) {
                    Ok(()) => events::event_published(&component, &id, &event.event_type),
                    Err(e) => tracing::warn!(
                        component = %component,
                        id = %id,
                        error = %e,
                        "health change could not be published"
                    ),
                }
            }
        }

        let Some(parent) = ctx.schema.parent(&component) else {
            return Ok(None);
        };
        let evaluator = ctx.evaluators.get(parent)?;
        evaluator
            .evaluate(&ctx.store, &ctx.schema, event, &identity)
            .map(Some)
    }

    /// Prepend the event to the identity's record under compare-and-set,
    /// re-reading and retrying on conflicting writers.
    pub(crate) fn update_entity(
        &self,
        identity: &EntityIdentity,
        status: HealthStatus,
        event: &HealthEvent,
        attrs: &AttributeUpdate,
    ) -> HaResult<UpdateOutcome> {
        let config = &self.ctx.config.health;
        let store = &self.ctx.store;

        for attempt in 1..=config.max_update_retries {
            let current = store.get_raw(&identity.key)?;
            let (mut health, expect) = match &current {
                Some(stored) => (
                    EntityHealth::read(&identity.key, &stored.value)?,
                    Expect::Version(stored.version),
                ),
                None => (EntityHealth::default(), Expect::Absent),
            };

            let previous = health.latest_status();
            if let Some(reason) = suppression_reason(&identity.component, previous, status) {
                events::event_ignored(
                    &identity.component,
                    identity.id(&self.ctx.schema),
                    status.as_str(),
                    reason,
                );
                return Ok(UpdateOutcome::Ignored);
            }

            let now = Utc::now().timestamp();
            let event_timestamp = match event.timestamp_secs() {
                0 => now,
                ts => ts,
            };
            health.add_event(
                EntityEvent {
                    event_timestamp,
                    created_timestamp: now,
                    status,
                    specific_info: event.specific_info.clone().unwrap_or_default(),
                },
                config.max_history,
            );
            health.set_action(ActionStatus::Pending, now);
            attrs.apply(&mut health);

            match store.set_if(&identity.key, &health.write()?, expect) {
                Ok(_) if current.is_some() => return Ok(UpdateOutcome::Updated { previous }),
                Ok(_) => return Ok(UpdateOutcome::Created),
                Err(e) if e.is_version_conflict() => {
                    tracing::debug!(key = %identity.key, attempt, "concurrent update; retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(HealthError::RetriesExhausted {
            key: identity.key.clone(),
            attempts: config.max_update_retries,
        }
        .into())
    }
}
