//! SystemHealth: the event state machine and the hierarchical status query.
//!
//! `process_event` maps, reconciles, stores, and then walks up the hierarchy
//! one level at a time, re-deriving each parent from its children's current
//! state. Every entity write is an optimistic compare-and-set bounded by
//! `health.max_update_retries`.

mod generation;
mod query;
mod update;

use std::collections::BTreeMap;
use std::sync::Arc;

use ha_core::constants::{COMPONENT_NODE, GENERATION_ID_FIELD};
use ha_core::errors::HaResult;
use ha_core::models::{sources, EntityHealth, HealthEvent};
use ha_core::traits::Subscriber;

use crate::context::HaContext;
use crate::identity::EntityIdentity;
use generation::{failover_event, Reconciliation};
use update::AttributeUpdate;

pub use update::UpdateOutcome;

#[derive(Debug, Clone)]
pub struct SystemHealth {
    ctx: Arc<HaContext>,
}

impl SystemHealth {
    pub fn new(ctx: Arc<HaContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &Arc<HaContext> {
        &self.ctx
    }

    /// Apply one canonical event and propagate it to the top of the hierarchy.
    pub fn process_event(&self, event: &HealthEvent) -> HaResult<()> {
        let component = self
            .ctx
            .resolver
            .resolve(&event.resource_type, &self.ctx.schema)?;

        let mut attrs = AttributeUpdate::default();
        if component == COMPONENT_NODE && event.source == sources::MONITOR {
            match self.reconcile_generation(event)? {
                Reconciliation::Proceed => {}
                Reconciliation::Duplicate => return Ok(()),
                Reconciliation::Failover { old_generation } => {
                    let synthetic = failover_event(event, &old_generation);
                    self.run_chain(
                        synthetic,
                        AttributeUpdate {
                            generation: Some(old_generation),
                            pod_restart: Some(true),
                        },
                    )?;
                    attrs.pod_restart = Some(true);
                }
            }
            attrs.generation = event.specific_str(GENERATION_ID_FIELD).map(str::to_string);
        }

        self.run_chain(event.clone(), attrs)
    }

    /// Current stored record of one instance.
    pub fn entity_health(
        &self,
        component: &str,
        ids: &BTreeMap<String, String>,
    ) -> HaResult<Option<EntityHealth>> {
        let identity = EntityIdentity::new(&self.ctx.schema, component, ids)?;
        match self.ctx.store.get(&identity.key)? {
            Some(raw) => Ok(Some(EntityHealth::read(&identity.key, &raw)?)),
            None => Ok(None),
        }
    }

    /// Delete one instance's record. Descendants are left in place.
    pub fn remove_entity(&self, component: &str, ids: &BTreeMap<String, String>) -> HaResult<bool> {
        let identity = EntityIdentity::new(&self.ctx.schema, component, ids)?;
        let removed = self.ctx.store.delete(&identity.key)?;
        if removed {
            tracing::info!(component = %component, key = %identity.key, "entity health removed");
        }
        Ok(removed)
    }
}

impl Subscriber for SystemHealth {
    fn process_event(&self, event: &HealthEvent) -> HaResult<()> {
        SystemHealth::process_event(self, event)
    }
}
