use ha_core::constants::event_types;
use ha_core::errors::{HaResult, HealthError};
use ha_core::models::{sources, EntityHealth, HealthEvent};
use ha_core::tracing::{events, spans};
use ha_store::HealthStore;
use serde_json::{json, Map};

use super::quorum::{rollup_event_type, ChildTally};
use crate::identity::{apply_ids, EntityIdentity};
use crate::schema::HierarchySchema;

/// Rollup for one parent level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHealthEvaluator {
    component: String,
    fallback: String,
}

impl ElementHealthEvaluator {
    pub fn new(component: impl Into<String>, fallback: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            fallback: fallback.into(),
        }
    }

    /// The parent level this evaluator derives events for.
    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// Derive the parent's event after `child` changed.
    ///
    /// Every child of the parent, across all of its child component types,
    /// is re-read from the store; a sibling without health, or a child that
    /// cannot be found among them, fails the rollup.
    pub fn evaluate(
        &self,
        store: &HealthStore,
        schema: &HierarchySchema,
        child_event: &HealthEvent,
        child: &EntityIdentity,
    ) -> HaResult<HealthEvent> {
        let parent = schema.component(&self.component)?;
        let parent_ids = child.parent_ids(parent);
        let parent_id = parent_ids
            .get(parent.id_placeholder())
            .cloned()
            .ok_or_else(|| HealthError::MissingId {
                component: self.component.clone(),
                placeholder: parent.id_placeholder().to_string(),
            })?;
        let _span = spans::rollup_span(&self.component, &parent_id).entered();

        let mut tally = ChildTally::default();
        let mut saw_child = false;
        for child_type in schema.next(&self.component) {
            let level = schema.component(child_type)?;
            for (captured, key, stored) in store.scan_template(level.template(), &parent_ids)? {
                let health = EntityHealth::read(&key, &stored.value)?;
                let status = health.latest_status().ok_or_else(|| HealthError::HealthNotFound {
                    component: child_type.clone(),
                    id: captured
                        .get(level.id_placeholder())
                        .cloned()
                        .unwrap_or_default(),
                })?;
                saw_child |= key == child.key;
                tally.record(status);
            }
        }
        if !saw_child {
            return Err(HealthError::HealthNotFound {
                component: child.component.clone(),
                id: child.id(schema).to_string(),
            }
            .into());
        }

        let event_type = rollup_event_type(&tally, &self.fallback);
        events::rollup_derived(&self.component, &parent_id, event_type, tally.online, tally.total);

        let mut info = Map::new();
        info.insert(
            "derived_from".to_string(),
            json!(format!("{}/{}", child.component, child.id(schema))),
        );
        info.insert("online".to_string(), json!(tally.online));
        info.insert("total".to_string(), json!(tally.total));

        let mut event = HealthEvent {
            source: sources::HA.to_string(),
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.to_string(),
            severity: severity(event_type).to_string(),
            resource_type: self.component.clone(),
            resource_id: parent_id,
            timestamp: child_event.timestamp.clone(),
            specific_info: Some(info),
            ..Default::default()
        };
        apply_ids(&mut event, &parent_ids, parent.id_placeholder());
        Ok(event)
    }
}

fn severity(event_type: &str) -> &'static str {
    match event_type {
        event_types::FAULT_RESOLVED => "informational",
        event_types::FAILED | event_types::FAULT => "critical",
        _ => "warning",
    }
}
