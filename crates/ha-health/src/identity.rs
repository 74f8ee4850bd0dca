//! Entity identity: component type plus the full id map that places one
//! instance in the hierarchy.

use std::collections::BTreeMap;

use ha_core::errors::{HaResult, HealthError};
use ha_core::models::health_event::ANCESTOR_ID_FIELDS;
use ha_core::models::HealthEvent;
use ha_store::{HealthStore, KeyTemplate};

use crate::schema::{ComponentLevel, HierarchySchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityIdentity {
    pub component: String,
    /// Values for every placeholder of the component's key template.
    pub ids: BTreeMap<String, String>,
    pub key: String,
}

impl EntityIdentity {
    /// Build from an id map. Ids outside the component's template are dropped;
    /// a missing one is an error.
    pub fn new(
        schema: &HierarchySchema,
        component: &str,
        ids: &BTreeMap<String, String>,
    ) -> HaResult<Self> {
        let level = schema.component(component)?;
        let ids = restrict(ids, level.template());
        let key = level
            .template()
            .resolve(&ids)
            .ok_or_else(|| missing(level, &ids))?;
        Ok(Self {
            component: component.to_string(),
            ids,
            key,
        })
    }

    /// Identify the instance an event is about.
    ///
    /// Ids come from the event's ancestor fields, then from same-named
    /// `specific_info` entries (`cvg_id` for disks). If the key is still
    /// incomplete, existing records are searched for a unique instance with
    /// this id under the known ancestors.
    pub fn for_event(
        schema: &HierarchySchema,
        store: &HealthStore,
        component: &str,
        event: &HealthEvent,
    ) -> HaResult<Self> {
        let level = schema.component(component)?;
        let own = level.id_placeholder().to_string();
        if event.resource_id.is_empty() {
            return Err(HealthError::MissingId {
                component: component.to_string(),
                placeholder: own,
            }
            .into());
        }

        let mut ids = event.ancestor_ids();
        ids.insert(own.clone(), event.resource_id.clone());
        for placeholder in level.template().placeholders() {
            if !ids.contains_key(placeholder) {
                if let Some(value) = event.specific_str(placeholder).filter(|v| !v.is_empty()) {
                    ids.insert(placeholder.to_string(), value.to_string());
                }
            }
        }
        let ids = restrict(&ids, level.template());

        if level.template().resolve(&ids).is_none() {
            if let Some(found) = locate(store, level.template(), &ids, &own)? {
                return Self::new(schema, component, &found);
            }
        }
        Self::new(schema, component, &ids)
    }

    /// This instance's own id.
    pub fn id(&self, schema: &HierarchySchema) -> &str {
        schema
            .component(&self.component)
            .ok()
            .and_then(|level| self.ids.get(level.id_placeholder()))
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Ids of the parent instance, cut to the parent template's placeholders.
    pub fn parent_ids(&self, parent: &ComponentLevel) -> BTreeMap<String, String> {
        restrict(&self.ids, parent.template())
    }
}

/// Place an id map onto an event: ancestor ids go to their wire fields, any
/// other placeholder (except `own`) goes to `specific_info`.
pub fn apply_ids(event: &mut HealthEvent, ids: &BTreeMap<String, String>, own: &str) {
    event.apply_ancestor_ids(ids);
    for (key, value) in ids {
        if key != own && !ANCESTOR_ID_FIELDS.contains(&key.as_str()) {
            event.set_specific(key, serde_json::Value::String(value.clone()));
        }
    }
}

fn restrict(ids: &BTreeMap<String, String>, template: &KeyTemplate) -> BTreeMap<String, String> {
    template
        .placeholders()
        .into_iter()
        .filter_map(|p| ids.get(p).map(|v| (p.to_string(), v.clone())))
        .collect()
}

fn missing(level: &ComponentLevel, ids: &BTreeMap<String, String>) -> HealthError {
    let placeholder = level
        .template()
        .placeholders()
        .into_iter()
        .find(|p| !ids.contains_key(*p))
        .unwrap_or_default()
        .to_string();
    HealthError::MissingId {
        component: level.name().to_string(),
        placeholder,
    }
}

/// Reverse key lookup: the first stored key of `template` whose own id and
/// known ids all match.
fn locate(
    store: &HealthStore,
    template: &KeyTemplate,
    known: &BTreeMap<String, String>,
    own: &str,
) -> HaResult<Option<BTreeMap<String, String>>> {
    let matches: Vec<BTreeMap<String, String>> = store
        .scan_template(template, known)?
        .into_iter()
        .map(|(captured, _, _)| captured)
        .filter(|captured| known.iter().all(|(k, v)| captured.get(k) == Some(v)))
        .collect();
    if matches.len() > 1 {
        tracing::warn!(
            template = %template,
            id = known.get(own).map(String::as_str).unwrap_or_default(),
            candidates = matches.len(),
            "ambiguous reverse key lookup; using the first match"
        );
    }
    Ok(matches.into_iter().next())
}
