use std::collections::BTreeMap;

use ha_core::errors::{HaResult, HealthError};
use ha_core::models::{ComponentStatus, EntityHealth, HealthStatus, ResultStatus, StatusQueryResult};
use ha_core::tracing::spans;
use ha_core::traits::Versioned;

use super::SystemHealth;
use crate::schema::{ComponentLevel, HierarchySchema};

type Ids = BTreeMap<String, String>;

/// One read of the keyspace under the queried component.
struct Snapshot<'a> {
    schema: &'a HierarchySchema,
    entries: Vec<(String, Versioned)>,
}

impl Snapshot<'_> {
    /// Stored instances of `level` whose ids agree with `within`.
    fn instances(&self, level: &ComponentLevel, within: &Ids) -> HaResult<Vec<(Ids, EntityHealth)>> {
        let mut found = Vec::new();
        for (key, stored) in &self.entries {
            let Some(ids) = level.template().capture(key) else {
                continue;
            };
            if within.iter().all(|(k, v)| ids.get(k) == Some(v)) {
                found.push((ids, EntityHealth::read(key, &stored.value)?));
            }
        }
        Ok(found)
    }

    fn build(
        &self,
        level: &ComponentLevel,
        ids: Ids,
        health: &EntityHealth,
        end: usize,
        partial: &mut bool,
    ) -> HaResult<ComponentStatus> {
        let mut node = ComponentStatus {
            component_type: level.name().to_string(),
            id: ids.get(level.id_placeholder()).cloned().unwrap_or_default(),
            status: health.latest_status().unwrap_or(HealthStatus::Unknown),
            last_changed: health.latest().map_or(0, |e| e.event_timestamp),
            children: Vec::new(),
        };
        if level.level() >= end || level.children().is_empty() {
            return Ok(node);
        }
        for child_name in level.children() {
            let child = self.schema.component(child_name)?;
            for (child_ids, child_health) in self.instances(child, &ids)? {
                node.children
                    .push(self.build(child, child_ids, &child_health, end, partial)?);
            }
        }
        if node.children.is_empty() {
            *partial = true;
        }
        Ok(node)
    }
}

impl SystemHealth {
    /// Status tree rooted at every instance of `component` (or the one with
    /// `id`), `depth` levels deep; `depth == 0` walks to the bottom.
    ///
    /// Never returns an error: failures come back as a `Failed` result.
    pub fn get_status(&self, component: &str, depth: usize, id: Option<&str>) -> StatusQueryResult {
        let _span = spans::get_status_span(component, depth).entered();
        match self.try_get_status(component, depth, id) {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(component = %component, error = %e, "status query failed");
                StatusQueryResult::failed(e.to_string())
            }
        }
    }

    fn try_get_status(
        &self,
        component: &str,
        depth: usize,
        id: Option<&str>,
    ) -> HaResult<StatusQueryResult> {
        let schema = &self.ctx.schema;
        let start = schema.component(component)?;
        let bottom = schema.total_depth() - 1;
        let end = match depth {
            0 => bottom,
            d => start.level().saturating_add(d - 1).min(bottom),
        };

        let scan_prefix = start.template().substitute(&Ids::new());
        let snapshot = Snapshot {
            schema,
            entries: self.ctx.store.scan(&scan_prefix)?,
        };

        let mut partial = false;
        let mut output = Vec::new();
        for (ids, health) in snapshot.instances(start, &Ids::new())? {
            if let Some(wanted) = id {
                if ids.get(start.id_placeholder()).map(String::as_str) != Some(wanted) {
                    continue;
                }
            }
            output.push(snapshot.build(start, ids, &health, end, &mut partial)?);
        }

        if let Some(wanted) = id {
            if output.is_empty() {
                let err = HealthError::InvalidId {
                    component: component.to_string(),
                    id: wanted.to_string(),
                };
                return Ok(StatusQueryResult::failed(err.to_string()));
            }
        }

        Ok(StatusQueryResult {
            status: if partial {
                ResultStatus::Partial
            } else {
                ResultStatus::Succeeded
            },
            output,
            error: None,
        })
    }
}
