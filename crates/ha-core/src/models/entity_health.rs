//! EntityHealth: the persisted per-component health record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::HealthStatus;
use crate::errors::HealthError;

/// One entry of the bounded, newest-first history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEvent {
    pub event_timestamp: i64,
    pub created_timestamp: i64,
    pub status: HealthStatus,
    #[serde(default)]
    pub specific_info: Map<String, Value>,
}

/// Recovery-action bookkeeping for a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    Pending,
    Complete,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityAction {
    pub modified_timestamp: i64,
    pub status: ActionStatus,
}

impl Default for EntityAction {
    fn default() -> Self {
        Self {
            modified_timestamp: 0,
            status: ActionStatus::Pending,
        }
    }
}

/// Persisted health record for one component instance.
///
/// Serialized as `{events, action, attributes}`. Unknown top-level fields
/// are rejected on read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityHealth {
    pub events: Vec<EntityEvent>,
    pub action: EntityAction,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl EntityHealth {
    /// Prepend `event` and truncate the history to `max_len` entries.
    /// A `max_len` of zero is treated as one: the newest event is always kept.
    pub fn add_event(&mut self, event: EntityEvent, max_len: usize) {
        self.events.insert(0, event);
        self.events.truncate(max_len.max(1));
    }

    /// Mark the record's action as pending at `now`.
    pub fn set_action(&mut self, status: ActionStatus, now: i64) {
        self.action = EntityAction {
            modified_timestamp: now,
            status,
        };
    }

    pub fn latest(&self) -> Option<&EntityEvent> {
        self.events.first()
    }

    pub fn latest_status(&self) -> Option<HealthStatus> {
        self.latest().map(|e| e.status)
    }

    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn attribute_flag(&self, key: &str) -> bool {
        self.attributes
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn set_attribute(&mut self, key: &str, value: Value) {
        self.attributes.insert(key.to_string(), value);
    }

    /// Decode a stored record. `key` is only used for error context.
    pub fn read(key: &str, raw: &str) -> Result<Self, HealthError> {
        serde_json::from_str(raw).map_err(|e| HealthError::Deserialization {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// Encode the record in its canonical JSON form.
    pub fn write(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
