use serde::{Deserialize, Serialize};

use super::HealthStatus;

/// Outcome of an operator-facing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultStatus {
    Succeeded,
    Failed,
    Partial,
}

/// One node of a hierarchical status answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStatus {
    #[serde(rename = "type")]
    pub component_type: String,
    pub id: String,
    pub status: HealthStatus,
    #[serde(rename = "lastChanged")]
    pub last_changed: i64,
    #[serde(default)]
    pub children: Vec<ComponentStatus>,
}

impl ComponentStatus {
    /// Depth-first search for a descendant (or self) by type and id.
    pub fn find(&self, component_type: &str, id: &str) -> Option<&ComponentStatus> {
        if self.component_type == component_type && self.id == id {
            return Some(self);
        }
        self.children
            .iter()
            .find_map(|c| c.find(component_type, id))
    }
}

/// `{status, output, error}` answer of a status query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusQueryResult {
    pub status: ResultStatus,
    pub output: Vec<ComponentStatus>,
    pub error: Option<String>,
}

impl StatusQueryResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Failed,
            output: Vec::new(),
            error: Some(error.into()),
        }
    }
}
