use serde::{Deserialize, Serialize};

use super::ResultStatus;

/// Identifies the action list for one (resource_type, event_type) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleKey {
    pub resource_type: String,
    pub event_type: String,
}

impl RuleKey {
    pub fn new(resource_type: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            event_type: event_type.into(),
        }
    }
}

/// `{status, error}` answer of `add_rule` / `remove_rule`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAdminResult {
    pub status: ResultStatus,
    pub error: Option<String>,
}

impl RuleAdminResult {
    pub fn succeeded() -> Self {
        Self {
            status: ResultStatus::Succeeded,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ResultStatus::Failed,
            error: Some(error.into()),
        }
    }
}
