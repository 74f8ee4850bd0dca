use super::error_code::{self, HaErrorCode};

/// Health Monitor rule and action errors.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("invalid rule for {resource_type}/{event_type}: {reason}")]
    InvalidRule {
        resource_type: String,
        event_type: String,
        reason: String,
    },

    #[error("malformed rule at {key}: {message}")]
    MalformedRule { key: String, message: String },

    #[error("action handler failed: {0}")]
    ActionFailed(String),
}

impl HaErrorCode for MonitorError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ActionFailed(_) => error_code::ACTION_ERROR,
            _ => error_code::RULE_ERROR,
        }
    }
}
