use super::error_code::{self, HaErrorCode};

/// Errors raised while mapping, storing, and rolling up component health.
#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error("no status mapping for event type {event_type}")]
    UnknownEventType { event_type: String },

    #[error("cannot resolve component for resource type {resource_type}")]
    UnknownResource { resource_type: String },

    #[error("health not found for {component} {id}")]
    HealthNotFound { component: String, id: String },

    #[error("malformed entity health at {key}: {message}")]
    Deserialization { key: String, message: String },

    #[error("missing id {placeholder} for {component}")]
    MissingId {
        component: String,
        placeholder: String,
    },

    #[error("Invalid id")]
    InvalidId { component: String, id: String },

    #[error("update of {key} abandoned after {attempts} conflicting attempts")]
    RetriesExhausted { key: String, attempts: u32 },
}

impl HaErrorCode for HealthError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEventType { .. } => error_code::UNKNOWN_EVENT_TYPE,
            Self::UnknownResource { .. } => error_code::UNKNOWN_RESOURCE,
            Self::HealthNotFound { .. } => error_code::HEALTH_NOT_FOUND,
            Self::Deserialization { .. } => error_code::DESERIALIZATION_ERROR,
            Self::MissingId { .. } | Self::InvalidId { .. } => error_code::INVALID_ID,
            Self::RetriesExhausted { .. } => error_code::RETRIES_EXHAUSTED,
        }
    }
}
