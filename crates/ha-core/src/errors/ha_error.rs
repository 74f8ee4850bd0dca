use super::error_code::{self, HaErrorCode};
use super::{ConfigError, HealthError, MonitorError, PipelineError, SchemaError, StoreError};

/// Top-level error aggregating every subsystem via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum HaError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    #[error("health error: {0}")]
    Health(#[from] HealthError),

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Convenience alias used across the workspace.
pub type HaResult<T> = Result<T, HaError>;

impl HaError {
    /// True when the failure is an optimistic-concurrency conflict that
    /// the caller may retry after re-reading.
    pub fn is_version_conflict(&self) -> bool {
        matches!(self, Self::Store(StoreError::VersionConflict { .. }))
    }
}

impl HaErrorCode for HaError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_code(),
            Self::Schema(e) => e.error_code(),
            Self::Health(e) => e.error_code(),
            Self::Pipeline(e) => e.error_code(),
            Self::Monitor(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Serialization(_) => error_code::SERIALIZATION_ERROR,
        }
    }
}
