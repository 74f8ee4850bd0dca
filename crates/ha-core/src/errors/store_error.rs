use super::error_code::{self, HaErrorCode};

/// Errors raised by the KV substrate and its backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend error: {message}")]
    Backend { message: String },

    #[error("version conflict on {key}: expected {expected}, found {found}")]
    VersionConflict {
        key: String,
        expected: String,
        found: String,
    },

    #[error("lock poisoned: {context}")]
    LockPoisoned { context: String },

    #[error("migration failed at version {version}: {reason}")]
    MigrationFailed { version: u32, reason: String },
}

impl HaErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::VersionConflict { .. } => error_code::VERSION_CONFLICT,
            _ => error_code::STORE_ERROR,
        }
    }
}
