use super::error_code::{self, HaErrorCode};

/// Hierarchy schema load and lookup errors. Load failures are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema file {path} could not be read: {message}")]
    Unreadable { path: String, message: String },

    #[error("schema is malformed: {message}")]
    Malformed { message: String },

    #[error("component {component} names unknown parent {parent}")]
    UnknownParent { component: String, parent: String },

    #[error("schema must have exactly one root component, found {count}")]
    RootCount { count: usize },

    #[error("component {0} is declared more than once")]
    DuplicateComponent(String),

    #[error("schema contains a cycle through {0}")]
    Cycle(String),

    #[error("unknown component type: {0}")]
    UnknownComponent(String),
}

impl HaErrorCode for SchemaError {
    fn error_code(&self) -> &'static str {
        error_code::SCHEMA_ERROR
    }
}
