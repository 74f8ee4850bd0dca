use super::error_code::{self, HaErrorCode};

/// Errors raised by the event pipeline: filtering, parsing, and the bus.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("filter rejected malformed {message_class} message: {message}")]
    Filter {
        message_class: String,
        message: String,
    },

    #[error("cannot parse {message_class} message: {message}")]
    Parse {
        message_class: String,
        message: String,
    },

    #[error("message bus error: {message}")]
    Bus { message: String },

    #[error("watcher {name} is already running")]
    AlreadyRunning { name: String },

    #[error("watcher thread {name} panicked")]
    WatcherPanicked { name: String },
}

impl HaErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Filter { .. } => error_code::FILTER_ERROR,
            Self::Parse { .. } => error_code::PARSE_ERROR,
            _ => error_code::BUS_ERROR,
        }
    }
}
