//! HaErrorCode trait for operator-facing result rendering.

/// Every error enum provides a stable, machine-readable code so that
/// query and rule-admin surfaces can report `{status: Failed, error}`
/// without leaking raw error types.
pub trait HaErrorCode {
    /// Returns the error code string (e.g., "STORE_ERROR").
    fn error_code(&self) -> &'static str;

    /// Returns the formatted operator string: `[ERROR_CODE] message`.
    fn operator_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

pub const STORE_ERROR: &str = "STORE_ERROR";
pub const VERSION_CONFLICT: &str = "VERSION_CONFLICT";
pub const SCHEMA_ERROR: &str = "SCHEMA_ERROR";
pub const UNKNOWN_EVENT_TYPE: &str = "UNKNOWN_EVENT_TYPE";
pub const UNKNOWN_RESOURCE: &str = "UNKNOWN_RESOURCE";
pub const HEALTH_NOT_FOUND: &str = "HEALTH_NOT_FOUND";
pub const DESERIALIZATION_ERROR: &str = "DESERIALIZATION_ERROR";
pub const INVALID_ID: &str = "INVALID_ID";
pub const RETRIES_EXHAUSTED: &str = "RETRIES_EXHAUSTED";
pub const FILTER_ERROR: &str = "FILTER_ERROR";
pub const PARSE_ERROR: &str = "PARSE_ERROR";
pub const BUS_ERROR: &str = "BUS_ERROR";
pub const RULE_ERROR: &str = "RULE_ERROR";
pub const ACTION_ERROR: &str = "ACTION_ERROR";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const SERIALIZATION_ERROR: &str = "SERIALIZATION_ERROR";
