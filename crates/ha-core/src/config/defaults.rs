// Single source of truth for all default values.

// --- Store ---
pub const DEFAULT_DB_FILENAME: &str = "ha.db";
pub const DEFAULT_KEY_PREFIX: &str = "/ha/v1";
pub const DEFAULT_BUSY_TIMEOUT_MS: u32 = 5_000;

// --- Health ---
pub const DEFAULT_MAX_HISTORY: usize = 5;
pub const DEFAULT_MAX_UPDATE_RETRIES: u32 = 8;
pub const DEFAULT_NODE_FALLBACK: &str = "threshold_breached:low";

// --- Pipeline ---
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;
pub const DEFAULT_PUBLISH_TOPIC: &str = "ha_events";
pub const DEFAULT_ALERT_TOPIC: &str = "alerts";
pub const DEFAULT_IEM_TOPIC: &str = "iem";
pub const DEFAULT_ANALYZER_GROUP: &str = "ha_event_analyzer";
pub const DEFAULT_REPLAY_CAPACITY: usize = 1_024;

// --- Monitor ---
pub const DEFAULT_MONITOR_ENABLED: bool = true;
pub const DEFAULT_MONITOR_GROUP: &str = "health_monitor";
pub const DEFAULT_ACTION_QUEUE_SIZE: usize = 1_024;

// --- Observability ---
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_JSON_LOGS: bool = false;
