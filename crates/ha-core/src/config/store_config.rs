use serde::{Deserialize, Serialize};

use super::defaults;

/// Which KV backend holds health records and rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

/// KV store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite database path (sqlite backend only).
    pub db_path: String,
    /// Prefix every key template is rooted under.
    pub key_prefix: String,
    /// SQLite busy timeout in milliseconds.
    pub busy_timeout_ms: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            db_path: defaults::DEFAULT_DB_FILENAME.to_string(),
            key_prefix: defaults::DEFAULT_KEY_PREFIX.to_string(),
            busy_timeout_ms: defaults::DEFAULT_BUSY_TIMEOUT_MS,
        }
    }
}
