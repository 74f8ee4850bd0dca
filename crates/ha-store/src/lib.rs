//! # ha-store
//!
//! The KV substrate every health record, rule, and host mapping lives in.
//! Keys are built from `$placeholder` templates; values carry a version
//! token so that read-modify-write cycles can be made optimistic.

pub mod health_store;
pub mod keys;
pub mod memory;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use ha_core::config::{StoreBackend, StoreConfig};
use ha_core::errors::{HaError, HaResult, StoreError};
use ha_core::traits::KvStore;

pub use health_store::HealthStore;
pub use keys::KeyTemplate;
pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;

/// Open the backend selected by `config`.
pub fn open_kv_store(config: &StoreConfig) -> HaResult<Arc<dyn KvStore>> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryKvStore::new())),
        StoreBackend::Sqlite => Ok(Arc::new(SqliteKvStore::open(
            Path::new(&config.db_path),
            config.busy_timeout_ms,
        )?)),
    }
}

/// Map a backend error message into the workspace error type.
pub(crate) fn to_store_err(message: impl Into<String>) -> HaError {
    HaError::Store(StoreError::Backend {
        message: message.into(),
    })
}
