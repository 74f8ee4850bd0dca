//! SqliteKvStore: durable single-file backend.

pub mod migrations;
pub mod queries;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use ha_core::errors::{HaResult, StoreError};
use ha_core::traits::{Expect, KvStore, Versioned};

use crate::to_store_err;

/// KV store on one SQLite connection guarded by a mutex.
///
/// Every conditional write runs inside a `BEGIN IMMEDIATE` transaction so
/// the version check and the write are atomic against other processes
/// sharing the file.
pub struct SqliteKvStore {
    conn: Mutex<Connection>,
}

impl SqliteKvStore {
    /// Open (and migrate) a store backed by a file on disk.
    pub fn open(path: &Path, busy_timeout_ms: u32) -> HaResult<Self> {
        let conn = Connection::open(path).map_err(|e| to_store_err(e.to_string()))?;
        conn.execute_batch(&format!(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = {busy_timeout_ms};"
        ))
        .map_err(|e| to_store_err(e.to_string()))?;
        Self::initialize(conn)
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> HaResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_store_err(e.to_string()))?;
        Self::initialize(conn)
    }

    fn initialize(conn: Connection) -> HaResult<Self> {
        migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> HaResult<T>
    where
        F: FnOnce(&Connection) -> HaResult<T>,
    {
        let guard = self.conn.lock().map_err(|e| StoreError::LockPoisoned {
            context: format!("sqlite connection: {e}"),
        })?;
        f(&guard)
    }
}

impl KvStore for SqliteKvStore {
    fn get(&self, key: &str) -> HaResult<Option<Versioned>> {
        self.with_conn(|conn| queries::get(conn, key))
    }

    fn put(&self, key: &str, value: &str, expect: Expect) -> HaResult<u64> {
        self.with_conn(|conn| {
            queries::with_immediate_transaction(conn, |tx| queries::put(tx, key, value, expect))
        })
    }

    fn delete(&self, key: &str) -> HaResult<bool> {
        self.with_conn(|conn| queries::delete(conn, key))
    }

    fn delete_if(&self, key: &str, expect: Expect) -> HaResult<bool> {
        self.with_conn(|conn| {
            queries::with_immediate_transaction(conn, |tx| queries::delete_if(tx, key, expect))
        })
    }

    fn scan(&self, prefix: &str) -> HaResult<Vec<(String, Versioned)>> {
        self.with_conn(|conn| queries::scan(conn, prefix))
    }
}
