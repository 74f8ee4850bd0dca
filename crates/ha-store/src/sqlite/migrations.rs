//! Schema migrations tracked through `PRAGMA user_version`.

use rusqlite::Connection;

use ha_core::errors::{HaResult, StoreError};

use crate::to_store_err;

/// Latest schema version.
pub const LATEST_VERSION: u32 = 1;

/// Bring the database up to [`LATEST_VERSION`].
pub fn run_migrations(conn: &Connection) -> HaResult<()> {
    let current: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .map_err(|e| to_store_err(e.to_string()))?;

    if current < 1 {
        v001_kv_tables(conn).map_err(|e| StoreError::MigrationFailed {
            version: 1,
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

fn v001_kv_tables(conn: &Connection) -> rusqlite::Result<()> {
    tracing::info!("v001: creating kv tables");
    conn.execute_batch(
        "
        BEGIN;
        CREATE TABLE IF NOT EXISTS kv (
            key     TEXT PRIMARY KEY,
            value   TEXT NOT NULL,
            version INTEGER NOT NULL
        );

        -- Store-wide version counter; versions are never reused.
        CREATE TABLE IF NOT EXISTS kv_version (
            id   INTEGER PRIMARY KEY CHECK (id = 1),
            next INTEGER NOT NULL
        );
        INSERT OR IGNORE INTO kv_version (id, next) VALUES (1, 0);

        PRAGMA user_version = 1;
        COMMIT;
        ",
    )
}
