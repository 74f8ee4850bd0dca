//! SQL for the kv table.

use rusqlite::{params, Connection, OptionalExtension};

use ha_core::errors::{HaResult, StoreError};
use ha_core::traits::{Expect, Versioned};

use crate::to_store_err;

/// Execute a write inside a BEGIN IMMEDIATE transaction.
/// This acquires the write lock at transaction start, preventing SQLITE_BUSY
/// upgrades halfway through a check-and-set.
pub fn with_immediate_transaction<F, T>(conn: &Connection, f: F) -> HaResult<T>
where
    F: FnOnce(&Connection) -> HaResult<T>,
{
    conn.execute_batch("BEGIN IMMEDIATE")
        .map_err(|e| to_store_err(format!("failed to begin immediate transaction: {e}")))?;

    match f(conn) {
        Ok(value) => {
            conn.execute_batch("COMMIT")
                .map_err(|e| to_store_err(format!("failed to commit: {e}")))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback) = conn.execute_batch("ROLLBACK") {
                tracing::error!(error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}

pub fn get(conn: &Connection, key: &str) -> HaResult<Option<Versioned>> {
    conn.query_row(
        "SELECT value, version FROM kv WHERE key = ?1",
        params![key],
        |row| {
            Ok(Versioned {
                value: row.get(0)?,
                version: row.get::<_, i64>(1)? as u64,
            })
        },
    )
    .optional()
    .map_err(|e| to_store_err(e.to_string()))
}

/// Conditional upsert. Must run inside a write transaction.
pub fn put(conn: &Connection, key: &str, value: &str, expect: Expect) -> HaResult<u64> {
    let current = get(conn, key)?.map(|v| v.version);
    let ok = match (expect, current) {
        (Expect::Any, _) => true,
        (Expect::Absent, None) => true,
        (Expect::Version(want), Some(have)) => want == have,
        _ => false,
    };
    if !ok {
        return Err(StoreError::VersionConflict {
            key: key.to_string(),
            expected: expect.to_string(),
            found: current.map_or_else(|| "absent".to_string(), |v| format!("version {v}")),
        }
        .into());
    }

    let version = next_version(conn)?;
    conn.execute(
        "INSERT INTO kv (key, value, version) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, version = excluded.version",
        params![key, value, version as i64],
    )
    .map_err(|e| to_store_err(e.to_string()))?;
    Ok(version)
}

fn next_version(conn: &Connection) -> HaResult<u64> {
    conn.execute("UPDATE kv_version SET next = next + 1 WHERE id = 1", [])
        .map_err(|e| to_store_err(e.to_string()))?;
    let next: i64 = conn
        .query_row("SELECT next FROM kv_version WHERE id = 1", [], |row| row.get(0))
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(next as u64)
}

pub fn delete(conn: &Connection, key: &str) -> HaResult<bool> {
    let rows = conn
        .execute("DELETE FROM kv WHERE key = ?1", params![key])
        .map_err(|e| to_store_err(e.to_string()))?;
    Ok(rows > 0)
}

/// Conditional delete. Must run inside a write transaction.
pub fn delete_if(conn: &Connection, key: &str, expect: Expect) -> HaResult<bool> {
    let rows = match expect {
        Expect::Any => return delete(conn, key),
        Expect::Version(want) => conn
            .execute(
                "DELETE FROM kv WHERE key = ?1 AND version = ?2",
                params![key, want as i64],
            )
            .map_err(|e| to_store_err(e.to_string()))?,
        Expect::Absent => 0,
    };
    if rows > 0 {
        return Ok(true);
    }
    match (expect, get(conn, key)?.map(|v| v.version)) {
        (Expect::Absent, None) => Ok(false),
        (_, current) => Err(StoreError::VersionConflict {
            key: key.to_string(),
            expected: expect.to_string(),
            found: current.map_or_else(|| "absent".to_string(), |v| format!("version {v}")),
        }
        .into()),
    }
}

pub fn scan(conn: &Connection, prefix: &str) -> HaResult<Vec<(String, Versioned)>> {
    let mut stmt = conn
        .prepare_cached(
            "SELECT key, value, version FROM kv
             WHERE substr(key, 1, length(?1)) = ?1
             ORDER BY key",
        )
        .map_err(|e| to_store_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![prefix], |row| {
            Ok((
                row.get::<_, String>(0)?,
                Versioned {
                    value: row.get(1)?,
                    version: row.get::<_, i64>(2)? as u64,
                },
            ))
        })
        .map_err(|e| to_store_err(e.to_string()))?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_store_err(e.to_string()))
}
