//! MemoryKvStore: concurrent in-process backend via DashMap.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use ha_core::errors::{HaResult, StoreError};
use ha_core::traits::{Expect, KvStore, Versioned};

/// Thread-safe in-memory KV store.
///
/// Versions come from one store-wide counter, so a key that is deleted and
/// recreated never reuses a version a reader may still hold.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: DashMap<String, Versioned>,
    next_version: AtomicU64,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn bump(&self) -> u64 {
        self.next_version.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn conflict(key: &str, expect: Expect, found: &str) -> StoreError {
    StoreError::VersionConflict {
        key: key.to_string(),
        expected: expect.to_string(),
        found: found.to_string(),
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> HaResult<Option<Versioned>> {
        Ok(self.entries.get(key).map(|r| r.value().clone()))
    }

    fn put(&self, key: &str, value: &str, expect: Expect) -> HaResult<u64> {
        // The entry guard holds the shard lock for the whole check-and-set.
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get().version;
                match expect {
                    Expect::Absent => {
                        return Err(conflict(key, expect, &format!("version {current}")).into())
                    }
                    Expect::Version(v) if v != current => {
                        return Err(conflict(key, expect, &format!("version {current}")).into())
                    }
                    _ => {}
                }
                let version = self.bump();
                occupied.insert(Versioned {
                    value: value.to_string(),
                    version,
                });
                Ok(version)
            }
            Entry::Vacant(vacant) => {
                if let Expect::Version(_) = expect {
                    return Err(conflict(key, expect, "absent").into());
                }
                let version = self.bump();
                vacant.insert(Versioned {
                    value: value.to_string(),
                    version,
                });
                Ok(version)
            }
        }
    }

    fn delete(&self, key: &str) -> HaResult<bool> {
        Ok(self.entries.remove(key).is_some())
    }

    fn delete_if(&self, key: &str, expect: Expect) -> HaResult<bool> {
        let want = match expect {
            Expect::Any => return self.delete(key),
            Expect::Absent => {
                return match self.entries.get(key) {
                    Some(current) => {
                        Err(conflict(key, expect, &format!("version {}", current.version)).into())
                    }
                    None => Ok(false),
                }
            }
            Expect::Version(v) => v,
        };
        // remove_if holds the shard lock across the version check.
        if self.entries.remove_if(key, |_, current| current.version == want).is_some() {
            return Ok(true);
        }
        let found = self
            .entries
            .get(key)
            .map_or_else(|| "absent".to_string(), |r| format!("version {}", r.version));
        Err(conflict(key, expect, &found).into())
    }

    fn scan(&self, prefix: &str) -> HaResult<Vec<(String, Versioned)>> {
        let mut out: Vec<(String, Versioned)> = self
            .entries
            .iter()
            .filter(|r| r.key().starts_with(prefix))
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_precondition_only_creates() {
        let store = MemoryKvStore::new();
        let v1 = store.put("/a", "1", Expect::Absent).unwrap();
        assert!(store.put("/a", "2", Expect::Absent).unwrap_err().is_version_conflict());
        assert_eq!(store.get("/a").unwrap().unwrap().version, v1);
    }

    #[test]
    fn stale_version_is_rejected() {
        let store = MemoryKvStore::new();
        let v1 = store.put("/a", "1", Expect::Any).unwrap();
        let v2 = store.put("/a", "2", Expect::Version(v1)).unwrap();
        assert!(v2 > v1);
        let err = store.put("/a", "3", Expect::Version(v1)).unwrap_err();
        assert!(err.is_version_conflict());
        assert_eq!(store.get("/a").unwrap().unwrap().value, "2");
    }

    #[test]
    fn conditional_delete_checks_the_version() {
        let store = MemoryKvStore::new();
        let v1 = store.put("/a", "1", Expect::Any).unwrap();
        let v2 = store.put("/a", "2", Expect::Version(v1)).unwrap();
        assert!(store.delete_if("/a", Expect::Version(v1)).unwrap_err().is_version_conflict());
        assert_eq!(store.get("/a").unwrap().unwrap().value, "2");
        assert!(store.delete_if("/a", Expect::Version(v2)).unwrap());
        assert!(store.delete_if("/a", Expect::Version(v2)).unwrap_err().is_version_conflict());
        assert!(!store.delete_if("/a", Expect::Absent).unwrap());
    }

    #[test]
    fn recreated_key_gets_fresh_version() {
        let store = MemoryKvStore::new();
        let v1 = store.put("/a", "1", Expect::Any).unwrap();
        store.delete("/a").unwrap();
        let v2 = store.put("/a", "1", Expect::Absent).unwrap();
        assert_ne!(v1, v2);
        assert!(store.put("/a", "x", Expect::Version(v1)).is_err());
    }
}
