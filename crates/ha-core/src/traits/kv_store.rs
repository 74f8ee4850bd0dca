use std::sync::Arc;

use crate::errors::HaResult;

/// A stored value together with its version token.
///
/// Versions start at 1 on creation and increase by one on every write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned {
    pub value: String,
    pub version: u64,
}

/// Precondition for [`KvStore::put`] and [`KvStore::delete_if`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Unconditional upsert.
    Any,
    /// The key must not exist.
    Absent,
    /// The key must exist at exactly this version.
    Version(u64),
}

impl std::fmt::Display for Expect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Absent => f.write_str("absent"),
            Self::Version(v) => write!(f, "version {v}"),
        }
    }
}

/// Hierarchical key-value substrate shared by health records, rules, and host maps.
///
/// Implementations must make `put` with a precondition atomic with respect to
/// other writers of the same key; a failed precondition returns
/// `StoreError::VersionConflict`.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> HaResult<Option<Versioned>>;

    /// Write `value` if `expect` holds and return the new version.
    fn put(&self, key: &str, value: &str, expect: Expect) -> HaResult<u64>;

    /// Remove `key`. Returns whether it existed.
    fn delete(&self, key: &str) -> HaResult<bool>;

    /// Remove `key` if `expect` holds, atomically with the check.
    /// `Expect::Absent` on a missing key is a no-op returning `false`.
    fn delete_if(&self, key: &str, expect: Expect) -> HaResult<bool>;

    /// All entries whose key starts with `prefix`, sorted by key.
    fn scan(&self, prefix: &str) -> HaResult<Vec<(String, Versioned)>>;

    fn exists(&self, key: &str) -> HaResult<bool> {
        Ok(self.get(key)?.is_some())
    }
}

impl<T: KvStore + ?Sized> KvStore for Arc<T> {
    fn get(&self, key: &str) -> HaResult<Option<Versioned>> { (**self).get(key) }
    fn put(&self, key: &str, value: &str, expect: Expect) -> HaResult<u64> { (**self).put(key, value, expect) }
    fn delete(&self, key: &str) -> HaResult<bool> { (**self).delete(key) }
    fn delete_if(&self, key: &str, expect: Expect) -> HaResult<bool> { (**self).delete_if(key, expect) }
    fn scan(&self, prefix: &str) -> HaResult<Vec<(String, Versioned)>> { (**self).scan(prefix) }
    fn exists(&self, key: &str) -> HaResult<bool> { (**self).exists(key) }
}
