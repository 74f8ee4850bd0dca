//! HealthStore: the facade health, rule, and parser code talk to.

use std::collections::BTreeMap;
use std::sync::Arc;

use ha_core::errors::HaResult;
use ha_core::traits::{Expect, KvStore, Versioned};

use crate::keys::KeyTemplate;
use crate::memory::MemoryKvStore;

/// Thin, cloneable handle over a shared [`KvStore`] rooted at a key prefix.
#[derive(Clone)]
pub struct HealthStore {
    kv: Arc<dyn KvStore>,
    prefix: String,
}

impl HealthStore {
    pub fn new(kv: Arc<dyn KvStore>, prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            kv,
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// In-memory store under the default prefix (for tests and embedding).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryKvStore::new()),
            ha_core::config::defaults::DEFAULT_KEY_PREFIX,
        )
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn kv(&self) -> &Arc<dyn KvStore> {
        &self.kv
    }

    /// Root a relative template (`/cluster/$cluster_id/health`) under the prefix.
    pub fn rooted(&self, relative: &str) -> String {
        format!("{}/{}", self.prefix, relative.trim_start_matches('/'))
    }

    /// Value only.
    pub fn get(&self, key: &str) -> HaResult<Option<String>> {
        Ok(self.kv.get(key)?.map(|v| v.value))
    }

    /// Value together with its version token.
    pub fn get_raw(&self, key: &str) -> HaResult<Option<Versioned>> {
        self.kv.get(key)
    }

    /// Unconditional upsert.
    pub fn set(&self, key: &str, value: &str) -> HaResult<u64> {
        self.kv.put(key, value, Expect::Any)
    }

    /// Conditional write; fails with a version conflict if `expect` does not hold.
    pub fn set_if(&self, key: &str, value: &str, expect: Expect) -> HaResult<u64> {
        self.kv.put(key, value, expect)
    }

    pub fn key_exists(&self, key: &str) -> HaResult<bool> {
        self.kv.exists(key)
    }

    pub fn delete(&self, key: &str) -> HaResult<bool> {
        self.kv.delete(key)
    }

    /// Conditional delete; fails with a version conflict if `expect` does not hold.
    pub fn delete_if(&self, key: &str, expect: Expect) -> HaResult<bool> {
        self.kv.delete_if(key, expect)
    }

    pub fn scan(&self, prefix: &str) -> HaResult<Vec<(String, Versioned)>> {
        self.kv.scan(prefix)
    }

    /// Keys under `template`'s truncated prefix that match the template
    /// exactly, with their captured ids.
    pub fn scan_template(
        &self,
        template: &KeyTemplate,
        ids: &BTreeMap<String, String>,
    ) -> HaResult<Vec<(BTreeMap<String, String>, String, Versioned)>> {
        let prefix = template.substitute(ids);
        Ok(self
            .kv
            .scan(&prefix)?
            .into_iter()
            .filter_map(|(key, value)| template.capture(&key).map(|captured| (captured, key, value)))
            .collect())
    }

    fn host_key(&self, host_id: &str) -> String {
        format!("{}/host/{}", self.prefix, host_id)
    }

    /// Record which node a host name belongs to.
    pub fn register_host(&self, host_id: &str, node_id: &str) -> HaResult<()> {
        let value = serde_json::json!({ "node_id": node_id }).to_string();
        self.kv.put(&self.host_key(host_id), &value, Expect::Any)?;
        Ok(())
    }

    /// Resolve a host name to its node id.
    pub fn resolve_host(&self, host_id: &str) -> HaResult<Option<String>> {
        let Some(raw) = self.get(&self.host_key(host_id))? else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(&raw)?;
        Ok(value
            .get("node_id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }
}

impl std::fmt::Debug for HealthStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HealthStore").field("prefix", &self.prefix).finish()
    }
}
