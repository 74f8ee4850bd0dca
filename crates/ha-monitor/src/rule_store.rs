//! RuleStore: action lists keyed by (resource_type, event_type) in the KV store.
//!
//! Each rule lives at `{prefix}/rules/{resource_type}/{event_type}` as a JSON
//! array of action names. Edits are set-union / set-difference applied with
//! a version-checked write, so concurrent admins never lose each other's
//! actions. A rule whose last action is removed is deleted.

use ha_core::config::RuleConfig;
use ha_core::errors::{HaResult, MonitorError};
use ha_core::models::RuleKey;
use ha_core::traits::Expect;
use ha_store::HealthStore;

const RULES_SEGMENT: &str = "rules";

#[derive(Debug, Clone)]
pub struct RuleStore {
    store: HealthStore,
    max_retries: u32,
}

impl RuleStore {
    pub fn new(store: HealthStore, max_retries: u32) -> Self {
        Self {
            store,
            max_retries: max_retries.max(1),
        }
    }

    pub fn store(&self) -> &HealthStore {
        &self.store
    }

    /// Actions for `(resource_type, event_type)`, empty when no rule exists.
    pub fn actions(&self, resource_type: &str, event_type: &str) -> HaResult<Vec<String>> {
        let key = self.rule_key(&RuleKey::new(resource_type, event_type));
        match self.store.get(&key)? {
            Some(raw) => Ok(decode(&key, &raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Union `actions` into the rule. Returns the stored list.
    pub fn add_actions(&self, rule: &RuleKey, actions: &[String]) -> HaResult<Vec<String>> {
        validate(rule, actions)?;
        self.modify(rule, |current| {
            for action in actions {
                if !current.contains(action) {
                    current.push(action.clone());
                }
            }
        })
    }

    /// Remove `actions` from the rule. Returns what is left; an empty list
    /// means the rule was deleted.
    pub fn remove_actions(&self, rule: &RuleKey, actions: &[String]) -> HaResult<Vec<String>> {
        validate(rule, actions)?;
        self.modify(rule, |current| current.retain(|a| !actions.contains(a)))
    }

    /// Every stored rule, sorted by key.
    pub fn rules(&self) -> HaResult<Vec<(RuleKey, Vec<String>)>> {
        let prefix = self.store.rooted(&format!("{RULES_SEGMENT}/"));
        let mut rules = Vec::new();
        for (key, versioned) in self.store.scan(&prefix)? {
            let Some((resource_type, event_type)) = key[prefix.len()..].split_once('/') else {
                tracing::warn!(key = %key, "ignoring rule key without an event type");
                continue;
            };
            rules.push((RuleKey::new(resource_type, event_type), decode(&key, &versioned.value)?));
        }
        Ok(rules)
    }

    /// Union every configured rule into the store.
    pub fn bootstrap(&self, rules: &[RuleConfig]) -> HaResult<usize> {
        for rule in rules {
            self.add_actions(&RuleKey::new(&rule.resource_type, &rule.event_type), &rule.actions)?;
        }
        if !rules.is_empty() {
            tracing::info!(rules = rules.len(), "rule table bootstrapped");
        }
        Ok(rules.len())
    }

    fn rule_key(&self, rule: &RuleKey) -> String {
        self.store.rooted(&format!(
            "{RULES_SEGMENT}/{}/{}",
            rule.resource_type, rule.event_type
        ))
    }

    fn modify(&self, rule: &RuleKey, edit: impl Fn(&mut Vec<String>)) -> HaResult<Vec<String>> {
        let key = self.rule_key(rule);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let stored = self.store.get_raw(&key)?;
            let (mut actions, expect) = match &stored {
                Some(v) => (decode(&key, &v.value)?, Expect::Version(v.version)),
                None => (Vec::new(), Expect::Absent),
            };
            let before = actions.clone();
            edit(&mut actions);
            if actions == before {
                return Ok(actions);
            }

            let result = if actions.is_empty() {
                self.store.delete_if(&key, expect).map(|_| 0)
            } else {
                self.store.set_if(&key, &serde_json::to_string(&actions)?, expect)
            };

            match result {
                Ok(_) => return Ok(actions),
                Err(e) if e.is_version_conflict() && attempt < self.max_retries => {
                    tracing::debug!(key = %key, attempt, "rule write conflict, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn decode(key: &str, raw: &str) -> Result<Vec<String>, MonitorError> {
    serde_json::from_str(raw).map_err(|e| MonitorError::MalformedRule {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn validate(rule: &RuleKey, actions: &[String]) -> Result<(), MonitorError> {
    let invalid = |reason: &str| MonitorError::InvalidRule {
        resource_type: rule.resource_type.clone(),
        event_type: rule.event_type.clone(),
        reason: reason.to_string(),
    };
    for part in [&rule.resource_type, &rule.event_type] {
        if part.trim().is_empty() {
            return Err(invalid("resource_type and event_type are required"));
        }
        if part.contains('/') || part.contains('$') {
            return Err(invalid("resource_type and event_type may not contain '/' or '$'"));
        }
    }
    if actions.is_empty() {
        return Err(invalid("no actions given"));
    }
    if actions.iter().any(|a| a.trim().is_empty()) {
        return Err(invalid("action names may not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ha_core::traits::{KvStore, Versioned};
    use ha_store::MemoryKvStore;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn rules() -> RuleStore {
        RuleStore::new(HealthStore::in_memory(), 4)
    }

    #[test]
    fn add_is_an_idempotent_union() {
        let store = rules();
        let key = RuleKey::new("node", "failed");
        store.add_actions(&key, &strings(&["stop", "notify"])).unwrap();
        let after = store.add_actions(&key, &strings(&["notify", "fence"])).unwrap();
        assert_eq!(after, strings(&["stop", "notify", "fence"]));
        assert_eq!(store.add_actions(&key, &strings(&["fence"])).unwrap(), after);
        assert_eq!(store.actions("node", "failed").unwrap(), after);
    }

    #[test]
    fn removing_the_last_action_deletes_the_rule() {
        let store = rules();
        let key = RuleKey::new("disk", "missing");
        store.add_actions(&key, &strings(&["rebalance"])).unwrap();
        assert_eq!(store.remove_actions(&key, &strings(&["absent"])).unwrap(), strings(&["rebalance"]));
        assert!(store.remove_actions(&key, &strings(&["rebalance"])).unwrap().is_empty());
        assert!(store.rules().unwrap().is_empty());
        assert!(store.remove_actions(&key, &strings(&["rebalance"])).unwrap().is_empty());
    }

    /// Lets another admin's write land just before the first conditional delete.
    struct AddBeforeDelete {
        inner: MemoryKvStore,
        value: &'static str,
        fired: AtomicBool,
    }

    impl KvStore for AddBeforeDelete {
        fn get(&self, key: &str) -> HaResult<Option<Versioned>> {
            self.inner.get(key)
        }
        fn put(&self, key: &str, value: &str, expect: Expect) -> HaResult<u64> {
            self.inner.put(key, value, expect)
        }
        fn delete(&self, key: &str) -> HaResult<bool> {
            self.inner.delete(key)
        }
        fn delete_if(&self, key: &str, expect: Expect) -> HaResult<bool> {
            if !self.fired.swap(true, Ordering::SeqCst) {
                self.inner.put(key, self.value, Expect::Any)?;
            }
            self.inner.delete_if(key, expect)
        }
        fn scan(&self, prefix: &str) -> HaResult<Vec<(String, Versioned)>> {
            self.inner.scan(prefix)
        }
    }

    #[test]
    fn concurrent_add_survives_removal_of_the_last_action() {
        let kv = Arc::new(AddBeforeDelete {
            inner: MemoryKvStore::new(),
            value: r#"["a","b"]"#,
            fired: AtomicBool::new(false),
        });
        let store = RuleStore::new(
            HealthStore::new(kv, ha_core::config::defaults::DEFAULT_KEY_PREFIX),
            4,
        );
        let key = RuleKey::new("node", "failed");
        store.add_actions(&key, &strings(&["a"])).unwrap();

        let left = store.remove_actions(&key, &strings(&["a"])).unwrap();
        assert_eq!(left, strings(&["b"]));
        assert_eq!(store.actions("node", "failed").unwrap(), strings(&["b"]));
    }

    #[test]
    fn rule_keys_are_validated() {
        let store = rules();
        for (rt, et, actions) in [
            ("", "failed", strings(&["a"])),
            ("node/x", "failed", strings(&["a"])),
            ("node", "failed", Vec::new()),
            ("node", "failed", strings(&[" "])),
        ] {
            let err = store.add_actions(&RuleKey::new(rt, et), &actions).unwrap_err();
            assert!(matches!(err, ha_core::HaError::Monitor(MonitorError::InvalidRule { .. })));
        }
    }

    #[test]
    fn resource_types_with_colons_round_trip_through_scan() {
        let store = rules();
        store
            .add_actions(&RuleKey::new("enclosure:fru:fan", "fault"), &strings(&["replace_fan"]))
            .unwrap();
        let all = store.rules().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].0, RuleKey::new("enclosure:fru:fan", "fault"));
    }

    #[test]
    fn malformed_stored_rule_is_reported() {
        let store = rules();
        let key = store.rule_key(&RuleKey::new("node", "failed"));
        store.store().set(&key, "{not json").unwrap();
        let err = store.actions("node", "failed").unwrap_err();
        assert!(matches!(err, ha_core::HaError::Monitor(MonitorError::MalformedRule { .. })));
    }
}
