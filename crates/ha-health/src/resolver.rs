//! Raw `resource_type` -> schema component type.
//!
//! Resolution order: exact schema name, exact map entry, longest matching
//! `*` pattern, then the last `:` segment if it names a component.

use std::collections::BTreeMap;

use ha_core::errors::HealthError;

use crate::schema::HierarchySchema;

const DEFAULT_RESOURCE_MAP: [(&str, &str); 6] = [
    ("node:fru:disk", "disk"),
    ("enclosure:fru:disk", "disk"),
    ("node:os", "server"),
    ("node:fru:*", "server"),
    ("enclosure*", "storage"),
    ("cvg", "cvg"),
];

#[derive(Debug, Clone)]
pub struct ComponentResolver {
    exact: BTreeMap<String, String>,
    /// (prefix, component), longest prefix first.
    patterns: Vec<(String, String)>,
}

impl ComponentResolver {
    /// Defaults merged with `overrides` (overrides win).
    pub fn new(overrides: &BTreeMap<String, String>) -> Self {
        let mut merged: BTreeMap<String, String> = DEFAULT_RESOURCE_MAP
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        merged.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut exact = BTreeMap::new();
        let mut patterns = Vec::new();
        for (key, component) in merged {
            match key.strip_suffix('*') {
                Some(prefix) => patterns.push((prefix.to_string(), component)),
                None => {
                    exact.insert(key, component);
                }
            }
        }
        patterns.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self { exact, patterns }
    }

    pub fn resolve(&self, resource_type: &str, schema: &HierarchySchema) -> Result<String, HealthError> {
        let unknown = || HealthError::UnknownResource {
            resource_type: resource_type.to_string(),
        };
        if schema.contains(resource_type) {
            return Ok(resource_type.to_string());
        }
        let mapped = self.exact.get(resource_type).or_else(|| {
            self.patterns
                .iter()
                .find(|(prefix, _)| resource_type.starts_with(prefix.as_str()))
                .map(|(_, component)| component)
        });
        if let Some(component) = mapped {
            return if schema.contains(component) {
                Ok(component.clone())
            } else {
                Err(unknown())
            };
        }
        match resource_type.rsplit(':').next() {
            Some(last) if schema.contains(last) => Ok(last.to_string()),
            _ => Err(unknown()),
        }
    }
}

impl Default for ComponentResolver {
    fn default() -> Self {
        Self::new(&BTreeMap::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> HierarchySchema {
        HierarchySchema::builtin("/ha/v1").unwrap()
    }

    #[test]
    fn defaults() {
        let r = ComponentResolver::default();
        let s = schema();
        assert_eq!(r.resolve("node", &s).unwrap(), "node");
        assert_eq!(r.resolve("node:fru:disk", &s).unwrap(), "disk");
        assert_eq!(r.resolve("node:fru:fan", &s).unwrap(), "server");
        assert_eq!(r.resolve("enclosure:fru:disk", &s).unwrap(), "disk");
        assert_eq!(r.resolve("enclosure:fru:psu", &s).unwrap(), "storage");
        assert_eq!(r.resolve("node:os", &s).unwrap(), "server");
        assert_eq!(r.resolve("hw:rack", &s).unwrap(), "rack");
    }

    #[test]
    fn unresolvable() {
        let err = ComponentResolver::default()
            .resolve("switch:port", &schema())
            .unwrap_err();
        assert!(matches!(err, HealthError::UnknownResource { .. }));
    }

    #[test]
    fn overrides_win() {
        let mut overrides = BTreeMap::new();
        overrides.insert("node:fru:*".to_string(), "storage".to_string());
        overrides.insert("controller".to_string(), "storage".to_string());
        let r = ComponentResolver::new(&overrides);
        let s = schema();
        assert_eq!(r.resolve("node:fru:fan", &s).unwrap(), "storage");
        assert_eq!(r.resolve("controller", &s).unwrap(), "storage");
    }
}
