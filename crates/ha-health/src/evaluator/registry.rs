use std::collections::{BTreeMap, HashMap};

use ha_core::constants::event_types;
use ha_core::errors::SchemaError;

use super::ElementHealthEvaluator;
use crate::schema::HierarchySchema;

/// One evaluator per component that has children, keyed by component name.
#[derive(Debug, Clone, Default)]
pub struct EvaluatorRegistry {
    evaluators: HashMap<String, ElementHealthEvaluator>,
}

impl EvaluatorRegistry {
    /// Build from the schema. `fallback_overrides` replaces the default
    /// `fault` fallback for the named levels.
    pub fn new(
        schema: &HierarchySchema,
        fallback_overrides: &BTreeMap<String, String>,
    ) -> Result<Self, SchemaError> {
        if let Some(unknown) = fallback_overrides.keys().find(|name| !schema.contains(name)) {
            return Err(SchemaError::UnknownComponent(unknown.clone()));
        }
        let evaluators = schema
            .iter()
            .filter(|level| !level.children().is_empty())
            .map(|level| {
                let fallback = fallback_overrides
                    .get(level.name())
                    .map(String::as_str)
                    .unwrap_or(event_types::FAULT);
                (
                    level.name().to_string(),
                    ElementHealthEvaluator::new(level.name(), fallback),
                )
            })
            .collect();
        Ok(Self { evaluators })
    }

    pub fn get(&self, component: &str) -> Result<&ElementHealthEvaluator, SchemaError> {
        self.evaluators
            .get(component)
            .ok_or_else(|| SchemaError::UnknownComponent(component.to_string()))
    }

    pub fn len(&self) -> usize {
        self.evaluators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluators.is_empty()
    }
}
