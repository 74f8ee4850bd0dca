//! HealthMonitor: rule lookup per canonical event.

use std::sync::Arc;

use ha_core::errors::HaResult;
use ha_core::models::{HealthEvent, RuleAdminResult, RuleKey};
use ha_core::tracing::{events, spans};
use ha_core::traits::Subscriber;

use crate::dispatcher::ActionDispatcher;
use crate::rule_store::RuleStore;

/// Evaluates every event against the rule table and queues matching actions.
/// Performs no recovery itself.
pub struct HealthMonitor {
    rules: RuleStore,
    dispatcher: Arc<ActionDispatcher>,
}

impl HealthMonitor {
    pub fn new(rules: RuleStore, dispatcher: Arc<ActionDispatcher>) -> Self {
        Self { rules, dispatcher }
    }

    pub fn rules(&self) -> &RuleStore {
        &self.rules
    }

    pub fn dispatcher(&self) -> &Arc<ActionDispatcher> {
        &self.dispatcher
    }

    /// Actions configured for the event's (resource_type, event_type).
    pub fn evaluate(&self, event: &HealthEvent) -> HaResult<Vec<String>> {
        let _span = spans::rule_eval_span(&event.resource_type, &event.event_type).entered();
        let actions = self.rules.actions(&event.resource_type, &event.event_type)?;
        if !actions.is_empty() {
            events::rule_matched(&event.resource_type, &event.event_type, &actions);
        }
        Ok(actions)
    }

    pub fn add_rule(&self, resource_type: &str, event_type: &str, actions: &[String]) -> RuleAdminResult {
        let key = RuleKey::new(resource_type, event_type);
        match self.rules.add_actions(&key, actions) {
            Ok(stored) => {
                tracing::info!(resource_type, event_type, actions = ?stored, "rule added");
                RuleAdminResult::succeeded()
            }
            Err(e) => RuleAdminResult::failed(e.to_string()),
        }
    }

    pub fn remove_rule(&self, resource_type: &str, event_type: &str, actions: &[String]) -> RuleAdminResult {
        let key = RuleKey::new(resource_type, event_type);
        match self.rules.remove_actions(&key, actions) {
            Ok(left) => {
                tracing::info!(resource_type, event_type, remaining = ?left, "rule actions removed");
                RuleAdminResult::succeeded()
            }
            Err(e) => RuleAdminResult::failed(e.to_string()),
        }
    }
}

impl Subscriber for HealthMonitor {
    fn process_event(&self, event: &HealthEvent) -> HaResult<()> {
        let actions = self.evaluate(event)?;
        if !actions.is_empty() {
            self.dispatcher.dispatch(event, actions);
        }
        Ok(())
    }
}
