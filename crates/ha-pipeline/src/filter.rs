//! Message filters, one variant per message class.
//!
//! A filter only decides pass/drop; malformed input is reported as an error
//! for the watcher to handle.

use serde_json::Value;

use ha_core::config::{FilterMode, FilterRules, MessageKind, PipelineConfig};
use ha_core::errors::{ConfigError, PipelineError};

#[derive(Debug, Clone, PartialEq)]
pub enum MessageFilter {
    /// Hardware alerts, matched on `resource_type`.
    Alert(FilterRules),
    /// IEMs, matched on `iem.source.component` and `iem.source.module`.
    Iem(FilterRules),
    /// Already-canonical events; everything well-formed passes.
    Canonical,
}

impl MessageFilter {
    /// The filter for `kind`, with rule files resolved.
    pub fn for_kind(kind: MessageKind, config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(match kind {
            MessageKind::Alert => Self::Alert(config.alert_filter.resolve()?),
            MessageKind::Iem => Self::Iem(config.iem_filter.resolve()?),
            MessageKind::Canonical => Self::Canonical,
        })
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Alert(_) => MessageKind::Alert,
            Self::Iem(_) => MessageKind::Iem,
            Self::Canonical => MessageKind::Canonical,
        }
    }

    /// Whether `raw` should be processed.
    pub fn filter_event(&self, raw: &str) -> Result<bool, PipelineError> {
        let value: Value = serde_json::from_str(raw).map_err(|e| self.malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(self.malformed("message is not a JSON object"));
        }
        match self {
            Self::Alert(rules) => {
                let resource_type = value
                    .get("resource_type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| self.malformed("missing resource_type"))?;
                Ok(apply_mode(rules.mode, rules.resource_types.iter().any(|r| r == resource_type)))
            }
            Self::Iem(rules) => {
                let source = value
                    .pointer("/iem/source")
                    .ok_or_else(|| self.malformed("missing iem.source"))?;
                let component = source.get("component").and_then(Value::as_str).unwrap_or_default();
                let module = source.get("module").and_then(Value::as_str).unwrap_or_default();
                Ok(apply_mode(rules.mode, iem_matches(rules, component, module)))
            }
            Self::Canonical => Ok(true),
        }
    }

    fn malformed(&self, message: impl Into<String>) -> PipelineError {
        PipelineError::Filter {
            message_class: self.kind().as_str().to_string(),
            message: message.into(),
        }
    }
}

fn apply_mode(mode: FilterMode, matched: bool) -> bool {
    match mode {
        FilterMode::None => true,
        FilterMode::Inclusion => matched,
        FilterMode::Exclusion => !matched,
    }
}

/// Every non-empty list must contain the message's value; with both lists
/// empty nothing matches.
fn iem_matches(rules: &FilterRules, component: &str, module: &str) -> bool {
    if rules.components.is_empty() && rules.modules.is_empty() {
        return false;
    }
    let component_ok = rules.components.is_empty() || rules.components.iter().any(|c| c == component);
    let module_ok = rules.modules.is_empty() || rules.modules.iter().any(|m| m == module);
    component_ok && module_ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn alert(resource_type: &str) -> String {
        format!(r#"{{"alert_type":"fault","resource_type":"{resource_type}","resource_id":"x"}}"#)
    }

    fn rules(mode: FilterMode, resource_types: &[&str]) -> FilterRules {
        FilterRules {
            mode,
            resource_types: resource_types.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn inclusion_passes_only_listed() {
        let filter = MessageFilter::Alert(rules(FilterMode::Inclusion, &["enclosure:fru:fan"]));
        assert!(filter.filter_event(&alert("enclosure:fru:fan")).unwrap());
        assert!(!filter.filter_event(&alert("enclosure:fru:psu")).unwrap());
    }

    #[test]
    fn exclusion_inverts() {
        let filter = MessageFilter::Alert(rules(FilterMode::Exclusion, &["enclosure:fru:fan"]));
        assert!(!filter.filter_event(&alert("enclosure:fru:fan")).unwrap());
        assert!(filter.filter_event(&alert("enclosure:fru:psu")).unwrap());
    }

    #[test]
    fn no_mode_passes_all() {
        let filter = MessageFilter::Alert(FilterRules::default());
        assert!(filter.filter_event(&alert("anything")).unwrap());
    }

    #[test]
    fn malformed_alert_is_an_error() {
        let filter = MessageFilter::Alert(FilterRules::default());
        assert!(matches!(filter.filter_event("not json"), Err(PipelineError::Filter { .. })));
        assert!(matches!(filter.filter_event(r#"{"alert_type":"x"}"#), Err(PipelineError::Filter { .. })));
        assert!(matches!(filter.filter_event("[1,2]"), Err(PipelineError::Filter { .. })));
    }

    #[test]
    fn iem_lists_must_all_match() {
        let filter = MessageFilter::Iem(FilterRules {
            mode: FilterMode::Inclusion,
            components: vec!["ha".into()],
            modules: vec!["node".into()],
            ..Default::default()
        });
        let iem = |c: &str, m: &str| {
            format!(r#"{{"iem":{{"source":{{"component":"{c}","module":"{m}"}},"contents":{{"message":"{{}}"}}}}}}"#)
        };
        assert!(filter.filter_event(&iem("ha", "node")).unwrap());
        assert!(!filter.filter_event(&iem("ha", "disk")).unwrap());
        assert!(!filter.filter_event(&iem("motr", "node")).unwrap());
    }

    fn resource_type() -> impl Strategy<Value = String> {
        "[a-z]{1,6}(:[a-z]{1,6}){0,2}"
    }

    proptest! {
        #[test]
        fn inclusion_and_exclusion_are_complements(
            listed in proptest::collection::vec(resource_type(), 0..5),
            candidate in resource_type(),
        ) {
            let listed: Vec<&str> = listed.iter().map(String::as_str).collect();
            let raw = serde_json::json!({ "alert_type": "fault", "resource_type": &candidate, "resource_id": "x" })
                .to_string();
            let include = MessageFilter::Alert(rules(FilterMode::Inclusion, &listed))
                .filter_event(&raw)
                .unwrap();
            let exclude = MessageFilter::Alert(rules(FilterMode::Exclusion, &listed))
                .filter_event(&raw)
                .unwrap();
            prop_assert_ne!(include, exclude);
            prop_assert_eq!(include, listed.contains(&candidate.as_str()));
        }
    }
}
