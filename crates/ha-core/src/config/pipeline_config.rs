use std::path::Path;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// What a watcher does with a message whose processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AckPolicy {
    /// Acknowledge regardless of outcome: poison messages are dropped,
    /// the topic is never blocked.
    #[default]
    Always,
    /// Acknowledge only processed or filtered messages; failures are nacked
    /// for redelivery.
    OnSuccess,
}

/// Message class carried by a topic. Selects the filter and parser variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Alert,
    Iem,
    Canonical,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Iem => "iem",
            Self::Canonical => "canonical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    /// Pass everything.
    #[default]
    None,
    /// Pass only messages matching the lists.
    Inclusion,
    /// Drop messages matching the lists.
    Exclusion,
}

/// Inclusion/exclusion rule set for one message class.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterRules {
    pub mode: FilterMode,
    /// Alert resource types (e.g. `enclosure:fru:fan`).
    pub resource_types: Vec<String>,
    /// IEM source components.
    pub components: Vec<String>,
    /// IEM source modules.
    pub modules: Vec<String>,
    /// Optional JSON file replacing the inline lists.
    pub rules_path: Option<String>,
}

impl FilterRules {
    /// Resolve `rules_path`, if any, into a rule set. Inline lists are
    /// returned unchanged when no file is configured.
    pub fn resolve(&self) -> Result<FilterRules, ConfigError> {
        match &self.rules_path {
            None => Ok(self.clone()),
            Some(path) => Self::from_json_file(Path::new(path)),
        }
    }

    pub fn from_json_file(path: &Path) -> Result<FilterRules, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}

/// One watcher: a consumer group on a topic carrying one message class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub message_type: String,
    pub consumer_group: String,
    pub kind: MessageKind,
}

/// Event pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ack_policy: AckPolicy,
    /// How long a watcher blocks in one receive before re-checking its stop flag.
    pub poll_interval_ms: u64,
    /// Topic that health changes are published on.
    pub publish_topic: String,
    /// Newest messages per topic kept by the in-memory bus for consumer
    /// groups opened later. 0 disables replay.
    pub replay_capacity: usize,
    pub alert_filter: FilterRules,
    pub iem_filter: FilterRules,
    pub watchers: Vec<WatcherConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ack_policy: AckPolicy::default(),
            poll_interval_ms: defaults::DEFAULT_POLL_INTERVAL_MS,
            publish_topic: defaults::DEFAULT_PUBLISH_TOPIC.to_string(),
            replay_capacity: defaults::DEFAULT_REPLAY_CAPACITY,
            alert_filter: FilterRules::default(),
            iem_filter: FilterRules::default(),
            watchers: vec![
                WatcherConfig {
                    message_type: defaults::DEFAULT_ALERT_TOPIC.to_string(),
                    consumer_group: defaults::DEFAULT_ANALYZER_GROUP.to_string(),
                    kind: MessageKind::Alert,
                },
                WatcherConfig {
                    message_type: defaults::DEFAULT_IEM_TOPIC.to_string(),
                    consumer_group: defaults::DEFAULT_ANALYZER_GROUP.to_string(),
                    kind: MessageKind::Iem,
                },
            ],
        }
    }
}
