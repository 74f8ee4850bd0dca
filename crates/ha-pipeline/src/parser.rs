//! Message parsers, one variant per message class, each producing a
//! canonical [`HealthEvent`].

use chrono::Utc;
use serde::Deserialize;
use serde_json::{Map, Value};

use ha_core::config::MessageKind;
use ha_core::constants::COMPONENT_NODE;
use ha_core::errors::{HaResult, PipelineError};
use ha_core::models::{sources, HealthEvent};
use ha_store::HealthStore;

/// Hardware sensor alert as published by the monitoring agents.
#[derive(Debug, Deserialize)]
struct AlertMessage {
    alert_id: String,
    alert_type: String,
    #[serde(default)]
    severity: String,
    #[serde(default)]
    created_time: Value,
    #[serde(default)]
    cluster_id: String,
    #[serde(default)]
    site_id: String,
    #[serde(default)]
    rack_id: String,
    #[serde(default)]
    storageset_id: String,
    #[serde(default)]
    node_id: String,
    #[serde(default)]
    host_id: String,
    resource_type: String,
    resource_id: String,
    #[serde(default)]
    specific_info: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct IemEnvelope {
    iem: IemMessage,
}

#[derive(Debug, Deserialize)]
struct IemMessage {
    #[serde(default)]
    info: IemInfo,
    #[serde(default)]
    source: IemSource,
    contents: IemContents,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IemInfo {
    event_time: Value,
    severity: String,
    cluster_id: String,
    site_id: String,
    rack_id: String,
    storageset_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IemSource {
    component: String,
    module: String,
}

#[derive(Debug, Deserialize)]
struct IemContents {
    #[serde(default)]
    event: String,
    /// JSON text carrying the entity status.
    message: String,
}

#[derive(Debug, Deserialize)]
struct EntityStatusMessage {
    entity_type: String,
    /// Host name for nodes, resource id otherwise.
    entity_id: String,
    entity_status: String,
}

#[derive(Debug, Clone)]
pub enum MessageParser {
    Alert,
    /// IEM parsing needs the host map to turn host names into node ids.
    Iem(HealthStore),
    Canonical,
}

impl MessageParser {
    pub fn for_kind(kind: MessageKind, store: &HealthStore) -> Self {
        match kind {
            MessageKind::Alert => Self::Alert,
            MessageKind::Iem => Self::Iem(store.clone()),
            MessageKind::Canonical => Self::Canonical,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Alert => MessageKind::Alert,
            Self::Iem(_) => MessageKind::Iem,
            Self::Canonical => MessageKind::Canonical,
        }
    }

    pub fn parse_event(&self, raw: &str) -> HaResult<HealthEvent> {
        match self {
            Self::Alert => self.parse_alert(raw),
            Self::Iem(store) => self.parse_iem(raw, store),
            Self::Canonical => {
                HealthEvent::from_json(raw).map_err(|e| self.malformed(e.to_string()).into())
            }
        }
    }

    fn parse_alert(&self, raw: &str) -> HaResult<HealthEvent> {
        let alert: AlertMessage =
            serde_json::from_str(raw).map_err(|e| self.malformed(e.to_string()))?;
        Ok(HealthEvent {
            source: sources::HARDWARE.to_string(),
            event_id: alert.alert_id,
            event_type: alert.alert_type.to_ascii_lowercase(),
            severity: alert.severity,
            site_id: alert.site_id,
            rack_id: alert.rack_id,
            cluster_id: alert.cluster_id,
            storageset_id: alert.storageset_id,
            node_id: alert.node_id,
            host_id: alert.host_id,
            resource_type: alert.resource_type,
            resource_id: alert.resource_id,
            timestamp: timestamp_string(&alert.created_time),
            specific_info: alert.specific_info,
        })
    }

    fn parse_iem(&self, raw: &str, store: &HealthStore) -> HaResult<HealthEvent> {
        let envelope: IemEnvelope =
            serde_json::from_str(raw).map_err(|e| self.malformed(e.to_string()))?;
        let iem = envelope.iem;
        let entity: EntityStatusMessage = serde_json::from_str(&iem.contents.message)
            .map_err(|e| self.malformed(format!("contents.message: {e}")))?;

        let (node_id, host_id, resource_id) = if entity.entity_type == COMPONENT_NODE {
            let node_id = store.resolve_host(&entity.entity_id)?.ok_or_else(|| {
                self.malformed(format!("host {} is not mapped to a node", entity.entity_id))
            })?;
            (node_id.clone(), entity.entity_id, node_id)
        } else {
            (String::new(), String::new(), entity.entity_id)
        };

        let mut info = Map::new();
        info.insert("event".to_string(), Value::String(iem.contents.event));
        info.insert("component".to_string(), Value::String(iem.source.component));
        info.insert("module".to_string(), Value::String(iem.source.module));

        Ok(HealthEvent {
            source: sources::IEM.to_string(),
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type: entity.entity_status.to_ascii_lowercase(),
            severity: iem.info.severity,
            site_id: iem.info.site_id,
            rack_id: iem.info.rack_id,
            cluster_id: iem.info.cluster_id,
            storageset_id: iem.info.storageset_id,
            node_id,
            host_id,
            resource_type: entity.entity_type,
            resource_id,
            timestamp: timestamp_string(&iem.info.event_time),
            specific_info: Some(info),
        })
    }

    fn malformed(&self, message: impl Into<String>) -> PipelineError {
        PipelineError::Parse {
            message_class: self.kind().as_str().to_string(),
            message: message.into(),
        }
    }
}

/// Unix seconds as a string; absent or unusable values become "now".
fn timestamp_string(value: &Value) -> String {
    match value {
        Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Value::Number(n) => n.as_i64().map_or_else(|| Utc::now().timestamp().to_string(), |t| t.to_string()),
        _ => Utc::now().timestamp().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_fields_are_carried_over() {
        let raw = r#"{"alert_id":"a1","alert_type":"FAULT","severity":"critical","created_time":1700000000,
            "cluster_id":"c1","node_id":"n1","resource_type":"node:fru:disk","resource_id":"d1",
            "specific_info":{"cvg_id":"cvg0"}}"#;
        let event = MessageParser::Alert.parse_event(raw).unwrap();
        assert_eq!(event.source, "hw");
        assert_eq!(event.event_id, "a1");
        assert_eq!(event.event_type, "fault");
        assert_eq!(event.timestamp, "1700000000");
        assert_eq!(event.specific_str("cvg_id"), Some("cvg0"));
    }

    #[test]
    fn alert_without_resource_is_a_parse_error() {
        let err = MessageParser::Alert
            .parse_event(r#"{"alert_id":"a1","alert_type":"fault"}"#)
            .unwrap_err();
        assert!(matches!(err, ha_core::HaError::Pipeline(PipelineError::Parse { .. })));
    }

    #[test]
    fn canonical_round_trips_wire_format() {
        let raw = r#"{"source":"ha","event_type":"failed","resource_type":"rack","resource_id":"r1","timestamp":"5","specific_info":null}"#;
        let event = MessageParser::Canonical.parse_event(raw).unwrap();
        assert_eq!(event.resource_id, "r1");
        assert!(MessageParser::Canonical.parse_event("{").is_err());
    }

    #[test]
    fn missing_timestamp_becomes_now() {
        let before = Utc::now().timestamp();
        let ts: i64 = timestamp_string(&Value::Null).parse().unwrap();
        assert!(ts >= before);
    }
}
