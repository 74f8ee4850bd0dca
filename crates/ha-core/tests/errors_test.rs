use ha_core::errors::*;

#[test]
fn invalid_id_renders_operator_message() {
    let err = HealthError::InvalidId {
        component: "node".into(),
        id: "n2".into(),
    };
    assert_eq!(err.to_string(), "Invalid id");
    assert_eq!(err.error_code(), error_code::INVALID_ID);
}

#[test]
fn unknown_event_type_carries_name() {
    let err = HealthError::UnknownEventType {
        event_type: "exploded".into(),
    };
    assert!(err.to_string().contains("exploded"));
    assert_eq!(err.error_code(), error_code::UNKNOWN_EVENT_TYPE);
}

#[test]
fn version_conflict_is_detectable_through_ha_error() {
    let err: HaError = StoreError::VersionConflict {
        key: "/k".into(),
        expected: "version 2".into(),
        found: "version 3".into(),
    }
    .into();
    assert!(err.is_version_conflict());
    assert_eq!(err.error_code(), error_code::VERSION_CONFLICT);
}

#[test]
fn subsystem_codes_propagate_through_ha_error() {
    let err: HaError = PipelineError::Parse {
        message_class: "alert".into(),
        message: "not json".into(),
    }
    .into();
    assert!(!err.is_version_conflict());
    assert_eq!(err.error_code(), error_code::PARSE_ERROR);
    assert!(err.operator_string().starts_with("[PARSE_ERROR]"));
}

#[test]
fn serde_errors_convert() {
    let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let err: HaError = serde_err.into();
    assert_eq!(err.error_code(), error_code::SERIALIZATION_ERROR);
}
