//! Span names as constants, plus constructors for the hot paths.

pub mod names {
    pub const PROCESS_EVENT: &str = "ha.process_event";
    pub const ROLLUP: &str = "ha.rollup";
    pub const GET_STATUS: &str = "ha.get_status";
    pub const WATCHER: &str = "ha.watcher";
    pub const RULE_EVAL: &str = "ha.rule_eval";
}

pub fn process_event_span(component: &str, id: &str, event_type: &str) -> tracing::Span {
    tracing::info_span!("ha.process_event", component = %component, id = %id, event_type = %event_type)
}

pub fn rollup_span(parent: &str, parent_id: &str) -> tracing::Span {
    tracing::debug_span!("ha.rollup", parent = %parent, parent_id = %parent_id)
}

pub fn get_status_span(component: &str, depth: usize) -> tracing::Span {
    tracing::info_span!("ha.get_status", component = %component, depth = depth)
}

pub fn watcher_span(name: &str) -> tracing::Span {
    tracing::info_span!("ha.watcher", watcher = %name)
}

pub fn rule_eval_span(resource_type: &str, event_type: &str) -> tracing::Span {
    tracing::debug_span!("ha.rule_eval", resource_type = %resource_type, event_type = %event_type)
}
