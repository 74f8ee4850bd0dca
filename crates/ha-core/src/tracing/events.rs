//! Structured log events for key system operations.
//!
//! Each function emits a `tracing` event with an `event` field naming it.

pub fn event_received(watcher: &str, message_id: u64) {
    tracing::debug!(event = "event_received", watcher = %watcher, message_id = message_id, "message received");
}

pub fn event_filtered_out(watcher: &str, message_id: u64) {
    tracing::debug!(event = "event_filtered_out", watcher = %watcher, message_id = message_id, "message filtered out");
}

pub fn event_ignored(component: &str, id: &str, status: &str, reason: &str) {
    tracing::debug!(
        event = "event_ignored",
        component = %component,
        id = %id,
        status = %status,
        reason = %reason,
        "health update suppressed"
    );
}

pub fn health_updated(component: &str, id: &str, old: Option<&str>, new: &str) {
    tracing::info!(
        event = "health_updated",
        component = %component,
        id = %id,
        old_status = old.unwrap_or("none"),
        new_status = %new,
        "component health updated"
    );
}

pub fn rollup_derived(parent: &str, parent_id: &str, event_type: &str, online: usize, total: usize) {
    tracing::debug!(
        event = "rollup_derived",
        parent = %parent,
        parent_id = %parent_id,
        event_type = %event_type,
        online = online,
        total = total,
        "parent event derived"
    );
}

pub fn event_published(component: &str, id: &str, event_type: &str) {
    tracing::debug!(event = "event_published", component = %component, id = %id, event_type = %event_type, "health event published");
}

pub fn generation_failover(node: &str, old_generation: &str, new_generation: &str) {
    tracing::warn!(
        event = "generation_failover",
        node = %node,
        old_generation = %old_generation,
        new_generation = %new_generation,
        "node generation changed; failing old generation first"
    );
}

pub fn duplicate_restart(node: &str, generation: &str) {
    tracing::info!(event = "duplicate_restart", node = %node, generation = %generation, "duplicate restart delivery cleared");
}

pub fn watcher_error(watcher: &str, message_id: u64, error: &str) {
    tracing::error!(event = "watcher_error", watcher = %watcher, message_id = message_id, error = %error, "message processing failed");
}

pub fn rule_matched(resource_type: &str, event_type: &str, actions: &[String]) {
    tracing::info!(
        event = "rule_matched",
        resource_type = %resource_type,
        event_type = %event_type,
        actions = ?actions,
        "health monitor rule matched"
    );
}

pub fn action_dispatched(resource_id: &str, actions: &[String]) {
    tracing::debug!(event = "action_dispatched", resource_id = %resource_id, actions = ?actions, "actions handed to handler");
}

pub fn action_queue_full(resource_id: &str, actions: &[String]) {
    tracing::warn!(event = "action_queue_full", resource_id = %resource_id, actions = ?actions, "action queue full; actions dropped");
}
