/// HA engine version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Placeholder marker in key templates.
pub const PLACEHOLDER_MARKER: char = '$';

/// `specific_info` field carrying a monitored process generation id.
pub const GENERATION_ID_FIELD: &str = "generation_id";

/// EntityHealth attribute holding the stored generation id.
pub const ATTR_GENERATION_ID: &str = "generation_id";

/// EntityHealth attribute set while a failover's synthetic FAILED is outstanding.
pub const ATTR_POD_RESTART: &str = "pod_restart";

/// The component type with special handling in the orchestrator and IEM parser.
pub const COMPONENT_NODE: &str = "node";

/// Raw event types emitted by the quorum rollup.
pub mod event_types {
    pub const ONLINE: &str = "online";
    pub const FAILED: &str = "failed";
    pub const FAULT: &str = "fault";
    pub const FAULT_RESOLVED: &str = "fault_resolved";
    pub const THRESHOLD_BREACHED_LOW: &str = "threshold_breached:low";
    pub const UNKNOWN: &str = "unknown";
}
