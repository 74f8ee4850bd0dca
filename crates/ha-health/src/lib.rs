//! # ha-health
//!
//! Turns canonical health events into persisted per-component health and
//! rolls status up the component hierarchy by quorum.
//!
//! Everything a caller needs is reachable from [`HaContext`], built once and
//! shared by reference; [`SystemHealth`] is the orchestrator on top of it.

pub mod context;
pub mod evaluator;
pub mod identity;
pub mod resolver;
pub mod schema;
pub mod status_mapper;
pub mod system_health;

pub use context::HaContext;
pub use evaluator::{ChildTally, ElementHealthEvaluator, EvaluatorRegistry};
pub use identity::EntityIdentity;
pub use resolver::ComponentResolver;
pub use schema::{ComponentDef, ComponentLevel, HierarchySchema};
pub use status_mapper::StatusMapper;
pub use system_health::{SystemHealth, UpdateOutcome};
