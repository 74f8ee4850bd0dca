//! Element health evaluators: one per parent level, all sharing the same
//! quorum rollup and differing only in their fallback event type.

mod element;
mod quorum;
mod registry;

pub use element::ElementHealthEvaluator;
pub use quorum::{rollup_event_type, ChildTally};
pub use registry::EvaluatorRegistry;
