//! The quorum rollup rule, as a pure function of child statuses.

use ha_core::constants::event_types;
use ha_core::models::HealthStatus;

/// Counts over the current statuses of a child set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildTally {
    pub total: usize,
    pub online: usize,
    pub failed: usize,
    /// Starting, recovering, or unknown.
    pub unsettled: usize,
}

impl ChildTally {
    pub fn from_statuses(statuses: impl IntoIterator<Item = HealthStatus>) -> Self {
        let mut tally = Self::default();
        for status in statuses {
            tally.record(status);
        }
        tally
    }

    pub fn record(&mut self, status: HealthStatus) {
        self.total += 1;
        match status {
            HealthStatus::Online => self.online += 1,
            HealthStatus::Failed => self.failed += 1,
            s if s.is_pending() || s == HealthStatus::Unknown => self.unsettled += 1,
            _ => {}
        }
    }

    /// floor(n/2) + 1
    pub fn quorum(&self) -> usize {
        self.total / 2 + 1
    }
}

/// Parent event type for a tally. Branches are checked in order; `fallback`
/// applies when none match.
pub fn rollup_event_type<'a>(tally: &ChildTally, fallback: &'a str) -> &'a str {
    let quorum = tally.quorum();
    if tally.total > 0 && tally.online == tally.total {
        event_types::FAULT_RESOLVED
    } else if tally.online >= quorum {
        event_types::THRESHOLD_BREACHED_LOW
    } else if tally.failed >= quorum {
        event_types::FAILED
    } else if tally.unsettled >= quorum {
        event_types::UNKNOWN
    } else {
        fallback
    }
}
