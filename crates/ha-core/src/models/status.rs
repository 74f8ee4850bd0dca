use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical health status: the closed set every raw event type maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Online,
    Offline,
    Failed,
    Degraded,
    Unknown,
    Starting,
    Recovering,
    Repairing,
    Repaired,
    Rebalancing,
}

impl HealthStatus {
    pub const ALL: [HealthStatus; 10] = [
        Self::Online,
        Self::Offline,
        Self::Failed,
        Self::Degraded,
        Self::Unknown,
        Self::Starting,
        Self::Recovering,
        Self::Repairing,
        Self::Repaired,
        Self::Rebalancing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Failed => "failed",
            Self::Degraded => "degraded",
            Self::Unknown => "unknown",
            Self::Starting => "starting",
            Self::Recovering => "recovering",
            Self::Repairing => "repairing",
            Self::Repaired => "repaired",
            Self::Rebalancing => "rebalancing",
        }
    }

    /// Statuses whose outcome is not yet settled. Counted together with
    /// `Unknown` by the quorum rollup.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Starting | Self::Recovering)
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown health status: {s}"))
    }
}
