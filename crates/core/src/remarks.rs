//! Construction-control remark lifecycle.
//!
//! Remarks move `new -> in_progress -> fixed -> verified -> closed`, with
//! `rejected` reachable from every non-terminal state. Which moves are
//! accepted depends on the configured [`TransitionPolicy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Status of a construction remark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemarkStatus {
    New,
    InProgress,
    Fixed,
    Verified,
    Closed,
    Rejected,
}

/// All statuses in lifecycle order.
pub const ALL_REMARK_STATUSES: [RemarkStatus; 6] = [
    RemarkStatus::New,
    RemarkStatus::InProgress,
    RemarkStatus::Fixed,
    RemarkStatus::Verified,
    RemarkStatus::Closed,
    RemarkStatus::Rejected,
];

impl RemarkStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RemarkStatus::New => "new",
            RemarkStatus::InProgress => "in_progress",
            RemarkStatus::Fixed => "fixed",
            RemarkStatus::Verified => "verified",
            RemarkStatus::Closed => "closed",
            RemarkStatus::Rejected => "rejected",
        }
    }

    /// Terminal statuses accept no further transition under the strict policy.
    pub fn is_terminal(self) -> bool {
        matches!(self, RemarkStatus::Closed | RemarkStatus::Rejected)
    }

    /// Statuses that stop the deadline clock.
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            RemarkStatus::Fixed | RemarkStatus::Verified | RemarkStatus::Closed
        )
    }

    /// Statuses reachable from `self` under the strict policy.
    pub fn allowed_next(self) -> &'static [RemarkStatus] {
        use RemarkStatus::*;
        match self {
            New => &[InProgress, Rejected],
            InProgress => &[Fixed, Rejected],
            Fixed => &[Verified, InProgress, Rejected],
            Verified => &[Closed, InProgress, Rejected],
            Closed | Rejected => &[],
        }
    }
}

impl fmt::Display for RemarkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemarkStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_REMARK_STATUSES
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid remark status '{s}'. Must be one of: new, in_progress, fixed, verified, closed, rejected"
                ))
            })
    }
}

/// Priority of a construction remark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemarkPriority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl RemarkPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            RemarkPriority::Low => "low",
            RemarkPriority::Normal => "normal",
            RemarkPriority::High => "high",
            RemarkPriority::Critical => "critical",
        }
    }
}

impl fmt::Display for RemarkPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RemarkPriority {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(RemarkPriority::Low),
            "normal" => Ok(RemarkPriority::Normal),
            "high" => Ok(RemarkPriority::High),
            "critical" => Ok(RemarkPriority::Critical),
            other => Err(CoreError::Validation(format!(
                "Invalid remark priority '{other}'. Must be one of: low, normal, high, critical"
            ))),
        }
    }
}

/// Which status changes a remark update may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPolicy {
    /// Only moves listed by [`RemarkStatus::allowed_next`] are accepted.
    #[default]
    Strict,
    /// Any status may follow any other.
    Permissive,
}

impl FromStr for TransitionPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(TransitionPolicy::Strict),
            "permissive" => Ok(TransitionPolicy::Permissive),
            other => Err(CoreError::Validation(format!(
                "Invalid transition policy '{other}'. Must be 'strict' or 'permissive'"
            ))),
        }
    }
}

impl TransitionPolicy {
    /// Check a requested move from `from` to `to`.
    ///
    /// Same-status updates are not transitions and always pass.
    pub fn check(self, from: RemarkStatus, to: RemarkStatus) -> Result<(), CoreError> {
        if from == to || self == TransitionPolicy::Permissive {
            return Ok(());
        }
        if from.allowed_next().contains(&to) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Illegal remark status transition from '{from}' to '{to}'"
            )))
        }
    }
}

/// History comment written when a remark is created.
pub const CREATED_COMMENT: &str = "Remark created";

/// History comment written when a remark's status changes.
pub fn status_change_comment(from: RemarkStatus, to: RemarkStatus) -> String {
    format!("Status changed from {from} to {to}")
}

/// A remark is overdue when its deadline has passed and it is not resolved.
pub fn is_overdue(deadline: Option<Timestamp>, status: RemarkStatus, now: Timestamp) -> bool {
    match deadline {
        Some(deadline) => deadline < now && !status.is_resolved(),
        None => false,
    }
}

/// Statuses excluded from the overdue listing, as stored strings.
pub fn resolved_status_strs() -> Vec<&'static str> {
    ALL_REMARK_STATUSES
        .into_iter()
        .filter(|s| s.is_resolved())
        .map(RemarkStatus::as_str)
        .collect()
}
