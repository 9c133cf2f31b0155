//! Allocation runs: batch requests, tuning parameters, and diagnostics.
//!
//! A run is one batch execution of the allocation algorithm over a date
//! range. Dates travel as ISO `YYYY-MM-DD` strings and are validated at
//! the boundary via [`chrono::NaiveDate`]; the engine needs only their
//! ordering and a week count for monthly cost allocation.
//!
//! Per-demand failures never abort a run — each demand produces a
//! [`DemandReport`] describing whether it was grouped, yielded nothing,
//! or was rejected with a reason.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DemandInput;
use crate::error::AllocationError;

/// Policy for students that appear in a demand without availability data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingAvailabilityPolicy {
    /// Treat the student as available all week (inherited default).
    #[default]
    AssumeFullWeek,
    /// Drop the student from grouping and report them unplaced.
    ExcludeStudent,
}

/// Engine tuning knobs for a run.
///
/// This is the typed replacement for the free-form `params` object the
/// engine historically accepted; unknown shapes are rejected at the
/// boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunParams {
    /// Minimum acceptable margin as a fraction of revenue. Candidates
    /// below it are discarded. `None` disables the filter.
    #[serde(default)]
    pub min_margin_pct: Option<f64>,
    /// How to treat students with no availability data.
    #[serde(default)]
    pub missing_availability: MissingAvailabilityPolicy,
    /// Runner-up resource candidates kept per group for manual override.
    #[serde(default = "default_max_alternates")]
    pub max_alternates: usize,
}

fn default_max_alternates() -> usize {
    10
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            min_margin_pct: None,
            missing_availability: MissingAvailabilityPolicy::default(),
            max_alternates: default_max_alternates(),
        }
    }
}

/// A request to execute an allocation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    /// First date covered by the run (`YYYY-MM-DD`).
    pub from_date: String,
    /// Last date covered by the run (`YYYY-MM-DD`).
    pub to_date: String,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
    /// Engine tuning knobs.
    #[serde(default)]
    pub params: RunParams,
    /// Demands to allocate, in order.
    pub demands: Vec<DemandInput>,
}

impl RunRequest {
    /// Creates a request for the given window and demands.
    pub fn new(
        from_date: impl Into<String>,
        to_date: impl Into<String>,
        demands: Vec<DemandInput>,
    ) -> Self {
        Self {
            from_date: from_date.into(),
            to_date: to_date.into(),
            notes: String::new(),
            params: RunParams::default(),
            demands,
        }
    }

    /// Sets the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Sets the tuning parameters.
    pub fn with_params(mut self, params: RunParams) -> Self {
        self.params = params;
        self
    }

    /// Validates the date window.
    ///
    /// # Errors
    /// [`AllocationError::InvalidRunWindow`] if either date is malformed
    /// or `from_date > to_date`.
    pub fn validate_window(&self) -> Result<(), AllocationError> {
        let window_err = || AllocationError::InvalidRunWindow {
            from: self.from_date.clone(),
            to: self.to_date.clone(),
        };
        let from = parse_date(&self.from_date).ok_or_else(window_err)?;
        let to = parse_date(&self.to_date).ok_or_else(window_err)?;
        if from > to {
            return Err(window_err());
        }
        Ok(())
    }

    /// Whole weeks covered by the window, rounded up, at least 1.
    pub fn weeks(&self) -> u32 {
        let days = match (parse_date(&self.from_date), parse_date(&self.to_date)) {
            (Some(from), Some(to)) => to.signed_duration_since(from).num_days().max(0),
            _ => 0,
        };
        ((days + 6) / 7).max(1) as u32
    }
}

/// Outcome of processing one demand within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum DemandOutcome {
    /// The demand produced at least one candidate group.
    Grouped {
        /// Number of groups produced.
        groups: usize,
        /// Students that did not land in any accepted group.
        unplaced_students: Vec<String>,
    },
    /// No group met the minimum capacity ("insufficient demand").
    Insufficient {
        /// All students of the demand, none placed.
        unplaced_students: Vec<String>,
    },
    /// The demand failed normalization and was skipped.
    Rejected {
        /// First violated rule.
        reason: String,
    },
}

/// Per-demand diagnostics returned with a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandReport {
    /// Position of the demand in the request.
    pub demand_index: usize,
    /// What happened to it.
    pub outcome: DemandOutcome,
}

/// One batch execution of the allocation algorithm.
///
/// Owns its candidate groups (by id; the store holds the group records).
/// A run is never deleted; once every group reaches a terminal status the
/// run is closed and retained for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRun {
    /// Unique run identifier.
    pub id: String,
    /// First date covered (`YYYY-MM-DD`).
    pub from_date: String,
    /// Last date covered (`YYYY-MM-DD`).
    pub to_date: String,
    /// Free-text notes.
    pub notes: String,
    /// Tuning knobs the run was executed with.
    pub params: RunParams,
    /// Per-demand diagnostics, index-aligned with the request.
    pub reports: Vec<DemandReport>,
    /// Ids of the candidate groups this run produced.
    pub group_ids: Vec<String>,
    /// Creation timestamp (ms since epoch).
    pub created_at_ms: u128,
}

impl AllocationRun {
    /// Whether every group of the run has reached a terminal status.
    ///
    /// Takes the statuses because group records live in the store.
    pub fn is_closed(&self, statuses: &[super::GroupStatus]) -> bool {
        !statuses.is_empty() && statuses.iter().all(|s| s.is_terminal())
    }
}

/// Parses a strict `YYYY-MM-DD` date.
///
/// chrono accepts unpadded numeric fields, so the canonical 10-character
/// shape is enforced before parsing.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}
