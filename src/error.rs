//! Error taxonomy for the allocation engine.
//!
//! Two propagation regimes apply:
//!
//! - Per-demand failures (`InvalidDemand`, malformed availability inside a
//!   demand) are captured in the run result as [`DemandOutcome::Rejected`]
//!   and never abort a run.
//! - Structural failures (bad run window, unknown ids, illegal transitions,
//!   commit-time conflicts) are returned as `Err` to the caller.
//!
//! Confirmation failures always leave the group in its pre-confirmation
//! state; no partial materialization is ever visible.
//!
//! [`DemandOutcome::Rejected`]: crate::models::DemandOutcome::Rejected

use thiserror::Error;

use crate::models::{DecisionAction, GroupStatus};

/// Errors surfaced by the allocation engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AllocationError {
    /// A demand failed normalization. Recorded per-demand in run reports;
    /// only returned directly by the normalizer itself.
    #[error("invalid demand at index {index}: {reason}")]
    InvalidDemand {
        /// Position of the demand in the run request.
        index: usize,
        /// First violated rule.
        reason: String,
    },

    /// A weekly interval is malformed (zero-length, crosses midnight,
    /// or has an out-of-range day).
    #[error("invalid availability: {0}")]
    InvalidAvailability(String),

    /// The run's date range is malformed or inverted.
    #[error("invalid run window: from={from} to={to}")]
    InvalidRunWindow {
        /// Requested start date.
        from: String,
        /// Requested end date.
        to: String,
    },

    /// The requested action is not legal from the group's current status.
    #[error("cannot {action} group in status {status}: {reason}")]
    InvalidTransition {
        /// Current group status.
        status: GroupStatus,
        /// Attempted action.
        action: DecisionAction,
        /// Why the transition was refused.
        reason: String,
    },

    /// Commit-time re-check found the instructor or room no longer free.
    #[error("resource conflict: {0}")]
    ResourceConflict(String),

    /// Unknown run or group id.
    #[error("not found: {0}")]
    NotFound(String),

    /// The scheduling collaborator failed during materialization.
    /// The group remains in its pre-confirmation state.
    #[error("materialization failed: {0}")]
    MaterializationFailed(String),
}

impl AllocationError {
    /// Shorthand for an [`AllocationError::InvalidDemand`].
    pub fn invalid_demand(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDemand {
            index,
            reason: reason.into(),
        }
    }
}
