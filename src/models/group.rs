//! Candidate groups and the approval state machine.
//!
//! A candidate group is a proposed class section: a subset of one demand's
//! students plus, when the matcher found one, a proposed instructor/room/slot.
//! Groups move through an explicit finite-state machine driven by human
//! decisions:
//!
//! ```text
//! proposed ──hold───→ held ──┬─reject──→ rejected (terminal)
//!    │                       └─confirm─→ confirmed (terminal)
//!    ├──────reject──→ rejected
//!    └──────confirm─→ confirmed
//! ```
//!
//! Hold is one-way: a held group re-enters the flow only through a fresh
//! run. Confirmed groups are immutable; groups are never deleted — they
//! remain as audit trail.

use serde::{Deserialize, Serialize};

use super::{WeeklyInterval, WeeklySchedule};

/// Lifecycle status of a candidate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupStatus {
    /// Freshly produced by a run; awaiting a decision.
    Proposed,
    /// Parked by an operator; can still be rejected or confirmed.
    Held,
    /// Terminal: will never become a class.
    Rejected,
    /// Terminal: materialized into real scheduling entities.
    Confirmed,
}

/// A human decision applied to a candidate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionAction {
    /// Park the group without deciding.
    Hold,
    /// Discard the group (kept for audit).
    Reject,
    /// Materialize the group into a real class.
    Confirm,
}

impl std::fmt::Display for GroupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Proposed => "proposed",
            Self::Held => "held",
            Self::Rejected => "rejected",
            Self::Confirmed => "confirmed",
        };
        f.write_str(s)
    }
}

impl std::fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Hold => "hold",
            Self::Reject => "reject",
            Self::Confirm => "confirm",
        };
        f.write_str(s)
    }
}

impl GroupStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Rejected | Self::Confirmed)
    }

    /// Transition table of the approval workflow.
    pub fn can_apply(&self, action: DecisionAction) -> bool {
        match (self, action) {
            (Self::Proposed, _) => true,
            (Self::Held, DecisionAction::Reject | DecisionAction::Confirm) => true,
            _ => false,
        }
    }

    /// Status reached by applying an action.
    pub fn apply(&self, action: DecisionAction) -> Option<Self> {
        if !self.can_apply(action) {
            return None;
        }
        Some(match action {
            DecisionAction::Hold => Self::Held,
            DecisionAction::Reject => Self::Rejected,
            DecisionAction::Confirm => Self::Confirmed,
        })
    }
}

/// A ranked (instructor, room, slot) proposal attached to a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceProposal {
    /// Proposed instructor.
    pub instructor_id: String,
    /// Proposed room.
    pub room_id: String,
    /// Weekly slot the session would occupy.
    pub slot: WeeklyInterval,
    /// Expected revenue over the run.
    pub revenue: f64,
    /// Estimated instructor cost over the run.
    pub instructor_cost: f64,
    /// (revenue - cost) / revenue; -1.0 when revenue is zero.
    pub margin_pct: f64,
    /// Minutes of availability left around the slot in its block.
    pub slack_mins: u16,
}

/// A proposed class section under the approval workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateGroup {
    /// Unique group identifier.
    pub id: String,
    /// Owning allocation run.
    pub run_id: String,
    /// Index of the originating demand within the run.
    pub demand_index: usize,
    /// Members of this section (subset of the demand's students).
    pub student_ids: Vec<String>,
    /// Denormalized capacity bounds from the demand.
    pub min_capacity: u32,
    /// Denormalized capacity bounds from the demand.
    pub max_capacity: u32,
    /// Sessions to deliver, from the demand.
    pub planned_sessions: u32,
    /// Session duration the slot must cover (minutes).
    pub session_duration_mins: u16,
    /// Intersection of all members' weekly availability.
    pub common_windows: WeeklySchedule,
    /// Current workflow status.
    pub status: GroupStatus,
    /// Reason given with the last decision; empty while proposed.
    pub status_reason: String,
    /// Best surviving resource candidate, if any.
    pub proposed_resource: Option<ResourceProposal>,
    /// Runner-up candidates kept for manual override at confirmation.
    pub alternates: Vec<ResourceProposal>,
    /// Creation timestamp (ms since epoch).
    pub created_at_ms: u128,
    /// Decision timestamp (ms since epoch), once decided.
    pub decided_at_ms: Option<u128>,
    /// Operator who made the last decision.
    pub decided_by: Option<String>,
}

impl CandidateGroup {
    /// Current section size.
    pub fn size(&self) -> u32 {
        self.student_ids.len() as u32
    }

    /// Whether the matcher found no viable resource for this group.
    pub fn needs_manual_resourcing(&self) -> bool {
        self.proposed_resource.is_none()
    }

    /// Records a decision outcome on this group.
    pub(crate) fn record_decision(
        &mut self,
        status: GroupStatus,
        reason: impl Into<String>,
        decided_by: impl Into<String>,
        decided_at_ms: u128,
    ) {
        self.status = status;
        self.status_reason = reason.into();
        self.decided_by = Some(decided_by.into());
        self.decided_at_ms = Some(decided_at_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table_from_proposed() {
        let s = GroupStatus::Proposed;
        assert_eq!(s.apply(DecisionAction::Hold), Some(GroupStatus::Held));
        assert_eq!(s.apply(DecisionAction::Reject), Some(GroupStatus::Rejected));
        assert_eq!(
            s.apply(DecisionAction::Confirm),
            Some(GroupStatus::Confirmed)
        );
    }

    #[test]
    fn test_transition_table_from_held() {
        let s = GroupStatus::Held;
        // Hold is one-way; a held group cannot be held again
        assert_eq!(s.apply(DecisionAction::Hold), None);
        assert_eq!(s.apply(DecisionAction::Reject), Some(GroupStatus::Rejected));
        assert_eq!(
            s.apply(DecisionAction::Confirm),
            Some(GroupStatus::Confirmed)
        );
    }

    #[test]
    fn test_terminal_states_admit_nothing() {
        for s in [GroupStatus::Rejected, GroupStatus::Confirmed] {
            assert!(s.is_terminal());
            for a in [
                DecisionAction::Hold,
                DecisionAction::Reject,
                DecisionAction::Confirm,
            ] {
                assert_eq!(s.apply(a), None);
            }
        }
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&GroupStatus::Proposed).unwrap(),
            "\"proposed\""
        );
        assert_eq!(
            serde_json::to_string(&DecisionAction::Confirm).unwrap(),
            "\"confirm\""
        );
    }
}
