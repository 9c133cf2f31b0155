//! Allocation run orchestrator.
//!
//! Drives the full pipeline over a batch of demands — normalize, group,
//! match — persists the resulting run and candidate groups, and exposes
//! the approval workflow (hold / reject / confirm).
//!
//! # Concurrency model
//!
//! Proposals are computed against a read-only directory snapshot with no
//! locks held (optimistic concurrency). Confirmation therefore re-checks
//! resource freedom against the scheduling collaborator and relies on its
//! uniqueness guarantee as the commit-time source of truth: of two
//! concurrent confirmations targeting the same instructor/room/slot,
//! exactly one succeeds and the other observes `ResourceConflict`.
//!
//! Confirmation is all-or-nothing: either materialization succeeds and the
//! group becomes `confirmed`, or the group keeps its prior status and no
//! partial entities remain.

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, info};
use uuid::Uuid;

use crate::collaborators::{Directory, MaterializeRequest, Scheduling};
use crate::error::AllocationError;
use crate::grouping::form_groups;
use crate::matching::match_resources;
use crate::models::{
    AllocationRun, CandidateGroup, DecisionAction, DemandOutcome, DemandReport, GroupStatus,
    RunRequest, WeeklySchedule,
};
use crate::store::RunStore;
use crate::validation::normalize_demand;

/// The allocation engine: run execution plus the approval workflow.
pub struct AllocationEngine<D, S, R> {
    directory: D,
    scheduling: S,
    store: R,
}

impl<D: Directory, S: Scheduling, R: RunStore> AllocationEngine<D, S, R> {
    /// Creates an engine over the given collaborators and store.
    pub fn new(directory: D, scheduling: S, store: R) -> Self {
        Self {
            directory,
            scheduling,
            store,
        }
    }

    /// The scheduling collaborator (e.g. for test inspection).
    pub fn scheduling(&self) -> &S {
        &self.scheduling
    }

    /// Executes a run over a batch of demands.
    ///
    /// Individual bad demands never fail the run — they are reported in
    /// the run's [`DemandReport`]s and processing continues.
    ///
    /// # Errors
    /// [`AllocationError::InvalidRunWindow`] when the date range is
    /// malformed or inverted.
    pub fn create_run(&self, request: RunRequest) -> Result<AllocationRun, AllocationError> {
        request.validate_window()?;

        let run_id = Uuid::new_v4().to_string();
        let created_at_ms = now_ms();
        let weeks = request.weeks();

        let mut reports = Vec::with_capacity(request.demands.len());
        let mut group_ids = Vec::new();

        for (index, input) in request.demands.iter().enumerate() {
            let demand = match normalize_demand(index, input, request.params.missing_availability)
            {
                Ok(demand) => demand,
                Err(AllocationError::InvalidDemand { reason, .. }) => {
                    debug!(run_id, index, %reason, "demand rejected");
                    reports.push(DemandReport {
                        demand_index: index,
                        outcome: DemandOutcome::Rejected { reason },
                    });
                    continue;
                }
                Err(other) => {
                    // Normalization only emits InvalidDemand; anything else
                    // is still recorded rather than aborting the run
                    reports.push(DemandReport {
                        demand_index: index,
                        outcome: DemandOutcome::Rejected {
                            reason: other.to_string(),
                        },
                    });
                    continue;
                }
            };

            let grouping = form_groups(&demand);
            if grouping.groups.is_empty() {
                debug!(run_id, index, "insufficient demand");
                reports.push(DemandReport {
                    demand_index: index,
                    outcome: DemandOutcome::Insufficient {
                        unplaced_students: grouping.unplaced_students,
                    },
                });
                continue;
            }

            let group_count = grouping.groups.len();
            for formed in grouping.groups {
                let instructors = self
                    .directory
                    .find_instructors(&demand.required_skills, &formed.common_windows);
                let rooms = self.directory.find_rooms(
                    demand.preferred_location,
                    formed.student_ids.len() as u32,
                    &formed.common_windows,
                );

                let matched = match_resources(
                    &formed,
                    &demand,
                    &instructors,
                    &rooms,
                    weeks,
                    request.params.min_margin_pct,
                    request.params.max_alternates,
                );

                let group = CandidateGroup {
                    id: Uuid::new_v4().to_string(),
                    run_id: run_id.clone(),
                    demand_index: index,
                    student_ids: formed.student_ids,
                    min_capacity: demand.min_capacity,
                    max_capacity: demand.max_capacity,
                    planned_sessions: demand.planned_sessions,
                    session_duration_mins: demand.session_duration_mins,
                    common_windows: formed.common_windows,
                    status: GroupStatus::Proposed,
                    status_reason: String::new(),
                    proposed_resource: matched.proposed,
                    alternates: matched.alternates,
                    created_at_ms,
                    decided_at_ms: None,
                    decided_by: None,
                };
                group_ids.push(group.id.clone());
                self.store.insert_group(group);
            }

            reports.push(DemandReport {
                demand_index: index,
                outcome: DemandOutcome::Grouped {
                    groups: group_count,
                    unplaced_students: grouping.unplaced_students,
                },
            });
        }

        let run = AllocationRun {
            id: run_id.clone(),
            from_date: request.from_date,
            to_date: request.to_date,
            notes: request.notes,
            params: request.params,
            reports,
            group_ids,
            created_at_ms,
        };
        info!(
            run_id,
            demands = request.demands.len(),
            groups = run.group_ids.len(),
            "allocation run created"
        );
        self.store.insert_run(run.clone());
        Ok(run)
    }

    /// Fetches a run by id.
    pub fn get_run(&self, run_id: &str) -> Result<AllocationRun, AllocationError> {
        self.store.get_run(run_id)
    }

    /// Fetches a candidate group by id.
    pub fn get_group(&self, group_id: &str) -> Result<CandidateGroup, AllocationError> {
        self.store.get_group(group_id)
    }

    /// All candidate groups of a run, in creation order.
    pub fn groups_for_run(&self, run_id: &str) -> Result<Vec<CandidateGroup>, AllocationError> {
        self.store.get_run(run_id)?;
        Ok(self.store.groups_for_run(run_id))
    }

    /// Applies a hold or reject decision to a group.
    ///
    /// # Errors
    /// [`AllocationError::InvalidTransition`] when the group is terminal,
    /// already held (for hold), the reason is blank, or the action is
    /// `Confirm` (confirmation goes through [`Self::confirm_group`]).
    pub fn update_group_status(
        &self,
        group_id: &str,
        action: DecisionAction,
        reason: &str,
        decided_by: &str,
    ) -> Result<CandidateGroup, AllocationError> {
        let mut group = self.store.get_group(group_id)?;

        if action == DecisionAction::Confirm {
            return Err(AllocationError::InvalidTransition {
                status: group.status,
                action,
                reason: "confirmation requires the confirm operation".into(),
            });
        }
        let next = self.checked_transition(&group, action, reason)?;

        group.record_decision(next, reason.trim(), decided_by, now_ms());
        self.store.update_group(group.clone())?;
        info!(group_id, status = %next, "group status updated");
        Ok(group)
    }

    /// Confirms a group and materializes it into real scheduling entities.
    ///
    /// `instructor_id` / `room_id` override the proposed resource; omitted
    /// values fall back to the proposal. Overriding requires a detailed
    /// reason and an existing resource. The group's size, the run's margin
    /// floor, and slot freedom are all re-checked at commit time — the
    /// proposal was made against a snapshot that may have gone stale.
    ///
    /// # Errors
    /// - [`AllocationError::InvalidTransition`]: terminal group, blank or
    ///   too-short reason, no resolvable resource, under-min group, or
    ///   margin below the run's floor.
    /// - [`AllocationError::NotFound`]: an override names an unknown
    ///   instructor or room.
    /// - [`AllocationError::ResourceConflict`]: the slot is no longer free.
    /// - [`AllocationError::MaterializationFailed`]: collaborator failure;
    ///   the group keeps its prior status.
    pub fn confirm_group(
        &self,
        group_id: &str,
        reason: &str,
        instructor_id: Option<&str>,
        room_id: Option<&str>,
        decided_by: &str,
    ) -> Result<CandidateGroup, AllocationError> {
        let mut group = self.store.get_group(group_id)?;
        let action = DecisionAction::Confirm;
        let refuse = |status, reason: String| AllocationError::InvalidTransition {
            status,
            action,
            reason,
        };

        let next = self.checked_transition(&group, action, reason)?;

        if group.size() < group.min_capacity {
            return Err(refuse(
                group.status,
                format!(
                    "group has {} members, below the minimum of {}",
                    group.size(),
                    group.min_capacity
                ),
            ));
        }
        if (instructor_id.is_some() || room_id.is_some()) && reason.trim().len() < 10 {
            return Err(refuse(
                group.status,
                "overriding the proposed resource requires a detailed reason".into(),
            ));
        }

        let mut resource = group.proposed_resource.clone().ok_or_else(|| {
            refuse(
                group.status,
                "group needs manual resourcing; no proposal to confirm".into(),
            )
        })?;
        let week = WeeklySchedule::full_week();
        if let Some(id) = instructor_id {
            if !self
                .directory
                .find_instructors(&[], &week)
                .iter()
                .any(|i| i.id == id)
            {
                return Err(AllocationError::NotFound(format!("instructor {id}")));
            }
            resource.instructor_id = id.to_string();
        }
        if let Some(id) = room_id {
            let rooms = self.directory.find_rooms(None, 0, &week);
            let room = rooms
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| AllocationError::NotFound(format!("room {id}")))?;
            if room.capacity < group.size() {
                return Err(refuse(
                    group.status,
                    format!(
                        "room {id} seats {}, group has {} members",
                        room.capacity,
                        group.size()
                    ),
                ));
            }
            resource.room_id = id.to_string();
        }

        // The proposal's economics only describe the proposed instructor;
        // an overriding operator takes responsibility via the reason
        if instructor_id.is_none() {
            let run = self.store.get_run(&group.run_id)?;
            if let Some(min) = run.params.min_margin_pct {
                if resource.margin_pct < min {
                    return Err(refuse(
                        group.status,
                        format!(
                            "margin {:.2} is below the run minimum {min:.2}",
                            resource.margin_pct
                        ),
                    ));
                }
            }
        }

        // Second check: proposals were made against a snapshot, another
        // confirmation may have taken the slot since
        if !self
            .scheduling
            .slot_is_free(&resource.instructor_id, &resource.room_id, &resource.slot)
        {
            return Err(AllocationError::ResourceConflict(format!(
                "instructor {} or room {} no longer free for the proposed slot",
                resource.instructor_id, resource.room_id
            )));
        }

        let materialization = self.scheduling.materialize(&MaterializeRequest {
            group_id: group.id.clone(),
            instructor_id: resource.instructor_id.clone(),
            room_id: resource.room_id.clone(),
            slot: resource.slot,
            planned_sessions: group.planned_sessions,
            session_duration_mins: group.session_duration_mins,
        })?;

        group.proposed_resource = Some(resource);
        group.record_decision(next, reason.trim(), decided_by, now_ms());
        self.store.update_group(group.clone())?;
        info!(
            group_id,
            class_id = %materialization.class_id,
            sessions = materialization.session_ids.len(),
            "group confirmed and materialized"
        );
        Ok(group)
    }

    /// Validates an action against the state machine and reason contract.
    fn checked_transition(
        &self,
        group: &CandidateGroup,
        action: DecisionAction,
        reason: &str,
    ) -> Result<GroupStatus, AllocationError> {
        if reason.trim().is_empty() {
            return Err(AllocationError::InvalidTransition {
                status: group.status,
                action,
                reason: "a reason is required".into(),
            });
        }
        group
            .status
            .apply(action)
            .ok_or_else(|| AllocationError::InvalidTransition {
                status: group.status,
                action,
                reason: if group.status.is_terminal() {
                    "group is terminal".into()
                } else {
                    format!("{action} is not allowed from {}", group.status)
                },
            })
    }
}

fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
