//! Resource matching for formed groups.
//!
//! Takes a group's common weekly windows and searches the directory
//! snapshot for compatible (instructor, room, slot) combinations:
//!
//! - the instructor must hold every required skill;
//! - the room must match the preferred location (when set) and seat the
//!   whole group;
//! - the slot is an intersection of group, instructor, and room
//!   availability at least `session_duration_mins` long.
//!
//! Surviving candidates are ranked by margin descending, then by
//! availability slack descending, with a deterministic id/slot tie-break.
//! The ranking is a pure comparator so it can be unit-tested without a
//! full run.

use std::cmp::Ordering;

use crate::grouping::FormedGroup;
use crate::models::{Demand, Instructor, ResourceProposal, Room, WeeklyInterval};

/// An evaluated (instructor, room, weekly-slot) tuple. Ephemeral — the
/// surviving candidates are persisted on the group as [`ResourceProposal`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceCandidate {
    /// Candidate instructor.
    pub instructor_id: String,
    /// Candidate room.
    pub room_id: String,
    /// Weekly slot of exactly one session length.
    pub slot: WeeklyInterval,
    /// Expected revenue over the run.
    pub revenue: f64,
    /// Estimated instructor cost over the run.
    pub instructor_cost: f64,
    /// (revenue - cost) / revenue; -1.0 when revenue is zero.
    pub margin_pct: f64,
    /// Minutes left in the availability block beyond the session.
    pub slack_mins: u16,
}

impl From<ResourceCandidate> for ResourceProposal {
    fn from(c: ResourceCandidate) -> Self {
        Self {
            instructor_id: c.instructor_id,
            room_id: c.room_id,
            slot: c.slot,
            revenue: c.revenue,
            instructor_cost: c.instructor_cost,
            margin_pct: c.margin_pct,
            slack_mins: c.slack_mins,
        }
    }
}

/// Result of matching one group.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// Best surviving candidate, if any.
    pub proposed: Option<ResourceProposal>,
    /// Runner-up candidates for manual override at confirmation time.
    pub alternates: Vec<ResourceProposal>,
}

/// Orders candidates: margin descending, slack descending, then
/// (instructor, room, day, start) ascending for determinism.
pub fn compare_resource_candidates(a: &ResourceCandidate, b: &ResourceCandidate) -> Ordering {
    b.margin_pct
        .partial_cmp(&a.margin_pct)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.slack_mins.cmp(&a.slack_mins))
        .then_with(|| a.instructor_id.cmp(&b.instructor_id))
        .then_with(|| a.room_id.cmp(&b.room_id))
        .then_with(|| (a.slot.day, a.slot.start_min).cmp(&(b.slot.day, b.slot.start_min)))
}

/// Finds, filters, and ranks resource candidates for one group.
///
/// # Arguments
/// * `weeks` - Weeks in the run window, for monthly cost allocation.
/// * `min_margin_pct` - Discard candidates below this margin, if set.
/// * `max_alternates` - Runner-ups to keep beyond the best candidate.
pub fn match_resources(
    group: &FormedGroup,
    demand: &Demand,
    instructors: &[Instructor],
    rooms: &[Room],
    weeks: u32,
    min_margin_pct: Option<f64>,
    max_alternates: usize,
) -> MatchOutcome {
    let size = group.student_ids.len() as u32;
    let duration = demand.session_duration_mins;
    let revenue = demand.price_per_student * size as f64 * demand.planned_sessions as f64;

    let mut candidates = Vec::new();

    for instructor in instructors {
        if !instructor.has_all_skills(&demand.required_skills) {
            continue;
        }
        let cost = instructor.cost_model.cost(
            demand.planned_sessions,
            duration,
            instructor.availability.total_minutes(),
            weeks,
        );
        let margin_pct = if revenue > 0.0 {
            (revenue - cost) / revenue
        } else {
            -1.0
        };
        if let Some(min) = min_margin_pct {
            if margin_pct < min {
                continue;
            }
        }

        let with_instructor = group.common_windows.intersect(&instructor.availability);
        if !with_instructor.has_block_of(duration) {
            continue;
        }

        for room in rooms {
            if room.capacity < size {
                continue;
            }
            if let Some(preferred) = demand.preferred_location {
                if room.location != preferred {
                    continue;
                }
            }

            let viable = with_instructor.intersect(&room.availability);
            for block in viable.intervals() {
                if block.duration_min() < duration {
                    continue;
                }
                // One candidate per block, anchored at the block start
                let slot = WeeklyInterval {
                    day: block.day,
                    start_min: block.start_min,
                    end_min: block.start_min + duration,
                };
                candidates.push(ResourceCandidate {
                    instructor_id: instructor.id.clone(),
                    room_id: room.id.clone(),
                    slot,
                    revenue,
                    instructor_cost: cost,
                    margin_pct,
                    slack_mins: block.duration_min() - duration,
                });
            }
        }
    }

    candidates.sort_by(compare_resource_candidates);

    let mut iter = candidates.into_iter();
    let proposed = iter.next().map(ResourceProposal::from);
    let alternates = iter
        .take(max_alternates)
        .map(ResourceProposal::from)
        .collect();

    MatchOutcome {
        proposed,
        alternates,
    }
}
