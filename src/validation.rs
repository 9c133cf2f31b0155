//! Demand normalization.
//!
//! Validates a raw [`DemandInput`] and canonicalizes it into a [`Demand`]:
//! capacity and pricing bounds, duplicate-free student ids, availability
//! keys that reference real students, well-formed weekly intervals, and
//! resolution of missing availability per the run's policy.
//!
//! Normalization is all-or-nothing per demand and reports the first
//! violated rule. One invalid demand does not abort a run — the caller
//! records the failure and continues with the remaining demands.

use std::collections::{HashMap, HashSet};

use crate::error::AllocationError;
use crate::models::{Demand, DemandInput, MissingAvailabilityPolicy, WeeklySchedule};

/// Validates and canonicalizes one demand.
///
/// `index` is the demand's position in the run request and is carried in
/// the error for per-demand reporting.
///
/// # Errors
/// [`AllocationError::InvalidDemand`] with the first violated rule.
pub fn normalize_demand(
    index: usize,
    input: &DemandInput,
    policy: MissingAvailabilityPolicy,
) -> Result<Demand, AllocationError> {
    let fail = |reason: String| AllocationError::InvalidDemand { index, reason };

    if input.course_level_id.trim().is_empty() {
        return Err(fail("courseLevelId is required".into()));
    }
    if input.student_ids.is_empty() {
        return Err(fail("studentIds must be non-empty".into()));
    }

    let mut seen = HashSet::new();
    for id in &input.student_ids {
        if id.trim().is_empty() {
            return Err(fail("studentIds must not contain blank ids".into()));
        }
        if !seen.insert(id.as_str()) {
            return Err(fail(format!("duplicate student id: {id}")));
        }
    }

    if input.min_capacity < 1 {
        return Err(fail("minCapacity must be >= 1".into()));
    }
    if input.max_capacity < input.min_capacity {
        return Err(fail(format!(
            "maxCapacity {} must be >= minCapacity {}",
            input.max_capacity, input.min_capacity
        )));
    }
    if input.planned_sessions < 1 {
        return Err(fail("plannedSessions must be >= 1".into()));
    }
    if input.session_duration_mins < 15 {
        return Err(fail("sessionDurationMins must be >= 15".into()));
    }
    if !(input.price_per_student >= 0.0) {
        return Err(fail("pricePerStudent must be >= 0".into()));
    }

    // Availability keys must reference students of this demand. Map
    // iteration is unordered, so sort to keep the reported key stable.
    let mut unknown: Vec<&str> = input
        .student_availability
        .keys()
        .map(String::as_str)
        .filter(|key| !seen.contains(key))
        .collect();
    unknown.sort_unstable();
    if let Some(key) = unknown.first() {
        return Err(fail(format!(
            "availability references unknown student: {key}"
        )));
    }

    let mut availability = HashMap::new();
    let mut excluded_students = Vec::new();

    for id in &input.student_ids {
        match input.student_availability.get(id) {
            Some(intervals) => {
                // Intervals were validated at construction when built in
                // process; re-check here so deserialized input cannot smuggle
                // malformed windows past the boundary.
                for iv in intervals {
                    crate::models::WeeklyInterval::new(iv.day, iv.start_min, iv.end_min)
                        .map_err(|e| fail(e.to_string()))?;
                }
                availability.insert(id.clone(), WeeklySchedule::normalize(intervals.clone()));
            }
            None => match policy {
                MissingAvailabilityPolicy::AssumeFullWeek => {
                    availability.insert(id.clone(), WeeklySchedule::full_week());
                }
                MissingAvailabilityPolicy::ExcludeStudent => {
                    excluded_students.push(id.clone());
                }
            },
        }
    }

    Ok(Demand {
        course_level_id: input.course_level_id.clone(),
        student_ids: input.student_ids.clone(),
        availability,
        excluded_students,
        required_skills: input
            .required_skills
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        min_capacity: input.min_capacity,
        max_capacity: input.max_capacity,
        planned_sessions: input.planned_sessions,
        session_duration_mins: input.session_duration_mins,
        price_per_student: input.price_per_student,
        preferred_location: input.preferred_location,
    })
}
