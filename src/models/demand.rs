//! Course-demand input and its canonical form.
//!
//! A demand is one row of requested course coverage: a cohort of students
//! wanting a course level, with per-student weekly availability, capacity
//! bounds, session shape, and pricing. [`DemandInput`] is the boundary type
//! (what callers submit); [`Demand`] is the canonical record produced by
//! the normalizer in [`crate::validation`], with every remaining student
//! mapped to a normalized [`WeeklySchedule`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{WeeklyInterval, WeeklySchedule};

/// Physical location of a room or a demand's preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// In-person, on campus.
    OnSite,
    /// Fully remote delivery.
    Remote,
    /// Mixed delivery.
    Hybrid,
}

/// A raw course-demand submitted in a run request.
///
/// Availability is a typed map from student id to weekly intervals — unknown
/// shapes are rejected at deserialization, not propagated into the matcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemandInput {
    /// Requested course level.
    pub course_level_id: String,
    /// Students requesting the course. Must be non-empty and duplicate-free.
    pub student_ids: Vec<String>,
    /// Weekly availability per student. Keys must appear in `student_ids`;
    /// students absent from the map fall under the run's
    /// missing-availability policy.
    #[serde(default)]
    pub student_availability: HashMap<String, Vec<WeeklyInterval>>,
    /// Skills the assigned instructor must hold (all of them).
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// Smallest viable section size (>= 1).
    pub min_capacity: u32,
    /// Largest allowed section size (>= min_capacity).
    pub max_capacity: u32,
    /// Number of sessions to deliver (>= 1).
    pub planned_sessions: u32,
    /// Duration of one session in minutes (>= 15).
    pub session_duration_mins: u16,
    /// Price charged per student for the whole course (>= 0).
    pub price_per_student: f64,
    /// Room location constraint, if any.
    #[serde(default)]
    pub preferred_location: Option<Location>,
}

impl DemandInput {
    /// Creates a demand with the required fields; availability and skills
    /// are added with the builder methods.
    pub fn new(
        course_level_id: impl Into<String>,
        student_ids: Vec<String>,
        min_capacity: u32,
        max_capacity: u32,
        planned_sessions: u32,
        session_duration_mins: u16,
        price_per_student: f64,
    ) -> Self {
        Self {
            course_level_id: course_level_id.into(),
            student_ids,
            student_availability: HashMap::new(),
            required_skills: Vec::new(),
            min_capacity,
            max_capacity,
            planned_sessions,
            session_duration_mins,
            price_per_student,
            preferred_location: None,
        }
    }

    /// Sets one student's weekly availability.
    pub fn with_availability(
        mut self,
        student_id: impl Into<String>,
        intervals: Vec<WeeklyInterval>,
    ) -> Self {
        self.student_availability.insert(student_id.into(), intervals);
        self
    }

    /// Adds a required instructor skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.push(skill.into());
        self
    }

    /// Sets the preferred room location.
    pub fn with_location(mut self, location: Location) -> Self {
        self.preferred_location = Some(location);
        self
    }
}

/// A validated, canonicalized demand.
///
/// Produced by [`crate::validation::normalize_demand`]. `availability`
/// holds exactly the students eligible for grouping: under the full-week
/// policy that is every student; under the exclude policy, students who
/// supplied no availability are listed in `excluded_students` instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Demand {
    /// Requested course level.
    pub course_level_id: String,
    /// All students of the demand, in submission order.
    pub student_ids: Vec<String>,
    /// Normalized weekly schedule per groupable student.
    pub availability: HashMap<String, WeeklySchedule>,
    /// Students dropped from grouping by the missing-availability policy.
    pub excluded_students: Vec<String>,
    /// Required instructor skills.
    pub required_skills: Vec<String>,
    /// Smallest viable section size.
    pub min_capacity: u32,
    /// Largest allowed section size.
    pub max_capacity: u32,
    /// Number of sessions to deliver.
    pub planned_sessions: u32,
    /// Duration of one session in minutes.
    pub session_duration_mins: u16,
    /// Price charged per student for the whole course.
    pub price_per_student: f64,
    /// Room location constraint, if any.
    pub preferred_location: Option<Location>,
}

impl Demand {
    /// Weekly schedule for a student, if eligible for grouping.
    pub fn schedule_for(&self, student_id: &str) -> Option<&WeeklySchedule> {
        self.availability.get(student_id)
    }
}
