//! Directory views of instructors and rooms.
//!
//! Instructors and rooms are owned by external collaborators; the engine
//! only sees the read-only snapshots returned by the directory service:
//! identity, skills, availability, capacity, and a cost model. The engine
//! never mutates these — proposals are made against the snapshot and
//! re-validated at commit time.

use serde::{Deserialize, Serialize};

use super::{Location, WeeklySchedule};

/// How an instructor is paid.
///
/// Monthly cost is forecast by allocating a share of the monthly amount
/// proportional to the group's minutes over the instructor's total
/// available minutes in the run's date range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "amount")]
pub enum CostModel {
    /// Flat amount per delivered session.
    PerSession(f64),
    /// Amount per hour of teaching.
    Hourly(f64),
    /// Fixed monthly salary, allocated by utilization share.
    Monthly(f64),
}

impl CostModel {
    /// Estimated cost of delivering a group over the run's date range.
    ///
    /// # Arguments
    /// * `planned_sessions` - Sessions to deliver.
    /// * `session_duration_mins` - Length of one session.
    /// * `weekly_available_mins` - The instructor's weekly availability total.
    /// * `weeks` - Weeks in the run's date range (>= 1).
    pub fn cost(
        &self,
        planned_sessions: u32,
        session_duration_mins: u16,
        weekly_available_mins: u32,
        weeks: u32,
    ) -> f64 {
        let total_group_mins = planned_sessions as f64 * session_duration_mins as f64;
        match *self {
            Self::PerSession(amount) => amount * planned_sessions as f64,
            Self::Hourly(amount) => amount * total_group_mins / 60.0,
            Self::Monthly(amount) => {
                let total_avail_mins = (weekly_available_mins as f64 * weeks as f64).max(1.0);
                let share = (total_group_mins / total_avail_mins).min(1.0);
                amount * share
            }
        }
    }
}

/// An instructor as seen through the directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Instructor {
    /// Unique instructor identifier.
    pub id: String,
    /// Skills this instructor can teach.
    pub skills: Vec<String>,
    /// Weekly teaching availability.
    pub availability: WeeklySchedule,
    /// Cost model for economics computation.
    pub cost_model: CostModel,
}

impl Instructor {
    /// Creates an instructor with empty availability and no skills.
    pub fn new(id: impl Into<String>, cost_model: CostModel) -> Self {
        Self {
            id: id.into(),
            skills: Vec::new(),
            availability: WeeklySchedule::empty(),
            cost_model,
        }
    }

    /// Adds a skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.push(skill.into());
        self
    }

    /// Sets the weekly availability.
    pub fn with_availability(mut self, availability: WeeklySchedule) -> Self {
        self.availability = availability;
        self
    }

    /// Whether this instructor holds every required skill.
    ///
    /// Skill names compare case-insensitively.
    pub fn has_all_skills(&self, required: &[String]) -> bool {
        required.iter().all(|r| {
            self.skills
                .iter()
                .any(|s| s.eq_ignore_ascii_case(r.trim()))
        })
    }
}

/// A room as seen through the directory service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    /// Unique room identifier.
    pub id: String,
    /// Seats available.
    pub capacity: u32,
    /// Physical location.
    pub location: Location,
    /// Weekly availability.
    pub availability: WeeklySchedule,
}

impl Room {
    /// Creates a room with empty availability.
    pub fn new(id: impl Into<String>, capacity: u32, location: Location) -> Self {
        Self {
            id: id.into(),
            capacity,
            location,
            availability: WeeklySchedule::empty(),
        }
    }

    /// Sets the weekly availability.
    pub fn with_availability(mut self, availability: WeeklySchedule) -> Self {
        self.availability = availability;
        self
    }
}
