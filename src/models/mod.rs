//! Allocation domain models.
//!
//! Core data types of the allocation engine: weekly availability, course
//! demands, directory views of instructors and rooms, candidate groups
//! with their approval state machine, and allocation runs.
//!
//! # Ownership
//!
//! The engine exclusively owns [`AllocationRun`] and the lifecycle of its
//! [`CandidateGroup`]s. Students, instructors, rooms, and course levels are
//! owned by external collaborators and referenced here only by identifier.

mod availability;
mod demand;
mod group;
mod resource;
mod run;

pub use availability::{WeeklyInterval, WeeklySchedule, MINUTES_PER_DAY};
pub use demand::{Demand, DemandInput, Location};
pub use group::{CandidateGroup, DecisionAction, GroupStatus, ResourceProposal};
pub use resource::{CostModel, Instructor, Room};
pub use run::{
    AllocationRun, DemandOutcome, DemandReport, MissingAvailabilityPolicy, RunParams, RunRequest,
};
