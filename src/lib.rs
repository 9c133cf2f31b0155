//! Allocation engine for cohort-based course scheduling.
//!
//! Turns a batch of course demands — cohorts of students with weekly
//! availability, capacity bounds, and pricing — into candidate class
//! groups with proposed instructor/room/slot assignments, then walks
//! each group through a human approval workflow ending in rejection or
//! materialization into real scheduling entities.
//!
//! # Pipeline
//!
//! 1. **`validation`**: normalize each [`models::DemandInput`] into a
//!    canonical [`models::Demand`] or reject it with a reason.
//! 2. **`grouping`**: partition a demand's students into groups that
//!    share a weekly window long enough for a session.
//! 3. **`matching`**: rank (instructor, room, slot) candidates for each
//!    group by margin, then slack.
//! 4. **`engine`**: orchestrate a run over the batch, persist results via
//!    a [`store::RunStore`], and drive the hold/reject/confirm workflow.
//!
//! # Collaborators
//!
//! The engine does not own people, rooms, or calendars. It reads them
//! through [`collaborators::Directory`] and commits confirmed groups
//! through [`collaborators::Scheduling`], whose uniqueness guarantee on
//! resource slots is the source of truth at confirmation time.

pub mod collaborators;
pub mod engine;
pub mod error;
pub mod grouping;
pub mod matching;
pub mod models;
pub mod store;
pub mod validation;

pub use engine::AllocationEngine;
pub use error::AllocationError;
