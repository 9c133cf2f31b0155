//! External collaborator contracts and in-memory reference implementations.
//!
//! The engine consumes two abstract services:
//!
//! - [`Directory`]: read-only snapshot queries for instructors and rooms.
//!   Proposals are made against this snapshot without holding any lock,
//!   which is why confirmation re-validates.
//! - [`Scheduling`]: the transactional owner of real calendars. Its
//!   uniqueness guarantee on instructor+slot and room+slot is the source
//!   of truth at commit time; [`Scheduling::materialize`] is atomic and
//!   idempotent per group id.
//!
//! The in-memory implementations back the test suite and document the
//! expected collaborator semantics.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AllocationError;
use crate::models::{Instructor, Location, Room, WeeklyInterval, WeeklySchedule};

/// Read-only directory of instructors and rooms.
pub trait Directory {
    /// Instructors holding every required skill whose availability
    /// overlaps the given windows.
    fn find_instructors(
        &self,
        required_skills: &[String],
        windows: &WeeklySchedule,
    ) -> Vec<Instructor>;

    /// Rooms at the given location (when set) with at least `min_capacity`
    /// seats whose availability overlaps the given windows.
    fn find_rooms(
        &self,
        location: Option<Location>,
        min_capacity: u32,
        windows: &WeeklySchedule,
    ) -> Vec<Room>;
}

/// Request to turn a confirmed group into real scheduling entities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializeRequest {
    /// Group being confirmed; idempotency key.
    pub group_id: String,
    /// Final instructor.
    pub instructor_id: String,
    /// Final room.
    pub room_id: String,
    /// Weekly slot the class occupies.
    pub slot: WeeklyInterval,
    /// Sessions to create.
    pub planned_sessions: u32,
    /// Length of one session (minutes).
    pub session_duration_mins: u16,
}

/// Entities created by a successful materialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Materialization {
    /// The created class.
    pub class_id: String,
    /// The created sessions, one per planned session.
    pub session_ids: Vec<String>,
}

/// Transactional scheduling collaborator.
pub trait Scheduling {
    /// Whether both the instructor and the room are still free for the
    /// slot. Used for the commit-time re-check.
    fn slot_is_free(&self, instructor_id: &str, room_id: &str, slot: &WeeklyInterval) -> bool;

    /// Atomically creates the class and its sessions.
    ///
    /// Idempotent: a repeated call with a group id that already
    /// materialized returns the existing entities instead of duplicating.
    ///
    /// # Errors
    /// [`AllocationError::ResourceConflict`] when the instructor or room is
    /// already booked for an overlapping slot;
    /// [`AllocationError::MaterializationFailed`] for collaborator-side
    /// failures. Either way, no partial entities remain.
    fn materialize(&self, req: &MaterializeRequest) -> Result<Materialization, AllocationError>;
}

/// Directory backed by in-process lists.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    instructors: Vec<Instructor>,
    rooms: Vec<Room>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an instructor.
    pub fn with_instructor(mut self, instructor: Instructor) -> Self {
        self.instructors.push(instructor);
        self
    }

    /// Adds a room.
    pub fn with_room(mut self, room: Room) -> Self {
        self.rooms.push(room);
        self
    }
}

impl Directory for InMemoryDirectory {
    fn find_instructors(
        &self,
        required_skills: &[String],
        windows: &WeeklySchedule,
    ) -> Vec<Instructor> {
        self.instructors
            .iter()
            .filter(|i| i.has_all_skills(required_skills))
            .filter(|i| i.availability.overlap_minutes(windows) > 0)
            .cloned()
            .collect()
    }

    fn find_rooms(
        &self,
        location: Option<Location>,
        min_capacity: u32,
        windows: &WeeklySchedule,
    ) -> Vec<Room> {
        self.rooms
            .iter()
            .filter(|r| location.map_or(true, |l| r.location == l))
            .filter(|r| r.capacity >= min_capacity)
            .filter(|r| r.availability.overlap_minutes(windows) > 0)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone)]
struct Booking {
    instructor_id: String,
    room_id: String,
    slot: WeeklyInterval,
}

#[derive(Debug, Default)]
struct SchedulingState {
    bookings: Vec<Booking>,
    materialized: HashMap<String, Materialization>,
    fail_next: bool,
}

/// Scheduling collaborator backed by in-process state.
///
/// Enforces the uniqueness guarantee under a single lock: a booking
/// conflicts when it shares an instructor or room with an existing one
/// and the weekly slots overlap.
#[derive(Debug, Default)]
pub struct InMemoryScheduling {
    state: Mutex<SchedulingState>,
}

impl InMemoryScheduling {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next materialization fail after passing the conflict
    /// check, without creating anything. Exercises the all-or-nothing
    /// contract in tests.
    pub fn fail_next_materialization(&self) {
        self.state.lock().fail_next = true;
    }

    /// Number of materialized classes.
    pub fn materialized_count(&self) -> usize {
        self.state.lock().materialized.len()
    }
}

impl Scheduling for InMemoryScheduling {
    fn slot_is_free(&self, instructor_id: &str, room_id: &str, slot: &WeeklyInterval) -> bool {
        let state = self.state.lock();
        !state.bookings.iter().any(|b| {
            (b.instructor_id == instructor_id || b.room_id == room_id) && b.slot.overlaps(slot)
        })
    }

    fn materialize(&self, req: &MaterializeRequest) -> Result<Materialization, AllocationError> {
        let mut state = self.state.lock();

        // Idempotency: repeated confirm of the same group returns the
        // existing entities
        if let Some(existing) = state.materialized.get(&req.group_id) {
            return Ok(existing.clone());
        }

        for b in &state.bookings {
            if b.slot.overlaps(&req.slot) {
                if b.instructor_id == req.instructor_id {
                    return Err(AllocationError::ResourceConflict(format!(
                        "instructor {} already booked for an overlapping slot",
                        req.instructor_id
                    )));
                }
                if b.room_id == req.room_id {
                    return Err(AllocationError::ResourceConflict(format!(
                        "room {} already booked for an overlapping slot",
                        req.room_id
                    )));
                }
            }
        }

        if state.fail_next {
            state.fail_next = false;
            return Err(AllocationError::MaterializationFailed(
                "scheduling backend unavailable".into(),
            ));
        }

        let materialization = Materialization {
            class_id: Uuid::new_v4().to_string(),
            session_ids: (0..req.planned_sessions)
                .map(|_| Uuid::new_v4().to_string())
                .collect(),
        };

        state.bookings.push(Booking {
            instructor_id: req.instructor_id.clone(),
            room_id: req.room_id.clone(),
            slot: req.slot,
        });
        state
            .materialized
            .insert(req.group_id.clone(), materialization.clone());

        Ok(materialization)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CostModel;

    fn iv(day: u8, start: u16, end: u16) -> WeeklyInterval {
        WeeklyInterval::new(day, start, end).unwrap()
    }

    fn sched(ivs: Vec<WeeklyInterval>) -> WeeklySchedule {
        WeeklySchedule::normalize(ivs)
    }

    fn request(group_id: &str, instructor: &str, room: &str, slot: WeeklyInterval) -> MaterializeRequest {
        MaterializeRequest {
            group_id: group_id.into(),
            instructor_id: instructor.into(),
            room_id: room.into(),
            slot,
            planned_sessions: 4,
            session_duration_mins: 60,
        }
    }

    #[test]
    fn test_directory_filters() {
        let dir = InMemoryDirectory::new()
            .with_instructor(
                Instructor::new("i1", CostModel::Hourly(50.0))
                    .with_skill("python")
                    .with_availability(sched(vec![iv(1, 540, 720)])),
            )
            .with_instructor(
                Instructor::new("i2", CostModel::Hourly(50.0))
                    .with_availability(sched(vec![iv(1, 540, 720)])),
            )
            .with_room(Room::new("r1", 10, Location::OnSite).with_availability(sched(vec![iv(1, 0, 1440)])))
            .with_room(Room::new("r2", 4, Location::Remote).with_availability(sched(vec![iv(1, 0, 1440)])));

        let windows = sched(vec![iv(1, 600, 660)]);

        let skilled = dir.find_instructors(&["python".into()], &windows);
        assert_eq!(skilled.len(), 1);
        assert_eq!(skilled[0].id, "i1");

        // No skill requirement → both, filtered by overlap
        assert_eq!(dir.find_instructors(&[], &windows).len(), 2);
        assert!(dir
            .find_instructors(&[], &sched(vec![iv(2, 600, 660)]))
            .is_empty());

        let rooms = dir.find_rooms(Some(Location::OnSite), 5, &windows);
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].id, "r1");

        // Capacity filter
        assert!(dir.find_rooms(None, 11, &windows).is_empty());
    }

    #[test]
    fn test_materialize_creates_entities() {
        let s = InMemoryScheduling::new();
        let m = s.materialize(&request("g1", "i1", "r1", iv(1, 540, 600))).unwrap();
        assert_eq!(m.session_ids.len(), 4);
        assert_eq!(s.materialized_count(), 1);
    }

    #[test]
    fn test_materialize_idempotent_per_group() {
        let s = InMemoryScheduling::new();
        let req = request("g1", "i1", "r1", iv(1, 540, 600));
        let first = s.materialize(&req).unwrap();
        let second = s.materialize(&req).unwrap();
        assert_eq!(first, second);
        assert_eq!(s.materialized_count(), 1);
    }

    #[test]
    fn test_instructor_conflict() {
        let s = InMemoryScheduling::new();
        s.materialize(&request("g1", "i1", "r1", iv(1, 540, 600))).unwrap();

        // Same instructor, overlapping slot, different room
        let err = s
            .materialize(&request("g2", "i1", "r2", iv(1, 570, 630)))
            .unwrap_err();
        assert!(matches!(err, AllocationError::ResourceConflict(_)));
    }

    #[test]
    fn test_room_conflict() {
        let s = InMemoryScheduling::new();
        s.materialize(&request("g1", "i1", "r1", iv(1, 540, 600))).unwrap();

        let err = s
            .materialize(&request("g2", "i2", "r1", iv(1, 540, 600)))
            .unwrap_err();
        assert!(matches!(err, AllocationError::ResourceConflict(_)));
    }

    #[test]
    fn test_non_overlapping_slots_coexist() {
        let s = InMemoryScheduling::new();
        s.materialize(&request("g1", "i1", "r1", iv(1, 540, 600))).unwrap();

        // Same resources, later slot
        assert!(s.materialize(&request("g2", "i1", "r1", iv(1, 600, 660))).is_ok());
        // Same times, different day
        assert!(s.materialize(&request("g3", "i1", "r1", iv(2, 540, 600))).is_ok());
    }

    #[test]
    fn test_slot_is_free_tracks_bookings() {
        let s = InMemoryScheduling::new();
        assert!(s.slot_is_free("i1", "r1", &iv(1, 540, 600)));

        s.materialize(&request("g1", "i1", "r1", iv(1, 540, 600))).unwrap();
        assert!(!s.slot_is_free("i1", "r9", &iv(1, 540, 600)));
        assert!(!s.slot_is_free("i9", "r1", &iv(1, 570, 630)));
        assert!(s.slot_is_free("i9", "r9", &iv(1, 540, 600)));
    }

    #[test]
    fn test_injected_failure_leaves_no_state() {
        let s = InMemoryScheduling::new();
        s.fail_next_materialization();

        let err = s
            .materialize(&request("g1", "i1", "r1", iv(1, 540, 600)))
            .unwrap_err();
        assert!(matches!(err, AllocationError::MaterializationFailed(_)));
        assert_eq!(s.materialized_count(), 0);
        assert!(s.slot_is_free("i1", "r1", &iv(1, 540, 600)));

        // Failure is one-shot; the retry succeeds
        assert!(s.materialize(&request("g1", "i1", "r1", iv(1, 540, 600))).is_ok());
    }
}
