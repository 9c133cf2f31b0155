//! Greedy grouping of a demand's students into candidate sections.
//!
//! # Algorithm
//!
//! 1. Compute every pair of students' total weekly overlap minutes.
//! 2. Seed a group from the student with the highest total overlap against
//!    the rest of the pool (highest-degree heuristic).
//! 3. Grow the group greedily: add the student whose inclusion keeps the
//!    group's *common* intersection (across all members, not pairwise)
//!    holding at least one contiguous block of `session_duration_mins`.
//!    Among compatible candidates, prefer the one that keeps the most of
//!    the remaining pool compatible with the shrunken window — the
//!    candidate stranding the fewest students needs the fewest future
//!    groups — then the lowest student id.
//! 4. Stop at `max_capacity` or when no compatible student remains. Accept
//!    the group if its size reaches `min_capacity`; otherwise retire the
//!    seed as unplaced and fold the other members into the next attempt.
//!
//! All choices are resolved by pure comparators with a lowest-student-id
//! final tie-break, so grouping is fully deterministic.
//!
//! # Complexity
//! O(n^2) schedule intersections per demand, n = students in the pool.

use std::cmp::Ordering;

use crate::models::{Demand, WeeklySchedule};

/// A group formed by the grouping engine, before resource matching.
#[derive(Debug, Clone)]
pub struct FormedGroup {
    /// Members, in the order they were added.
    pub student_ids: Vec<String>,
    /// Intersection of all members' weekly availability.
    pub common_windows: WeeklySchedule,
}

/// Result of grouping one demand.
#[derive(Debug, Clone, Default)]
pub struct GroupingOutcome {
    /// Accepted groups (size within capacity bounds).
    pub groups: Vec<FormedGroup>,
    /// Students that did not land in any accepted group, including those
    /// excluded by the missing-availability policy.
    pub unplaced_students: Vec<String>,
}

/// Orders growth candidates: more remaining students kept compatible
/// first (the choice needing the fewest future groups), then lowest
/// student id.
pub fn compare_candidates(
    a: (&str, u32),
    b: (&str, u32),
) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Orders seed candidates: highest total overlap with the rest of the
/// pool first, then lowest student id.
pub fn compare_seeds(a: (&str, u32), b: (&str, u32)) -> Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0))
}

/// Partitions a demand's students into candidate groups.
///
/// Produces zero groups when no subset of students meets `min_capacity`
/// with a common window long enough for one session — the caller reports
/// that as insufficient demand, not as a failure.
pub fn form_groups(demand: &Demand) -> GroupingOutcome {
    let duration = demand.session_duration_mins;

    // Pool keeps submission order for deterministic iteration; only
    // students the policy left eligible participate.
    let mut pool: Vec<&str> = demand
        .student_ids
        .iter()
        .map(String::as_str)
        .filter(|id| demand.availability.contains_key(*id))
        .collect();

    let mut outcome = GroupingOutcome {
        unplaced_students: demand.excluded_students.clone(),
        ..Default::default()
    };

    while !pool.is_empty() {
        // Students whose own availability cannot host one session can
        // never join any group
        if let Some(pos) = pool
            .iter()
            .position(|id| !demand.availability[*id].has_block_of(duration))
        {
            outcome.unplaced_students.push(pool.remove(pos).to_string());
            continue;
        }

        let seed = pick_seed(&pool, demand);
        let attempt = grow_group(seed, &pool, demand);

        if attempt.student_ids.len() as u32 >= demand.min_capacity {
            pool.retain(|id| !attempt.student_ids.iter().any(|m| m.as_str() == *id));
            outcome.groups.push(attempt);
        } else {
            // Under-min attempt: retire the seed, keep the rest for the
            // next attempt
            pool.retain(|id| *id != seed);
            outcome.unplaced_students.push(seed.to_string());
        }
    }

    outcome
}

/// Picks the pool member with the highest total overlap against the rest.
fn pick_seed<'a>(pool: &[&'a str], demand: &Demand) -> &'a str {
    let mut best: Option<(&str, u32)> = None;
    for &id in pool {
        let sched = &demand.availability[id];
        let total: u32 = pool
            .iter()
            .filter(|other| **other != id)
            .map(|other| sched.overlap_minutes(&demand.availability[*other]))
            .sum();
        best = match best {
            Some(b) if compare_seeds(b, (id, total)) != Ordering::Greater => Some(b),
            _ => Some((id, total)),
        };
    }
    // Caller guarantees a non-empty pool
    best.map(|(id, _)| id).unwrap_or(pool[0])
}

/// Grows a group from a seed up to `max_capacity`.
fn grow_group(seed: &str, pool: &[&str], demand: &Demand) -> FormedGroup {
    let duration = demand.session_duration_mins;
    let mut members = vec![seed.to_string()];
    let mut common = demand.availability[seed].clone();

    while (members.len() as u32) < demand.max_capacity {
        let mut best: Option<(&str, u32, WeeklySchedule)> = None;

        for &candidate in pool {
            if members.iter().any(|m| m.as_str() == candidate) {
                continue;
            }
            let next = common.intersect(&demand.availability[candidate]);
            if !next.has_block_of(duration) {
                continue;
            }
            // How many of the remaining students would still fit the
            // shrunken window; the candidate stranding the fewest needs
            // the fewest future groups
            let kept = pool
                .iter()
                .filter(|other| {
                    **other != candidate && !members.iter().any(|m| m.as_str() == **other)
                })
                .filter(|other| {
                    next.intersect(&demand.availability[**other])
                        .has_block_of(duration)
                })
                .count() as u32;
            let score = (candidate, kept);
            let better = match &best {
                Some((bid, bkept, _)) => {
                    compare_candidates(score, (*bid, *bkept)) == Ordering::Less
                }
                None => true,
            };
            if better {
                best = Some((candidate, kept, next));
            }
        }

        match best {
            Some((id, _, next)) => {
                members.push(id.to_string());
                common = next;
            }
            None => break,
        }
    }

    FormedGroup {
        student_ids: members,
        common_windows: common,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DemandInput, MissingAvailabilityPolicy, WeeklyInterval};
    use crate::validation::normalize_demand;

    fn iv(day: u8, start: u16, end: u16) -> WeeklyInterval {
        WeeklyInterval::new(day, start, end).unwrap()
    }

    fn demand_with(
        students: &[(&str, Vec<WeeklyInterval>)],
        min: u32,
        max: u32,
        duration: u16,
    ) -> Demand {
        let mut input = DemandInput::new(
            "lvl-1",
            students.iter().map(|(id, _)| id.to_string()).collect(),
            min,
            max,
            8,
            duration,
            500.0,
        );
        for (id, ivs) in students {
            input = input.with_availability(*id, ivs.clone());
        }
        normalize_demand(0, &input, MissingAvailabilityPolicy::AssumeFullWeek).unwrap()
    }

    #[test]
    fn test_scenario_a_one_group_of_three() {
        // 3 students all available Mon 09:00-11:00, min=2 max=3, 60 min
        let window = vec![iv(1, 540, 660)];
        let d = demand_with(
            &[
                ("s1", window.clone()),
                ("s2", window.clone()),
                ("s3", window),
            ],
            2,
            3,
            60,
        );

        let out = form_groups(&d);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].student_ids.len(), 3);
        assert!(out.unplaced_students.is_empty());
        // Common window is the shared Mon 09:00-11:00
        assert_eq!(out.groups[0].common_windows.intervals(), &[iv(1, 540, 660)]);
    }

    #[test]
    fn test_scenario_b_disjoint_availability() {
        // No overlapping day → zero groups
        let d = demand_with(
            &[
                ("s1", vec![iv(1, 540, 660)]),
                ("s2", vec![iv(3, 540, 660)]),
            ],
            2,
            4,
            60,
        );

        let out = form_groups(&d);
        assert!(out.groups.is_empty());
        assert_eq!(out.unplaced_students.len(), 2);
    }

    #[test]
    fn test_capacity_bounds_property() {
        // 5 compatible students, max 3 → groups of 3 and 2
        let window = vec![iv(2, 480, 1200)];
        let students: Vec<(&str, Vec<WeeklyInterval>)> = vec![
            ("s1", window.clone()),
            ("s2", window.clone()),
            ("s3", window.clone()),
            ("s4", window.clone()),
            ("s5", window),
        ];
        let d = demand_with(&students, 2, 3, 60);

        let out = form_groups(&d);
        assert_eq!(out.groups.len(), 2);
        for g in &out.groups {
            let size = g.student_ids.len() as u32;
            assert!((2..=3).contains(&size));
            assert!(g.common_windows.has_block_of(60));
        }
        assert!(out.unplaced_students.is_empty());
    }

    #[test]
    fn test_common_window_shrinks_with_members() {
        // s1: Mon 09-12, s2: Mon 10-13, s3: Mon 11-14. Pairwise overlaps
        // are 2h each but the three-way common window is only 11-12.
        let d = demand_with(
            &[
                ("s1", vec![iv(1, 540, 720)]),
                ("s2", vec![iv(1, 600, 780)]),
                ("s3", vec![iv(1, 660, 840)]),
            ],
            2,
            3,
            60,
        );

        let out = form_groups(&d);
        assert_eq!(out.groups.len(), 1);
        let g = &out.groups[0];
        assert_eq!(g.student_ids.len(), 3);
        assert_eq!(g.common_windows.intervals(), &[iv(1, 660, 720)]);
    }

    #[test]
    fn test_incompatible_student_not_forced_in() {
        // Three students share Mon morning; a fourth only overlaps 30 min,
        // below the 60-min session requirement
        let d = demand_with(
            &[
                ("s1", vec![iv(1, 540, 720)]),
                ("s2", vec![iv(1, 540, 720)]),
                ("s3", vec![iv(1, 540, 720)]),
                ("s4", vec![iv(1, 690, 840)]),
            ],
            2,
            4,
            60,
        );

        let out = form_groups(&d);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].student_ids.len(), 3);
        assert!(!out.groups[0].student_ids.contains(&"s4".to_string()));
        assert_eq!(out.unplaced_students, vec!["s4".to_string()]);
    }

    #[test]
    fn test_student_too_short_for_session() {
        // s2's only window is shorter than the session itself
        let d = demand_with(
            &[
                ("s1", vec![iv(1, 540, 720)]),
                ("s2", vec![iv(1, 540, 570)]),
            ],
            1,
            2,
            60,
        );

        let out = form_groups(&d);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].student_ids, vec!["s1".to_string()]);
        assert_eq!(out.unplaced_students, vec!["s2".to_string()]);
    }

    #[test]
    fn test_deterministic_tie_break_by_id() {
        // Fully symmetric students → composition decided by id order
        let window = vec![iv(4, 600, 900)];
        let d = demand_with(
            &[
                ("s3", window.clone()),
                ("s1", window.clone()),
                ("s2", window),
            ],
            2,
            2,
            60,
        );

        let out = form_groups(&d);
        assert_eq!(out.groups.len(), 1);
        // Seed s1 (lowest id on tie), grown with s2
        assert_eq!(
            out.groups[0].student_ids,
            vec!["s1".to_string(), "s2".to_string()]
        );
        assert_eq!(out.unplaced_students, vec!["s3".to_string()]);
    }

    #[test]
    fn test_excluded_students_reported_unplaced() {
        let mut input = DemandInput::new(
            "lvl-1",
            vec!["s1".into(), "s2".into()],
            1,
            2,
            8,
            60,
            500.0,
        );
        input = input.with_availability("s1", vec![iv(1, 540, 720)]);
        let d = normalize_demand(0, &input, MissingAvailabilityPolicy::ExcludeStudent).unwrap();

        let out = form_groups(&d);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(out.groups[0].student_ids, vec!["s1".to_string()]);
        assert_eq!(out.unplaced_students, vec!["s2".to_string()]);
    }

    #[test]
    fn test_comparator_units() {
        use std::cmp::Ordering::*;
        // More students kept compatible wins
        assert_eq!(compare_candidates(("b", 3), ("a", 1)), Less);
        // Tie → lower id wins
        assert_eq!(compare_candidates(("a", 2), ("b", 2)), Less);
        assert_eq!(compare_candidates(("b", 2), ("a", 2)), Greater);
        assert_eq!(compare_seeds(("a", 10), ("a", 10)), Equal);
    }

    #[test]
    fn test_growth_prefers_fewer_future_groups() {
        // Seed s1 spans Mon and Tue. s2 shares the whole Mon window but
        // strands s3 and s4; s3 keeps s4 compatible. Growth takes the
        // path that leaves fewer students for future groups, so one
        // group of three forms instead of two groups of two.
        let d = demand_with(
            &[
                ("s1", vec![iv(1, 540, 720), iv(2, 540, 720)]),
                ("s2", vec![iv(1, 540, 720)]),
                ("s3", vec![iv(2, 540, 660)]),
                ("s4", vec![iv(2, 540, 660)]),
            ],
            2,
            3,
            60,
        );

        let out = form_groups(&d);
        assert_eq!(out.groups.len(), 1);
        assert_eq!(
            out.groups[0].student_ids,
            vec!["s1".to_string(), "s3".to_string(), "s4".to_string()]
        );
        assert_eq!(out.unplaced_students, vec!["s2".to_string()]);
    }
}
