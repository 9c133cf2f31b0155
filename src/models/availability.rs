//! Weekly availability intervals and schedules.
//!
//! Availability is expressed as recurring weekly windows: a day of week
//! (0 = Sunday .. 6 = Saturday) plus start/end in minutes from midnight.
//! Intervals are half-open `[start, end)` and same-day only — windows that
//! cross midnight are rejected at construction, as are zero-length windows.
//!
//! [`WeeklySchedule`] is the normalized form: intervals sorted by
//! `(day, start)` with overlapping or adjacent same-day intervals merged.
//! All set operations (intersection, overlap totals, contiguous-block
//! queries) are defined on normalized schedules.

use serde::{Deserialize, Serialize};

use crate::error::AllocationError;

/// Minutes in a day; also the exclusive upper bound for interval ends.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A recurring weekly availability window.
///
/// Half-open interval: includes `start_min`, excludes `end_min`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyInterval {
    /// Day of week (0 = Sunday .. 6 = Saturday).
    pub day: u8,
    /// Start, minutes from midnight (inclusive).
    pub start_min: u16,
    /// End, minutes from midnight (exclusive).
    pub end_min: u16,
}

impl WeeklyInterval {
    /// Creates a validated weekly interval.
    ///
    /// # Errors
    /// [`AllocationError::InvalidAvailability`] if the day is out of range,
    /// the interval is zero-length or inverted, or it extends past midnight.
    pub fn new(day: u8, start_min: u16, end_min: u16) -> Result<Self, AllocationError> {
        if day > 6 {
            return Err(AllocationError::InvalidAvailability(format!(
                "dayOfWeek must be 0..=6, got {day}"
            )));
        }
        if start_min >= end_min {
            return Err(AllocationError::InvalidAvailability(format!(
                "interval must have positive length, got [{start_min}, {end_min})"
            )));
        }
        if end_min > MINUTES_PER_DAY {
            return Err(AllocationError::InvalidAvailability(format!(
                "interval must not cross midnight, end {end_min} > {MINUTES_PER_DAY}"
            )));
        }
        Ok(Self {
            day,
            start_min,
            end_min,
        })
    }

    /// Duration of this interval (minutes).
    #[inline]
    pub fn duration_min(&self) -> u16 {
        self.end_min - self.start_min
    }

    /// Whether two intervals overlap (same day, intersecting times).
    pub fn overlaps(&self, other: &Self) -> bool {
        self.day == other.day && self.start_min < other.end_min && other.start_min < self.end_min
    }

    /// Intersection of two intervals, if non-empty.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        if self.day != other.day {
            return None;
        }
        let start = self.start_min.max(other.start_min);
        let end = self.end_min.min(other.end_min);
        if start < end {
            Some(Self {
                day: self.day,
                start_min: start,
                end_min: end,
            })
        } else {
            None
        }
    }

    /// Whether this interval fully contains another.
    pub fn contains(&self, other: &Self) -> bool {
        self.day == other.day && self.start_min <= other.start_min && self.end_min >= other.end_min
    }
}

/// A normalized list of weekly intervals.
///
/// Sorted by `(day, start)`; overlapping and adjacent intervals on the same
/// day are merged. An empty schedule means "never available".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeeklySchedule {
    intervals: Vec<WeeklyInterval>,
}

// Every operation assumes a normalized interval list, so wire input is
// validated and normalized here rather than trusted.
impl<'de> Deserialize<'de> for WeeklySchedule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            intervals: Vec<WeeklyInterval>,
        }

        let raw = Raw::deserialize(deserializer)?;
        for iv in &raw.intervals {
            WeeklyInterval::new(iv.day, iv.start_min, iv.end_min)
                .map_err(serde::de::Error::custom)?;
        }
        Ok(Self::normalize(raw.intervals))
    }
}

impl WeeklySchedule {
    /// Creates an empty (never-available) schedule.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Normalizes a list of intervals into a schedule.
    ///
    /// Sorts by `(day, start)` and merges overlapping or adjacent intervals
    /// on the same day.
    pub fn normalize(mut intervals: Vec<WeeklyInterval>) -> Self {
        intervals.sort_by_key(|iv| (iv.day, iv.start_min, iv.end_min));

        let mut merged: Vec<WeeklyInterval> = Vec::with_capacity(intervals.len());
        for iv in intervals {
            match merged.last_mut() {
                Some(last) if last.day == iv.day && iv.start_min <= last.end_min => {
                    last.end_min = last.end_min.max(iv.end_min);
                }
                _ => merged.push(iv),
            }
        }

        Self { intervals: merged }
    }

    /// A schedule covering all seven days end to end.
    ///
    /// Used for the "missing availability means fully available" policy.
    pub fn full_week() -> Self {
        let intervals = (0u8..7)
            .map(|day| WeeklyInterval {
                day,
                start_min: 0,
                end_min: MINUTES_PER_DAY,
            })
            .collect();
        Self { intervals }
    }

    /// The normalized intervals, in `(day, start)` order.
    pub fn intervals(&self) -> &[WeeklyInterval] {
        &self.intervals
    }

    /// Whether the schedule has no availability at all.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Intersection with another schedule.
    ///
    /// Both operands are normalized, so a linear two-pointer sweep suffices.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);

        while i < self.intervals.len() && j < other.intervals.len() {
            let a = &self.intervals[i];
            let b = &other.intervals[j];

            if let Some(iv) = a.intersect(b) {
                out.push(iv);
            }

            // Advance the interval that ends first in (day, end) order
            if (a.day, a.end_min) <= (b.day, b.end_min) {
                i += 1;
            } else {
                j += 1;
            }
        }

        // Output of intersecting normalized schedules is already normalized
        Self { intervals: out }
    }

    /// Total covered minutes across the week.
    pub fn total_minutes(&self) -> u32 {
        self.intervals
            .iter()
            .map(|iv| iv.duration_min() as u32)
            .sum()
    }

    /// Total overlap minutes between two schedules across all weekdays.
    pub fn overlap_minutes(&self, other: &Self) -> u32 {
        self.intersect(other).total_minutes()
    }

    /// Longest single contiguous block (minutes). 0 for an empty schedule.
    pub fn longest_block(&self) -> u16 {
        self.intervals
            .iter()
            .map(WeeklyInterval::duration_min)
            .max()
            .unwrap_or(0)
    }

    /// Whether any contiguous block is at least `mins` long.
    #[inline]
    pub fn has_block_of(&self, mins: u16) -> bool {
        self.longest_block() >= mins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iv(day: u8, start: u16, end: u16) -> WeeklyInterval {
        WeeklyInterval::new(day, start, end).unwrap()
    }

    #[test]
    fn test_interval_validation() {
        assert!(WeeklyInterval::new(1, 540, 660).is_ok());
        // Zero-length
        assert!(matches!(
            WeeklyInterval::new(1, 540, 540),
            Err(AllocationError::InvalidAvailability(_))
        ));
        // Inverted
        assert!(WeeklyInterval::new(1, 660, 540).is_err());
        // Crosses midnight
        assert!(WeeklyInterval::new(1, 1380, 1441).is_err());
        // Bad day
        assert!(WeeklyInterval::new(7, 540, 660).is_err());
        // Full day is allowed
        assert!(WeeklyInterval::new(0, 0, 1440).is_ok());
    }

    #[test]
    fn test_interval_overlap() {
        let a = iv(1, 540, 660); // Mon 09:00-11:00
        let b = iv(1, 600, 720); // Mon 10:00-12:00
        assert!(a.overlaps(&b));
        assert_eq!(a.intersect(&b), Some(iv(1, 600, 660)));

        // Touching but not overlapping
        let c = iv(1, 660, 720);
        assert!(!a.overlaps(&c));
        assert_eq!(a.intersect(&c), None);

        // Different day
        let d = iv(2, 540, 660);
        assert!(!a.overlaps(&d));
        assert_eq!(a.intersect(&d), None);
    }

    #[test]
    fn test_normalize_merges_overlapping() {
        let s = WeeklySchedule::normalize(vec![iv(1, 600, 720), iv(1, 540, 660), iv(2, 540, 600)]);
        assert_eq!(s.intervals(), &[iv(1, 540, 720), iv(2, 540, 600)]);
    }

    #[test]
    fn test_normalize_merges_adjacent() {
        let s = WeeklySchedule::normalize(vec![iv(3, 540, 600), iv(3, 600, 660)]);
        assert_eq!(s.intervals(), &[iv(3, 540, 660)]);
    }

    #[test]
    fn test_normalize_keeps_disjoint() {
        let s = WeeklySchedule::normalize(vec![iv(3, 540, 600), iv(3, 700, 760)]);
        assert_eq!(s.intervals().len(), 2);
    }

    #[test]
    fn test_intersect_schedules() {
        let a = WeeklySchedule::normalize(vec![iv(1, 540, 720), iv(3, 600, 900)]);
        let b = WeeklySchedule::normalize(vec![iv(1, 600, 660), iv(3, 840, 960), iv(5, 0, 1440)]);

        let x = a.intersect(&b);
        assert_eq!(x.intervals(), &[iv(1, 600, 660), iv(3, 840, 900)]);
    }

    #[test]
    fn test_intersect_no_overlap() {
        let a = WeeklySchedule::normalize(vec![iv(1, 540, 660)]);
        let b = WeeklySchedule::normalize(vec![iv(2, 540, 660)]);
        assert!(a.intersect(&b).is_empty());
    }

    #[test]
    fn test_intersect_with_full_week() {
        let a = WeeklySchedule::normalize(vec![iv(1, 540, 660), iv(4, 60, 120)]);
        let full = WeeklySchedule::full_week();
        assert_eq!(a.intersect(&full), a);
        assert_eq!(full.total_minutes(), 7 * 1440);
    }

    #[test]
    fn test_overlap_minutes() {
        let a = WeeklySchedule::normalize(vec![iv(1, 540, 720), iv(2, 540, 720)]);
        let b = WeeklySchedule::normalize(vec![iv(1, 600, 660), iv(2, 660, 780)]);
        // Mon: 60 min, Tue: 60 min
        assert_eq!(a.overlap_minutes(&b), 120);
    }

    #[test]
    fn test_contiguous_blocks() {
        let s = WeeklySchedule::normalize(vec![iv(1, 540, 600), iv(2, 540, 720)]);
        assert_eq!(s.longest_block(), 180);
        assert!(s.has_block_of(180));
        assert!(!s.has_block_of(181));

        assert_eq!(WeeklySchedule::empty().longest_block(), 0);
        assert!(!WeeklySchedule::empty().has_block_of(1));
    }

    #[test]
    fn test_serde_roundtrip() {
        let s = WeeklySchedule::normalize(vec![iv(1, 540, 660)]);
        let json = serde_json::to_string(&s).unwrap();
        let back: WeeklySchedule = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }

    #[test]
    fn test_deserialize_normalizes_wire_input() {
        // Unsorted, overlapping intervals straight off the wire
        let json = r#"{"intervals":[
            {"day":1,"start_min":600,"end_min":720},
            {"day":1,"start_min":540,"end_min":660}
        ]}"#;
        let s: WeeklySchedule = serde_json::from_str(json).unwrap();
        assert_eq!(s.intervals(), &[iv(1, 540, 720)]);
    }

    #[test]
    fn test_deserialize_rejects_malformed_intervals() {
        // Bad day
        let json = r#"{"intervals":[{"day":9,"start_min":540,"end_min":660}]}"#;
        assert!(serde_json::from_str::<WeeklySchedule>(json).is_err());
        // Zero length
        let json = r#"{"intervals":[{"day":1,"start_min":540,"end_min":540}]}"#;
        assert!(serde_json::from_str::<WeeklySchedule>(json).is_err());
        // Crosses midnight
        let json = r#"{"intervals":[{"day":1,"start_min":1380,"end_min":1500}]}"#;
        assert!(serde_json::from_str::<WeeklySchedule>(json).is_err());
    }
}
