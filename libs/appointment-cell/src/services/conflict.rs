// libs/appointment-cell/src/services/conflict.rs
//! Interval overlap checks shared by slot generation and booking.

use crate::models::{Appointment, Interval};

/// Whether two half-open intervals share any instant.
///
/// Covers every configuration: `a` starts inside `b`, `a` ends inside `b`,
/// `a` contains `b`, or `b` contains `a`. Intervals that only touch
/// (`a.end == b.start`) do not overlap.
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.start < b.end && b.start < a.end
}

/// Whether `candidate` collides with any scheduled appointment in `existing`.
///
/// Cancelled and completed appointments never block a slot.
pub fn has_conflict(candidate: &Interval, existing: &[Appointment]) -> bool {
    existing
        .iter()
        .any(|appointment| appointment.is_scheduled() && overlaps(candidate, &appointment.interval()))
}

/// The scheduled appointments that collide with `candidate`.
pub fn find_conflicts<'a>(candidate: &Interval, existing: &'a [Appointment]) -> Vec<&'a Appointment> {
    existing
        .iter()
        .filter(|appointment| appointment.is_scheduled() && overlaps(candidate, &appointment.interval()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
    }

    fn span(from: (u32, u32), to: (u32, u32)) -> Interval {
        Interval::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    #[test]
    fn each_overlap_case_is_detected() {
        let existing = span((10, 0), (11, 0));

        assert!(overlaps(&span((10, 30), (11, 30)), &existing), "starts inside");
        assert!(overlaps(&span((9, 30), (10, 30)), &existing), "ends inside");
        assert!(overlaps(&span((9, 0), (12, 0)), &existing), "contains");
        assert!(overlaps(&span((10, 15), (10, 45)), &existing), "contained");
        assert!(overlaps(&existing, &existing), "identical");
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let existing = span((10, 0), (11, 0));

        assert!(!overlaps(&span((9, 0), (10, 0)), &existing));
        assert!(!overlaps(&span((11, 0), (12, 0)), &existing));
    }
}
