//! Occupied-window math shared by availability, conflict detection, and the
//! planner.
//!
//! The estimator lives here and nowhere else: every "is this kit free" check
//! and every "what did we book" computation goes through the same function,
//! so the two can never disagree.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::model::{assignment::Assignment, kit::Kit};

/// An inclusive date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Construct a range; `end` is clamped up to `start` so a range is
    /// always at least one day.
    #[must_use]
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Expand the range by `days` on both sides.
    #[must_use]
    pub fn padded(self, days: i64) -> Self {
        Self {
            start: self.start - Duration::days(days),
            end: self.end + Duration::days(days),
        }
    }

    /// Two inclusive ranges overlap when neither precedes the other.
    #[must_use]
    pub fn overlaps(self, other: Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// The date range during which an assignment occupies its kit.
///
/// Explicit milestones win; when a ship or return-arrival date is not yet
/// known, that side falls back to the event date padded by the kit's default
/// transit days.
#[must_use]
pub fn occupied_window(assignment: &Assignment, kit: &Kit) -> DateRange {
    let start = assignment
        .ship_date
        .unwrap_or_else(|| assignment.event_start - Duration::days(kit.default_ship_days));
    let end = assignment
        .return_arrival_date
        .unwrap_or_else(|| assignment.event_end + Duration::days(kit.default_return_days));

    DateRange::new(start, end)
}
