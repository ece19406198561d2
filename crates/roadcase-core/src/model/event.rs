use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The fields of an external event record this engine consumes.
///
/// Event records live with a collaborator; only identity, the date range,
/// and display fields cross the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRef {
    pub id: String,
    pub name: String,
    pub location: String,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl EventRef {
    /// The event's date range, when both dates are present and ordered.
    ///
    /// Returns `None` when either date is missing. An inverted range is
    /// reported separately by [`Self::has_inverted_dates`] so callers can
    /// name the rejection reason.
    #[must_use]
    pub fn dates(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start, self.end) {
            (Some(start), Some(end)) if start <= end => Some((start, end)),
            _ => None,
        }
    }

    /// Whether both dates are present but end precedes start.
    #[must_use]
    pub fn has_inverted_dates(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if end < start)
    }

    /// Inclusive duration in days; a one-day event has duration 1.
    ///
    /// Returns `None` for events without a usable date range.
    #[must_use]
    pub fn duration_days(&self) -> Option<i64> {
        self.dates().map(|(start, end)| (end - start).num_days() + 1)
    }
}
