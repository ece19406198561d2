//! Availability model and conflict detector.
//!
//! Pure reads over the store: nothing here mutates state, and calling the
//! same query twice with no intervening writes returns the same answer.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FleetError;
use crate::store::FleetStore;
use crate::window::{DateRange, occupied_window};

/// One existing assignment that would overlap a candidate booking.
///
/// Carries enough of the other event to render *why* the candidate
/// conflicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictDescriptor {
    pub assignment_id: String,
    pub event_id: String,
    pub event_name: String,
    pub event_start: NaiveDate,
    pub event_end: NaiveDate,
    pub ship_date: Option<NaiveDate>,
    pub return_arrival_date: Option<NaiveDate>,
    /// The occupied window the candidate collided with (estimated when
    /// explicit dates are absent).
    pub occupied: DateRange,
}

impl fmt::Display for ConflictDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) occupies {} to {}",
            self.event_name, self.event_id, self.occupied.start, self.occupied.end
        )
    }
}

/// The earliest date at which the kit has no active assignment occupying it.
///
/// With no active assignments the kit is free from `today`. Past
/// assignments never push availability before `today`.
///
/// # Errors
///
/// `KitNotFound` for an unknown kit id; storage errors pass through.
pub fn available_from<S: FleetStore>(
    store: &S,
    kit_id: &str,
    today: NaiveDate,
) -> Result<NaiveDate, FleetError> {
    let kit = store
        .kit(kit_id)?
        .ok_or_else(|| FleetError::KitNotFound(kit_id.to_string()))?;

    let free = store
        .active_assignments_for_kit(kit_id)?
        .iter()
        .map(|a| occupied_window(a, &kit).end + Duration::days(1))
        .max()
        .map_or(today, |end| end.max(today));

    Ok(free)
}

/// Every active assignment whose occupied window overlaps the candidate
/// range expanded by `buffer_days` on both sides.
///
/// `exclude` skips one assignment id — used when re-checking an assignment
/// that is itself being edited.
///
/// # Errors
///
/// `Validation` when `end` precedes `start`; `KitNotFound` for an unknown
/// kit id.
pub fn conflicts<S: FleetStore>(
    store: &S,
    kit_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    buffer_days: i64,
    exclude: Option<&str>,
) -> Result<Vec<ConflictDescriptor>, FleetError> {
    if end < start {
        return Err(FleetError::Validation(format!(
            "candidate range end {end} precedes start {start}"
        )));
    }

    let kit = store
        .kit(kit_id)?
        .ok_or_else(|| FleetError::KitNotFound(kit_id.to_string()))?;

    let candidate = DateRange::new(start, end).padded(buffer_days);

    let found: Vec<ConflictDescriptor> = store
        .active_assignments_for_kit(kit_id)?
        .into_iter()
        .filter(|a| exclude != Some(a.id.as_str()))
        .filter_map(|a| {
            let occupied = occupied_window(&a, &kit);
            candidate.overlaps(occupied).then(|| ConflictDescriptor {
                assignment_id: a.id,
                event_id: a.event_id,
                event_name: a.event_name,
                event_start: a.event_start,
                event_end: a.event_end,
                ship_date: a.ship_date,
                return_arrival_date: a.return_arrival_date,
                occupied,
            })
        })
        .collect();

    tracing::debug!(
        kit_id,
        %start,
        %end,
        buffer_days,
        conflicts = found.len(),
        "conflict check"
    );

    Ok(found)
}

/// Boolean companion to [`conflicts`].
///
/// # Errors
///
/// Same conditions as [`conflicts`].
pub fn is_available<S: FleetStore>(
    store: &S,
    kit_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    buffer_days: i64,
    exclude: Option<&str>,
) -> Result<bool, FleetError> {
    conflicts(store, kit_id, start, end, buffer_days, exclude).map(|found| found.is_empty())
}
