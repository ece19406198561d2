//! Validated assignment mutators.
//!
//! Every write path goes through these functions so the fleet's non-overlap
//! invariant is checked on every mutation, manual bookings included. The
//! check-then-write sequences hold the store's write guard so a concurrent
//! caller cannot slip a conflicting booking between the check and the write.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::availability::conflicts;
use crate::error::FleetError;
use crate::model::assignment::{Assignment, AssignmentStatus};
use crate::store::FleetStore;
use crate::window::occupied_window;

/// Inputs for creating an assignment, manual or planner-driven.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub kit_id: String,
    pub event_id: String,
    pub event_name: String,
    pub event_start: NaiveDate,
    pub event_end: NaiveDate,
    pub ship_date: Option<NaiveDate>,
    pub arrival_date: Option<NaiveDate>,
    pub return_ship_date: Option<NaiveDate>,
    pub return_arrival_date: Option<NaiveDate>,
    /// Slack required between this booking and the kit's other bookings.
    pub buffer_days: i64,
    pub auto_planned: bool,
    pub plan_reason: Option<String>,
    pub confidence: Option<f64>,
    pub notes: Option<String>,
}

/// Partial update for an assignment's shipping milestones.
///
/// `None` leaves a field unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatePatch {
    pub ship_date: Option<NaiveDate>,
    pub arrival_date: Option<NaiveDate>,
    pub return_ship_date: Option<NaiveDate>,
    pub return_arrival_date: Option<NaiveDate>,
}

/// Create an assignment after re-running the conflict detector against the
/// current persisted state.
///
/// # Errors
///
/// `Validation` for an inverted event range or out-of-range confidence,
/// `KitNotFound` for an unknown kit, `Conflict` when the kit is already
/// occupied over the requested window.
pub fn create<S: FleetStore>(
    store: &S,
    new: NewAssignment,
    today: NaiveDate,
) -> Result<Assignment, FleetError> {
    if new.event_end < new.event_start {
        return Err(FleetError::Validation(format!(
            "event {} ends {} before it starts {}",
            new.event_id, new.event_end, new.event_start
        )));
    }
    if let Some(confidence) = new.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(FleetError::Validation(format!(
                "confidence {confidence} outside [0, 1]"
            )));
        }
    }

    let kit = store
        .kit(&new.kit_id)?
        .ok_or_else(|| FleetError::KitNotFound(new.kit_id.clone()))?;

    let assignment = Assignment {
        id: Uuid::new_v4().to_string(),
        kit_id: new.kit_id,
        event_id: new.event_id,
        event_name: new.event_name,
        event_start: new.event_start,
        event_end: new.event_end,
        status: AssignmentStatus::Planned,
        ship_date: new.ship_date,
        arrival_date: new.arrival_date,
        return_ship_date: new.return_ship_date,
        return_arrival_date: new.return_arrival_date,
        auto_planned: new.auto_planned,
        plan_reason: new.plan_reason,
        confidence: new.confidence,
        notes: new.notes,
        created_on: today,
    };

    let _guard = store.lock_writes()?;

    let window = occupied_window(&assignment, &kit);
    let found = conflicts(
        store,
        &kit.id,
        window.start,
        window.end,
        new.buffer_days,
        None,
    )?;
    if !found.is_empty() {
        return Err(FleetError::Conflict {
            kit_id: kit.id,
            conflicts: found,
        });
    }

    store.insert_assignment(&assignment)?;
    tracing::info!(
        assignment_id = %assignment.id,
        kit_id = %assignment.kit_id,
        event_id = %assignment.event_id,
        auto_planned = assignment.auto_planned,
        "assignment created"
    );
    Ok(assignment)
}

/// Move an assignment along the lifecycle chain.
///
/// Entering `shipped` auto-stamps the ship date with `today` when absent;
/// `at_venue` stamps the arrival date; `returned` stamps the return-arrival
/// date. Cancellation frees the kit from this instant.
///
/// # Errors
///
/// `AssignmentNotFound`, or `InvalidTransition` when the lifecycle rules
/// forbid the move.
pub fn update_status<S: FleetStore>(
    store: &S,
    assignment_id: &str,
    new_status: AssignmentStatus,
    today: NaiveDate,
) -> Result<Assignment, FleetError> {
    let mut assignment = fetch(store, assignment_id)?;
    assignment.status.can_transition_to(new_status)?;

    let from = assignment.status;
    stamp_milestones(&mut assignment, new_status, today);
    assignment.status = new_status;
    store.update_assignment(&assignment)?;

    tracing::info!(
        assignment_id,
        %from,
        to = %new_status,
        "assignment status updated"
    );
    Ok(assignment)
}

/// Audited escape hatch: set a status without the ordering guard.
///
/// Operators use this to correct mistakes (e.g. revert `shipped` back to
/// `confirmed`). Terminal assignments still refuse — a cancelled or
/// returned assignment is never resurrected. Milestone dates are stamped
/// exactly as in [`update_status`].
///
/// # Errors
///
/// `AssignmentNotFound`, or `InvalidTransition` from a terminal state or to
/// the current status.
pub fn force_status<S: FleetStore>(
    store: &S,
    assignment_id: &str,
    new_status: AssignmentStatus,
    today: NaiveDate,
) -> Result<Assignment, FleetError> {
    let mut assignment = fetch(store, assignment_id)?;

    if assignment.status.is_terminal() || assignment.status == new_status {
        return Err(FleetError::InvalidTransition {
            from: assignment.status,
            to: new_status,
        });
    }

    let from = assignment.status;
    stamp_milestones(&mut assignment, new_status, today);
    assignment.status = new_status;
    store.update_assignment(&assignment)?;

    tracing::warn!(
        assignment_id,
        %from,
        to = %new_status,
        "status transition forced outside lifecycle order"
    );
    Ok(assignment)
}

/// Patch shipping milestone dates, re-checking conflicts (excluding this
/// assignment) before committing.
///
/// # Errors
///
/// `AssignmentNotFound`, `Validation` when the assignment is terminal, or
/// `Conflict` when the patched window would overlap another booking.
pub fn update_dates<S: FleetStore>(
    store: &S,
    assignment_id: &str,
    patch: DatePatch,
    buffer_days: i64,
) -> Result<Assignment, FleetError> {
    let _guard = store.lock_writes()?;

    let mut assignment = fetch(store, assignment_id)?;
    if !assignment.is_active() {
        return Err(FleetError::Validation(format!(
            "assignment {assignment_id} is {} and can no longer be rescheduled",
            assignment.status
        )));
    }

    if let Some(date) = patch.ship_date {
        assignment.ship_date = Some(date);
    }
    if let Some(date) = patch.arrival_date {
        assignment.arrival_date = Some(date);
    }
    if let Some(date) = patch.return_ship_date {
        assignment.return_ship_date = Some(date);
    }
    if let Some(date) = patch.return_arrival_date {
        assignment.return_arrival_date = Some(date);
    }

    let kit = store
        .kit(&assignment.kit_id)?
        .ok_or_else(|| FleetError::KitNotFound(assignment.kit_id.clone()))?;
    let window = occupied_window(&assignment, &kit);
    let found = conflicts(
        store,
        &kit.id,
        window.start,
        window.end,
        buffer_days,
        Some(assignment_id),
    )?;
    if !found.is_empty() {
        return Err(FleetError::Conflict {
            kit_id: kit.id,
            conflicts: found,
        });
    }

    store.update_assignment(&assignment)?;
    tracing::info!(assignment_id, "assignment dates updated");
    Ok(assignment)
}

/// Soft-cancel an assignment, freeing its kit immediately.
///
/// # Errors
///
/// `AssignmentNotFound`, or `InvalidTransition` when already terminal.
pub fn cancel<S: FleetStore>(store: &S, assignment_id: &str) -> Result<Assignment, FleetError> {
    let mut assignment = fetch(store, assignment_id)?;
    assignment
        .status
        .can_transition_to(AssignmentStatus::Cancelled)?;

    let from = assignment.status;
    assignment.status = AssignmentStatus::Cancelled;
    store.update_assignment(&assignment)?;

    tracing::info!(assignment_id, %from, "assignment cancelled");
    Ok(assignment)
}

/// Hard-delete an assignment that never progressed past `planned`.
///
/// Anything later is audit history: cancel instead.
///
/// # Errors
///
/// `AssignmentNotFound`, or `Validation` once the assignment has left
/// `planned`.
pub fn delete<S: FleetStore>(store: &S, assignment_id: &str) -> Result<(), FleetError> {
    let assignment = fetch(store, assignment_id)?;
    if assignment.status != AssignmentStatus::Planned {
        return Err(FleetError::Validation(format!(
            "assignment {assignment_id} is {}; only planned assignments may be deleted",
            assignment.status
        )));
    }

    store.delete_assignment(assignment_id)?;
    tracing::info!(assignment_id, "planned assignment deleted");
    Ok(())
}

fn fetch<S: FleetStore>(store: &S, assignment_id: &str) -> Result<Assignment, FleetError> {
    store
        .assignment(assignment_id)?
        .ok_or_else(|| FleetError::AssignmentNotFound(assignment_id.to_string()))
}

fn stamp_milestones(assignment: &mut Assignment, new_status: AssignmentStatus, today: NaiveDate) {
    match new_status {
        AssignmentStatus::Shipped => {
            assignment.ship_date.get_or_insert(today);
        }
        AssignmentStatus::AtVenue => {
            assignment.arrival_date.get_or_insert(today);
        }
        AssignmentStatus::Returned => {
            assignment.return_arrival_date.get_or_insert(today);
        }
        _ => {}
    }
}
