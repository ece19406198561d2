//! Plan applier: commits accepted suggestions one kit at a time.
//!
//! A plan is a stale-as-of-read snapshot, so every suggestion goes back
//! through `lifecycle::create`, which re-runs the conflict detector against
//! the *current* persisted state under the store's write guard. A suggestion
//! that lost its slot in the meantime lands in `failed`; the rest still
//! commit.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use roadcase_core::{Assignment, FleetError, FleetStore, lifecycle};

use crate::planner::Suggestion;

/// One suggestion that could not be committed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyFailure {
    pub event_id: String,
    pub kit_id: String,
    pub reason: String,
}

/// Outcome of applying a batch of suggestions.
///
/// A non-empty `failed` list means "apply succeeded for some, review the
/// rest" — never an all-or-nothing rollback.
#[derive(Debug, Clone, Default)]
pub struct ApplyOutcome {
    pub created: Vec<Assignment>,
    pub failed: Vec<ApplyFailure>,
}

/// Commit `suggestions`, re-validating each against current availability.
///
/// Final ship and return-arrival dates are recomputed here from the event
/// dates and the kit's logistics parameters, so a plan generated against
/// stale logistics still books the right window.
///
/// # Errors
///
/// Structurally invalid input aborts the whole call: `KitNotFound` when a
/// suggestion names a kit that does not exist at all, and storage errors
/// pass through. Conflicts and validation failures degrade per-suggestion
/// into `failed`.
pub fn apply<S: FleetStore>(
    store: &S,
    suggestions: &[Suggestion],
    today: NaiveDate,
) -> Result<ApplyOutcome, FleetError> {
    let mut outcome = ApplyOutcome::default();

    for suggestion in suggestions {
        let kit = store
            .kit(&suggestion.kit_id)?
            .ok_or_else(|| FleetError::KitNotFound(suggestion.kit_id.clone()))?;

        let new = lifecycle::NewAssignment {
            kit_id: kit.id.clone(),
            event_id: suggestion.event_id.clone(),
            event_name: suggestion.event_name.clone(),
            event_start: suggestion.event_start,
            event_end: suggestion.event_end,
            ship_date: Some(suggestion.event_start - Duration::days(kit.default_ship_days)),
            arrival_date: None,
            return_ship_date: None,
            return_arrival_date: Some(
                suggestion.event_end + Duration::days(kit.default_return_days),
            ),
            buffer_days: suggestion.buffer_days,
            auto_planned: true,
            plan_reason: Some(suggestion.reason.clone()),
            confidence: Some(suggestion.confidence),
            notes: None,
        };

        match lifecycle::create(store, new, today) {
            Ok(assignment) => outcome.created.push(assignment),
            Err(FleetError::Conflict { conflicts, .. }) => {
                let detail: Vec<String> = conflicts.iter().map(ToString::to_string).collect();
                tracing::warn!(
                    event_id = %suggestion.event_id,
                    kit_id = %suggestion.kit_id,
                    "suggestion no longer applies: {}",
                    detail.join("; ")
                );
                outcome.failed.push(ApplyFailure {
                    event_id: suggestion.event_id.clone(),
                    kit_id: suggestion.kit_id.clone(),
                    reason: format!("conflict: {}", detail.join("; ")),
                });
            }
            Err(FleetError::Validation(message)) => {
                outcome.failed.push(ApplyFailure {
                    event_id: suggestion.event_id.clone(),
                    kit_id: suggestion.kit_id.clone(),
                    reason: message,
                });
            }
            Err(other) => return Err(other),
        }
    }

    tracing::info!(
        created = outcome.created.len(),
        failed = outcome.failed.len(),
        "plan applied"
    );
    Ok(outcome)
}
