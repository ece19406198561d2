//! Application-facing facade over the planner, applier, and lifecycle.
//!
//! Owns snapshot assembly: the planner itself never touches the store, so
//! everything it sees is gathered here in one read pass.

use chrono::NaiveDate;
use std::collections::HashSet;

use roadcase_core::{
    Assignment, AssignmentStatus, ConflictDescriptor, FleetConfig, FleetError, KitStatus, KitTier,
    availability, lifecycle,
    lifecycle::{DatePatch, NewAssignment},
    store::{EventSource, FleetStore},
};

use crate::apply::{ApplyOutcome, apply};
use crate::planner::{FleetSnapshot, KitState, Plan, PlanRequest, Suggestion, plan_with_weights};
use crate::score::ScoreWeights;

/// The scheduling engine's entry point for an application layer.
///
/// Holds one single-tenant store view and one event source; every operation
/// is synchronous within the caller's request.
#[derive(Debug)]
pub struct FleetScheduler<S, E> {
    store: S,
    events: E,
    config: FleetConfig,
    weights: ScoreWeights,
}

impl<S: FleetStore, E: EventSource> FleetScheduler<S, E> {
    pub fn new(store: S, events: E, config: FleetConfig) -> Self {
        Self {
            store,
            events,
            config,
            weights: ScoreWeights::default(),
        }
    }

    /// Replace the default scoring policy.
    #[must_use]
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generate a non-committed assignment plan for upcoming events.
    ///
    /// Read-only: the result is a proposal over a snapshot and must be
    /// committed through [`Self::apply_plan`], never trusted blindly.
    ///
    /// # Errors
    ///
    /// Fails only on storage or event-source errors; unschedulable events
    /// degrade into the plan's `unassignable` list.
    pub fn plan(
        &self,
        event_ids: Option<&[String]>,
        buffer_days: Option<i64>,
        preferred_tiers: Vec<KitTier>,
        today: NaiveDate,
    ) -> Result<Plan, FleetError> {
        let events = self.events.upcoming_events(event_ids)?;
        let snapshot = self.snapshot(today)?;
        let request = PlanRequest {
            events,
            buffer_days: buffer_days.unwrap_or(self.config.scheduling.default_buffer_days),
            preferred_tiers,
            tight_turnaround_days: self.config.scheduling.tight_turnaround_days,
        };
        Ok(plan_with_weights(&snapshot, &request, &self.weights))
    }

    /// Commit an approved (possibly partial) set of suggestions.
    ///
    /// # Errors
    ///
    /// See [`apply`]: per-suggestion conflicts degrade into the outcome's
    /// `failed` list; structural errors abort.
    pub fn apply_plan(
        &self,
        suggestions: &[Suggestion],
        today: NaiveDate,
    ) -> Result<ApplyOutcome, FleetError> {
        apply(&self.store, suggestions, today)
    }

    /// Whether a kit is free over `[start, end]` with `buffer_days` slack.
    ///
    /// # Errors
    ///
    /// `KitNotFound`, or `Validation` for an inverted range.
    pub fn check_availability(
        &self,
        kit_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        buffer_days: Option<i64>,
    ) -> Result<bool, FleetError> {
        availability::is_available(
            &self.store,
            kit_id,
            start,
            end,
            buffer_days.unwrap_or(self.config.scheduling.default_buffer_days),
            None,
        )
    }

    /// The assignments a manual booking over `[start, end]` would collide
    /// with.
    ///
    /// # Errors
    ///
    /// `KitNotFound`, or `Validation` for an inverted range.
    pub fn get_conflicts(
        &self,
        kit_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        buffer_days: Option<i64>,
    ) -> Result<Vec<ConflictDescriptor>, FleetError> {
        availability::conflicts(
            &self.store,
            kit_id,
            start,
            end,
            buffer_days.unwrap_or(self.config.scheduling.default_buffer_days),
            None,
        )
    }

    /// Manually book a kit for an event; the conflict detector still runs.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::create`].
    pub fn create_assignment(
        &self,
        new: NewAssignment,
        today: NaiveDate,
    ) -> Result<Assignment, FleetError> {
        lifecycle::create(&self.store, new, today)
    }

    /// Move an assignment along the lifecycle chain.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::update_status`].
    pub fn update_status(
        &self,
        assignment_id: &str,
        new_status: AssignmentStatus,
        today: NaiveDate,
    ) -> Result<Assignment, FleetError> {
        lifecycle::update_status(&self.store, assignment_id, new_status, today)
    }

    /// Audited out-of-order status override.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::force_status`].
    pub fn force_status(
        &self,
        assignment_id: &str,
        new_status: AssignmentStatus,
        today: NaiveDate,
    ) -> Result<Assignment, FleetError> {
        lifecycle::force_status(&self.store, assignment_id, new_status, today)
    }

    /// Patch shipping milestone dates.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::update_dates`].
    pub fn update_dates(
        &self,
        assignment_id: &str,
        patch: DatePatch,
        buffer_days: Option<i64>,
    ) -> Result<Assignment, FleetError> {
        lifecycle::update_dates(
            &self.store,
            assignment_id,
            patch,
            buffer_days.unwrap_or(self.config.scheduling.default_buffer_days),
        )
    }

    /// Soft-cancel an assignment, freeing its kit immediately.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::cancel`].
    pub fn cancel(&self, assignment_id: &str) -> Result<Assignment, FleetError> {
        lifecycle::cancel(&self.store, assignment_id)
    }

    /// Hard-delete a still-planned assignment.
    ///
    /// # Errors
    ///
    /// See [`lifecycle::delete`].
    pub fn delete(&self, assignment_id: &str) -> Result<(), FleetError> {
        lifecycle::delete(&self.store, assignment_id)
    }

    /// One read pass over the store: every kit in service, its real
    /// available-from date, and the events already holding an active
    /// assignment.
    fn snapshot(&self, today: NaiveDate) -> Result<FleetSnapshot, FleetError> {
        let mut kits: Vec<KitState> = Vec::new();
        for kit in self.store.kits()? {
            if kit.status == KitStatus::Maintenance {
                tracing::debug!(kit_id = %kit.id, "kit out of service, excluded from planning");
                continue;
            }
            let available_from = availability::available_from(&self.store, &kit.id, today)?;
            kits.push(KitState {
                kit,
                available_from,
            });
        }

        let assigned_event_ids: HashSet<String> = self
            .store
            .active_assignments()?
            .into_iter()
            .map(|a| a.event_id)
            .collect();

        Ok(FleetSnapshot {
            kits,
            assigned_event_ids,
        })
    }
}
