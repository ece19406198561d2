//! End-to-end planner and applier scenarios over a real SQLite store.
//!
//! Covers the contract the application layer relies on: deterministic
//! planning, buffer handling, stale-plan re-validation at apply time, and
//! pre-existing bookings being left alone.

use chrono::{Duration, NaiveDate};
use tempfile::TempDir;

use roadcase_core::model::kit::{Kit, KitStatus, KitTier};
use roadcase_core::store::sqlite::SqliteStore;
use roadcase_core::{EventRef, EventSource, FleetConfig, FleetError, FleetStore, lifecycle};
use roadcase_plan::{FleetScheduler, FleetSnapshot, KitState, PlanRequest, plan};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Day `n` of the shared test calendar.
fn day(n: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 1).expect("valid date") + Duration::days(n)
}

struct StaticEvents(Vec<EventRef>);

impl EventSource for StaticEvents {
    fn upcoming_events(&self, ids: Option<&[String]>) -> Result<Vec<EventRef>, FleetError> {
        Ok(self
            .0
            .iter()
            .filter(|event| ids.is_none_or(|ids| ids.contains(&event.id)))
            .cloned()
            .collect())
    }
}

fn kit(id: &str, tier: KitTier) -> Kit {
    Kit {
        id: id.to_string(),
        name: format!("Kit {id}"),
        code: None,
        tier,
        status: KitStatus::Available,
        default_ship_days: 3,
        default_return_days: 5,
        home_location: "Leeds".to_string(),
        current_location: "Leeds".to_string(),
    }
}

fn event(id: &str, start: i64, end: i64) -> EventRef {
    EventRef {
        id: id.to_string(),
        name: format!("Event {id}"),
        location: "Hall 1".to_string(),
        start: Some(day(start)),
        end: Some(day(end)),
    }
}

fn scheduler(
    kits: &[Kit],
    events: Vec<EventRef>,
) -> (TempDir, FleetScheduler<SqliteStore, StaticEvents>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let store = SqliteStore::open(&dir.path().join("fleet.sqlite3")).expect("open store");
    for k in kits {
        store.upsert_kit(k).expect("insert kit");
    }
    let scheduler = FleetScheduler::new(store, StaticEvents(events), FleetConfig::default());
    (dir, scheduler)
}

// ---------------------------------------------------------------------------
// Planner scenarios
// ---------------------------------------------------------------------------

/// The canonical single-kit scenario: the first event books the kit through
/// its return transit plus buffer, which pushes the second event out of
/// reach. No warning fires because the second event was never assigned.
#[test]
fn one_kit_two_events_with_a_wide_buffer() {
    let snapshot = FleetSnapshot {
        kits: vec![KitState {
            kit: kit("k1", KitTier::Standard),
            available_from: day(0),
        }],
        assigned_event_ids: std::collections::HashSet::new(),
    };
    let request = PlanRequest {
        events: vec![event("e1", 20, 22), event("e2", 25, 27)],
        buffer_days: 7,
        preferred_tiers: Vec::new(),
        tight_turnaround_days: 10,
    };

    let result = plan(&snapshot, &request);

    // e1's need-by is day 13, and k1 is free from day 0.
    assert_eq!(result.suggestions.len(), 1);
    let s = &result.suggestions[0];
    assert_eq!(s.event_id, "e1");
    assert_eq!(s.kit_id, "k1");
    assert_eq!(s.ship_date, day(17));

    // k1's simulated availability advanced to 22 + 7 + 5 = day 34, so e2
    // (need-by day 18) is out of reach.
    assert_eq!(result.unassignable.len(), 1);
    assert_eq!(result.unassignable[0].event_id, "e2");
    assert_eq!(
        result.unassignable[0].reason.to_string(),
        "no kits available for the required dates"
    );

    assert!(result.warnings.is_empty());
}

#[test]
fn planning_through_the_scheduler_is_deterministic() {
    let kits = [
        kit("k1", KitTier::Compact),
        kit("k2", KitTier::Standard),
        kit("k3", KitTier::Flagship),
    ];
    let events = vec![
        event("e1", 10, 11),
        event("e2", 12, 16),
        event("e3", 14, 15),
        event("e4", 40, 41),
    ];
    let (_dir, scheduler) = scheduler(&kits, events);

    let first = scheduler
        .plan(None, Some(2), vec![KitTier::Flagship], day(0))
        .expect("first plan");
    let second = scheduler
        .plan(None, Some(2), vec![KitTier::Flagship], day(0))
        .expect("second plan");

    assert_eq!(first, second);
    assert!(!first.suggestions.is_empty());
}

#[test]
fn events_already_booked_are_left_untouched() {
    let kits = [kit("k1", KitTier::Standard), kit("k2", KitTier::Standard)];
    let events = vec![event("e1", 20, 22), event("e2", 40, 42)];
    let (_dir, scheduler) = scheduler(&kits, events);

    // e1 is booked manually before planning.
    scheduler
        .create_assignment(manual_booking("k1", "e1", 20, 22), day(0))
        .expect("manual booking");

    let result = scheduler.plan(None, Some(2), Vec::new(), day(0)).expect("plan");

    assert_eq!(result.suggestions.len(), 1);
    assert_eq!(result.suggestions[0].event_id, "e2");
    assert!(result.unassignable.is_empty());
}

#[test]
fn maintenance_kits_are_not_offered() {
    let mut sidelined = kit("k1", KitTier::Standard);
    sidelined.status = KitStatus::Maintenance;
    let kits = [sidelined, kit("k2", KitTier::Standard)];
    let (_dir, scheduler) = scheduler(&kits, vec![event("e1", 20, 22)]);

    let result = scheduler.plan(None, Some(2), Vec::new(), day(0)).expect("plan");

    assert_eq!(result.suggestions.len(), 1);
    assert_eq!(result.suggestions[0].kit_id, "k2");
    assert!(result.suggestions[0].alternatives.is_empty());
}

#[test]
fn event_id_filter_narrows_the_plan() {
    let kits = [kit("k1", KitTier::Standard)];
    let events = vec![event("e1", 20, 22), event("e2", 40, 42)];
    let (_dir, scheduler) = scheduler(&kits, events);

    let only_e2 = vec!["e2".to_string()];
    let result = scheduler
        .plan(Some(&only_e2), Some(2), Vec::new(), day(0))
        .expect("plan");

    assert_eq!(result.suggestions.len(), 1);
    assert_eq!(result.suggestions[0].event_id, "e2");
}

// ---------------------------------------------------------------------------
// Apply scenarios
// ---------------------------------------------------------------------------

fn manual_booking(kit_id: &str, event_id: &str, start: i64, end: i64) -> lifecycle::NewAssignment {
    lifecycle::NewAssignment {
        kit_id: kit_id.to_string(),
        event_id: event_id.to_string(),
        event_name: format!("Event {event_id}"),
        event_start: day(start),
        event_end: day(end),
        ship_date: None,
        arrival_date: None,
        return_ship_date: None,
        return_arrival_date: None,
        buffer_days: 0,
        auto_planned: false,
        plan_reason: None,
        confidence: None,
        notes: None,
    }
}

#[test]
fn applying_a_fresh_plan_creates_assignments() {
    let kits = [kit("k1", KitTier::Standard)];
    let (_dir, scheduler) = scheduler(&kits, vec![event("e1", 20, 22)]);

    let result = scheduler.plan(None, Some(2), Vec::new(), day(0)).expect("plan");
    let outcome = scheduler
        .apply_plan(&result.suggestions, day(0))
        .expect("apply");

    assert_eq!(outcome.created.len(), 1);
    assert!(outcome.failed.is_empty());

    let created = &outcome.created[0];
    assert_eq!(created.kit_id, "k1");
    assert_eq!(created.event_id, "e1");
    assert!(created.auto_planned);
    assert_eq!(created.ship_date, Some(day(17)));
    assert_eq!(created.return_arrival_date, Some(day(27)));
    assert!(created.confidence.is_some());

    let active = scheduler
        .store()
        .active_assignments_for_kit("k1")
        .expect("active query");
    assert_eq!(active.len(), 1);
}

/// A booking that lands between plan generation and apply must surface as a
/// per-suggestion failure, never as a silent double-booking.
#[test]
fn stale_suggestions_fail_instead_of_double_booking() {
    let kits = [kit("k1", KitTier::Standard)];
    let (_dir, scheduler) = scheduler(&kits, vec![event("e1", 20, 22)]);

    let result = scheduler.plan(None, Some(2), Vec::new(), day(0)).expect("plan");
    assert_eq!(result.suggestions.len(), 1);

    // Someone books the kit over e1's window while the plan sits in review.
    lifecycle::create(scheduler.store(), manual_booking("k1", "rush", 18, 24), day(0))
        .expect("race booking");

    let outcome = scheduler
        .apply_plan(&result.suggestions, day(0))
        .expect("apply");

    assert!(outcome.created.is_empty());
    assert_eq!(outcome.failed.len(), 1);
    let failure = &outcome.failed[0];
    assert_eq!(failure.event_id, "e1");
    assert_eq!(failure.kit_id, "k1");
    assert!(failure.reason.contains("conflict"), "reason: {}", failure.reason);
    assert!(failure.reason.contains("rush"), "reason: {}", failure.reason);

    // The race winner is the only active assignment.
    let active = scheduler
        .store()
        .active_assignments_for_kit("k1")
        .expect("active query");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].event_id, "rush");
}

#[test]
fn partial_apply_commits_what_it_can() {
    let kits = [kit("k1", KitTier::Standard), kit("k2", KitTier::Standard)];
    let events = vec![event("e1", 20, 22), event("e2", 21, 23)];
    let (_dir, scheduler) = scheduler(&kits, events);

    let result = scheduler.plan(None, Some(1), Vec::new(), day(0)).expect("plan");
    assert_eq!(result.suggestions.len(), 2);

    // Knock out k2 only; e1's suggestion on k1 must still commit.
    let loser_kit = &result.suggestions[1].kit_id;
    lifecycle::create(
        scheduler.store(),
        manual_booking(loser_kit, "walk-in", 15, 30),
        day(0),
    )
    .expect("race booking");

    let outcome = scheduler
        .apply_plan(&result.suggestions, day(0))
        .expect("apply");

    assert_eq!(outcome.created.len(), 1);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.created[0].kit_id, result.suggestions[0].kit_id);
}

#[test]
fn applying_a_suggestion_for_an_unknown_kit_aborts() {
    let kits = [kit("k1", KitTier::Standard)];
    let (_dir, scheduler) = scheduler(&kits, vec![event("e1", 20, 22)]);

    let result = scheduler.plan(None, Some(2), Vec::new(), day(0)).expect("plan");
    let mut stale = result.suggestions;
    stale[0].kit_id = "decommissioned".to_string();

    assert!(matches!(
        scheduler.apply_plan(&stale, day(0)),
        Err(FleetError::KitNotFound(id)) if id == "decommissioned"
    ));
}
