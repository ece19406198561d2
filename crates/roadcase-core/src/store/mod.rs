//! Storage and collaborator interfaces.
//!
//! The engine is written against the [`FleetStore`] and [`EventSource`]
//! traits; the shipped backend is SQLite ([`sqlite::SqliteStore`]). A store
//! instance is always a single-tenant view — tenant scoping happens in the
//! layer that constructs the store.

pub mod lock;
pub mod sqlite;

use crate::error::FleetError;
use crate::model::{assignment::Assignment, event::EventRef, kit::Kit};

/// Persistence for kits and assignments.
///
/// All assignment writes flow through the lifecycle mutators, which hold the
/// [`FleetStore::lock_writes`] guard across their conflict re-check and the
/// write itself.
pub trait FleetStore {
    /// Guard type returned by [`Self::lock_writes`]; holding it serializes
    /// check-then-act sequences against other writers of the same store.
    type WriteGuard;

    fn kit(&self, kit_id: &str) -> Result<Option<Kit>, FleetError>;

    fn kits(&self) -> Result<Vec<Kit>, FleetError>;

    fn upsert_kit(&self, kit: &Kit) -> Result<(), FleetError>;

    fn assignment(&self, assignment_id: &str) -> Result<Option<Assignment>, FleetError>;

    /// Active assignments (not cancelled, not returned) for one kit.
    fn active_assignments_for_kit(&self, kit_id: &str) -> Result<Vec<Assignment>, FleetError>;

    /// Active assignments across the whole fleet view.
    fn active_assignments(&self) -> Result<Vec<Assignment>, FleetError>;

    fn insert_assignment(&self, assignment: &Assignment) -> Result<(), FleetError>;

    fn update_assignment(&self, assignment: &Assignment) -> Result<(), FleetError>;

    fn delete_assignment(&self, assignment_id: &str) -> Result<(), FleetError>;

    /// Acquire the store-wide write guard.
    fn lock_writes(&self) -> Result<Self::WriteGuard, FleetError>;
}

/// Source of upcoming event records, owned by a collaborator.
pub trait EventSource {
    /// Upcoming events, optionally restricted to `ids`; implementations
    /// return them sorted or sortable by start date.
    fn upcoming_events(&self, ids: Option<&[String]>) -> Result<Vec<EventRef>, FleetError>;
}
