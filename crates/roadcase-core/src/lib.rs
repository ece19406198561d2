//! roadcase-core: fleet data model, availability math, assignment
//! lifecycle, and storage.
//!
//! A kit is a physical, shippable booth package; an event borrows exactly
//! one kit for a date range plus transit. This crate owns the non-overlap
//! invariant: for any kit, active assignments never occupy overlapping
//! windows. The planner and applier live in `roadcase-plan`.

pub mod availability;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod store;
pub mod window;

pub use availability::{ConflictDescriptor, available_from, conflicts, is_available};
pub use config::{FleetConfig, SchedulingConfig, load_config};
pub use error::{ErrorCode, FleetError};
pub use lifecycle::{DatePatch, NewAssignment};
pub use model::assignment::{Assignment, AssignmentStatus};
pub use model::event::EventRef;
pub use model::kit::{Kit, KitStatus, KitTier};
pub use store::{EventSource, FleetStore};
pub use window::{DateRange, occupied_window};
