//! roadcase-plan: greedy auto-assign planner, scoring policy, and plan
//! applier.
//!
//! The planner is a pure function over a [`planner::FleetSnapshot`]; the
//! applier closes the propose/commit gap by re-validating every suggestion
//! against current availability. [`scheduler::FleetScheduler`] ties both to
//! a store and an event source for the application layer.

pub mod apply;
pub mod planner;
pub mod scheduler;
pub mod score;

pub use apply::{ApplyFailure, ApplyOutcome, apply};
pub use planner::{
    Alternative, FleetSnapshot, KitState, Plan, PlanRequest, Suggestion, Unassignable,
    UnassignableReason, plan, plan_with_weights,
};
pub use scheduler::FleetScheduler;
pub use score::{ScoreWeights, confidence, score_kit};
