use std::fmt;

use crate::availability::ConflictDescriptor;
use crate::model::assignment::{AssignmentStatus, InvalidTransition};
use crate::store::lock::LockError;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    ConfigParseError,
    KitNotFound,
    AssignmentNotFound,
    EventNotSchedulable,
    InvalidStatusTransition,
    AssignmentConflict,
    StorageFailure,
    LockContention,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ValidationFailed => "E1001",
            Self::ConfigParseError => "E1002",
            Self::KitNotFound => "E2001",
            Self::AssignmentNotFound => "E2002",
            Self::EventNotSchedulable => "E2003",
            Self::InvalidStatusTransition => "E2004",
            Self::AssignmentConflict => "E3001",
            Self::StorageFailure => "E5001",
            Self::LockContention => "E5002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ValidationFailed => "Validation failed",
            Self::ConfigParseError => "Config file parse error",
            Self::KitNotFound => "Kit not found",
            Self::AssignmentNotFound => "Assignment not found",
            Self::EventNotSchedulable => "Event has no usable date range",
            Self::InvalidStatusTransition => "Invalid status transition",
            Self::AssignmentConflict => "Kit already booked over the requested window",
            Self::StorageFailure => "Storage operation failed",
            Self::LockContention => "Write lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ValidationFailed => None,
            Self::ConfigParseError => Some("Fix syntax in roadcase.toml and retry."),
            Self::KitNotFound | Self::AssignmentNotFound => None,
            Self::EventNotSchedulable => {
                Some("Set both start and end dates on the event before scheduling.")
            }
            Self::InvalidStatusTransition => Some(
                "Follow planned -> confirmed -> shipped -> at_venue -> returned, or use force_status.",
            ),
            Self::AssignmentConflict => {
                Some("Pick another kit, shift the dates, or cancel the conflicting assignment.")
            }
            Self::StorageFailure => Some("Check the database file and disk state, then retry."),
            Self::LockContention => Some("Retry after the other writer releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// All failures the scheduling engine can surface.
///
/// Conflicts carry the offending assignments so callers can render *why* a
/// booking was refused and offer alternatives.
#[derive(Debug, thiserror::Error)]
pub enum FleetError {
    /// Malformed input, rejected before touching storage.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Referenced kit id does not exist.
    #[error("kit not found: {0}")]
    KitNotFound(String),

    /// Referenced assignment id does not exist.
    #[error("assignment not found: {0}")]
    AssignmentNotFound(String),

    /// The event is missing a date or has an inverted range.
    #[error("event {0} has no usable date range")]
    EventNotSchedulable(String),

    /// A status change the lifecycle rules forbid.
    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: AssignmentStatus,
        to: AssignmentStatus,
    },

    /// The non-overlap invariant would be violated.
    #[error("kit {kit_id} already booked over the requested window ({} conflict(s))", .conflicts.len())]
    Conflict {
        kit_id: String,
        conflicts: Vec<ConflictDescriptor>,
    },

    /// Storage-layer failure.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// I/O failure around the storage files.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Write-lock acquisition failure.
    #[error("lock error: {0}")]
    Lock(#[from] LockError),
}

impl FleetError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationFailed,
            Self::KitNotFound(_) => ErrorCode::KitNotFound,
            Self::AssignmentNotFound(_) => ErrorCode::AssignmentNotFound,
            Self::EventNotSchedulable(_) => ErrorCode::EventNotSchedulable,
            Self::InvalidTransition { .. } => ErrorCode::InvalidStatusTransition,
            Self::Conflict { .. } => ErrorCode::AssignmentConflict,
            Self::Storage(_) | Self::Io(_) => ErrorCode::StorageFailure,
            Self::Lock(_) => ErrorCode::LockContention,
        }
    }

    /// Optional remediation hint for operators.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl From<InvalidTransition> for FleetError {
    fn from(err: InvalidTransition) -> Self {
        Self::InvalidTransition {
            from: err.from,
            to: err.to,
        }
    }
}
