use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, normalize};

/// Lifecycle states for a kit-to-event assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Planned,
    Confirmed,
    Shipped,
    AtVenue,
    Returned,
    Cancelled,
}

impl AssignmentStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::AtVenue => "at_venue",
            Self::Returned => "returned",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transitions, not even forced ones.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Returned | Self::Cancelled)
    }

    /// Active assignments are the only ones counted against a kit's
    /// occupied windows.
    #[must_use]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Returned | Self::Cancelled)
    }

    /// Validate whether a transition from self to `target` is allowed.
    ///
    /// Valid transitions:
    /// - `planned -> confirmed`
    /// - `confirmed -> shipped`
    /// - `shipped -> at_venue`
    /// - `at_venue -> returned`
    /// - any non-terminal state `-> cancelled`
    pub fn can_transition_to(self, target: Self) -> Result<(), InvalidTransition> {
        if self == target {
            return Err(InvalidTransition {
                from: self,
                to: target,
                reason: "no-op transition is not allowed",
            });
        }

        if self.is_terminal() {
            return Err(InvalidTransition {
                from: self,
                to: target,
                reason: "assignment is in a terminal state",
            });
        }

        let allowed = matches!(
            (self, target),
            (Self::Planned, Self::Confirmed)
                | (Self::Confirmed, Self::Shipped)
                | (Self::Shipped, Self::AtVenue)
                | (Self::AtVenue, Self::Returned)
                | (_, Self::Cancelled)
        );

        if allowed {
            Ok(())
        } else {
            Err(InvalidTransition {
                from: self,
                to: target,
                reason: "transition not allowed by lifecycle rules",
            })
        }
    }
}

/// Error returned when a status transition is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: AssignmentStatus,
    pub to: AssignmentStatus,
    pub reason: &'static str,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.reason)
    }
}

impl std::error::Error for InvalidTransition {}

/// One kit booked for one event, with shipping milestones.
///
/// Event name and dates are snapshotted at creation so window math never
/// needs an event lookup and later logistics edits cannot move a committed
/// window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub kit_id: String,
    pub event_id: String,
    pub event_name: String,
    pub event_start: NaiveDate,
    pub event_end: NaiveDate,
    pub status: AssignmentStatus,
    pub ship_date: Option<NaiveDate>,
    pub arrival_date: Option<NaiveDate>,
    pub return_ship_date: Option<NaiveDate>,
    pub return_arrival_date: Option<NaiveDate>,
    /// Whether the automatic planner created this assignment.
    pub auto_planned: bool,
    pub plan_reason: Option<String>,
    /// Planner confidence in `[0, 1]`; absent for manual bookings.
    pub confidence: Option<f64>,
    pub notes: Option<String>,
    pub created_on: NaiveDate,
}

impl Assignment {
    /// Whether this assignment currently occupies its kit.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "planned" => Ok(Self::Planned),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "at_venue" => Ok(Self::AtVenue),
            "returned" => Ok(Self::Returned),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(ParseEnumError {
                expected: "assignment status",
                got: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AssignmentStatus, InvalidTransition};
    use std::str::FromStr;

    const ALL: [AssignmentStatus; 6] = [
        AssignmentStatus::Planned,
        AssignmentStatus::Confirmed,
        AssignmentStatus::Shipped,
        AssignmentStatus::AtVenue,
        AssignmentStatus::Returned,
        AssignmentStatus::Cancelled,
    ];

    #[test]
    fn display_parse_roundtrips() {
        for status in ALL {
            let rendered = status.to_string();
            assert_eq!(AssignmentStatus::from_str(&rendered).unwrap(), status);
        }
        assert!(AssignmentStatus::from_str("lost").is_err());
    }

    #[test]
    fn main_chain_is_forward_only() {
        assert!(
            AssignmentStatus::Planned
                .can_transition_to(AssignmentStatus::Confirmed)
                .is_ok()
        );
        assert!(
            AssignmentStatus::Confirmed
                .can_transition_to(AssignmentStatus::Shipped)
                .is_ok()
        );
        assert!(
            AssignmentStatus::Shipped
                .can_transition_to(AssignmentStatus::AtVenue)
                .is_ok()
        );
        assert!(
            AssignmentStatus::AtVenue
                .can_transition_to(AssignmentStatus::Returned)
                .is_ok()
        );

        // No skipping and no reversing on the normal path.
        assert!(
            AssignmentStatus::Planned
                .can_transition_to(AssignmentStatus::Shipped)
                .is_err()
        );
        assert!(
            AssignmentStatus::Confirmed
                .can_transition_to(AssignmentStatus::AtVenue)
                .is_err()
        );
        assert!(
            AssignmentStatus::Shipped
                .can_transition_to(AssignmentStatus::Confirmed)
                .is_err()
        );
    }

    #[test]
    fn cancel_is_reachable_from_every_non_terminal_state() {
        for status in ALL {
            let result = status.can_transition_to(AssignmentStatus::Cancelled);
            if status.is_terminal() {
                assert!(result.is_err(), "{status} should not cancel");
            } else {
                assert!(result.is_ok(), "{status} should cancel");
            }
        }
    }

    #[test]
    fn terminal_states_admit_nothing() {
        for from in [AssignmentStatus::Returned, AssignmentStatus::Cancelled] {
            for to in ALL {
                assert!(matches!(
                    from.can_transition_to(to),
                    Err(InvalidTransition { .. })
                ));
            }
        }
    }

    #[test]
    fn active_excludes_exactly_returned_and_cancelled() {
        for status in ALL {
            assert_eq!(
                status.is_active(),
                !matches!(
                    status,
                    AssignmentStatus::Returned | AssignmentStatus::Cancelled
                )
            );
        }
    }
}
