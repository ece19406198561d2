use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, normalize};
use crate::model::assignment::{Assignment, AssignmentStatus};

/// Size/tier classes for a kit.
///
/// A scoring signal only — the planner never treats tier as a hard
/// constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KitTier {
    Compact,
    Standard,
    Flagship,
}

impl KitTier {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Standard => "standard",
            Self::Flagship => "flagship",
        }
    }
}

/// Coarse fleet-summary status for a kit.
///
/// Derivable from the kit's nearest active assignment; it is a display
/// value, never consulted by availability or conflict math.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KitStatus {
    Available,
    Assigned,
    InTransit,
    AtVenue,
    Maintenance,
}

impl KitStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Assigned => "assigned",
            Self::InTransit => "in_transit",
            Self::AtVenue => "at_venue",
            Self::Maintenance => "maintenance",
        }
    }
}

/// A physical, shippable booth package tracked as a schedulable resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Kit {
    /// Stable identity; immutable for the life of the kit.
    pub id: String,
    pub name: String,
    pub code: Option<String>,
    pub tier: KitTier,
    pub status: KitStatus,
    /// Default outbound transit days, used when an assignment has no
    /// explicit ship date.
    pub default_ship_days: i64,
    /// Default return transit days, used when an assignment has no explicit
    /// return-arrival date.
    pub default_return_days: i64,
    pub home_location: String,
    pub current_location: String,
}

impl Kit {
    /// Derive the display status from this kit's assignments.
    ///
    /// `Maintenance` is sticky: an out-of-service kit stays out of service
    /// regardless of assignment history. Otherwise the status follows the
    /// nearest active assignment (earliest event start), and `Available`
    /// when there is none.
    #[must_use]
    pub fn display_status(&self, assignments: &[Assignment]) -> KitStatus {
        if self.status == KitStatus::Maintenance {
            return KitStatus::Maintenance;
        }

        let nearest = assignments
            .iter()
            .filter(|a| a.is_active())
            .min_by_key(|a| a.event_start);

        match nearest.map(|a| a.status) {
            Some(AssignmentStatus::Shipped) => KitStatus::InTransit,
            Some(AssignmentStatus::AtVenue) => KitStatus::AtVenue,
            Some(_) => KitStatus::Assigned,
            None => KitStatus::Available,
        }
    }
}

impl fmt::Display for KitTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for KitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KitTier {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "compact" => Ok(Self::Compact),
            "standard" => Ok(Self::Standard),
            "flagship" => Ok(Self::Flagship),
            _ => Err(ParseEnumError {
                expected: "tier",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for KitStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "available" => Ok(Self::Available),
            "assigned" => Ok(Self::Assigned),
            "in_transit" => Ok(Self::InTransit),
            "at_venue" => Ok(Self::AtVenue),
            "maintenance" => Ok(Self::Maintenance),
            _ => Err(ParseEnumError {
                expected: "kit status",
                got: s.to_string(),
            }),
        }
    }
}
