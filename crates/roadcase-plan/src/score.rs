//! Scoring policy for the auto-assign planner.
//!
//! Weights live in a named struct so scoring policy can be tuned and tested
//! independently of the allocation loop; the loop itself never contains a
//! literal weight.

use roadcase_core::KitTier;
use serde::{Deserialize, Serialize};

/// Events strictly longer than this many days favor the flagship tier.
pub const LONG_EVENT_DAYS: i64 = 3;

/// Events at most this many days favor the compact tier.
pub const SHORT_EVENT_DAYS: i64 = 2;

/// Configurable weights for candidate scoring:
///
/// `score = base + preferred + affinity + min(slack_days, slack_cap)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Every qualifying kit starts here.
    pub base: i64,
    /// Bonus when the kit's tier is in the caller's preferred list.
    pub preferred_tier: i64,
    /// Bonus for a flagship kit on an event longer than
    /// [`LONG_EVENT_DAYS`].
    pub long_event_flagship: i64,
    /// Bonus for a compact kit on an event of at most
    /// [`SHORT_EVENT_DAYS`] days.
    pub short_event_compact: i64,
    /// Cap on the slack bonus: one point per free day between the kit's
    /// availability and the need-by date, up to this many.
    pub slack_cap: i64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            base: 50,
            preferred_tier: 20,
            long_event_flagship: 15,
            short_event_compact: 10,
            slack_cap: 10,
        }
    }
}

/// Score one qualifying kit for one event.
///
/// `slack_days` is the number of days between the kit's simulated
/// availability and the event's need-by date; callers only score kits with
/// non-negative slack.
#[must_use]
pub fn score_kit(
    tier: KitTier,
    duration_days: i64,
    slack_days: i64,
    preferred_tiers: &[KitTier],
    weights: &ScoreWeights,
) -> i64 {
    let mut score = weights.base;

    if preferred_tiers.contains(&tier) {
        score += weights.preferred_tier;
    }

    if duration_days > LONG_EVENT_DAYS && tier == KitTier::Flagship {
        score += weights.long_event_flagship;
    } else if duration_days <= SHORT_EVENT_DAYS && tier == KitTier::Compact {
        score += weights.short_event_compact;
    }

    score + slack_days.clamp(0, weights.slack_cap)
}

/// Map a score onto the `[0, 1]` confidence scale.
#[must_use]
pub fn confidence(score: i64) -> f64 {
    #[allow(clippy::cast_precision_loss)]
    let ratio = score as f64 / 100.0;
    ratio.min(1.0)
}
