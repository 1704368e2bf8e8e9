//! Scoring-factor weights.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Relative weight of each scoring factor, in points out of 100, plus the evaluation decay
/// rate.
///
/// The engine scales faithfully to whatever weights it is given; the sum-to-100 and
/// decay-in-`[0, 1]` invariants are enforced where configurations are accepted
/// ([`crate::model::PriorityWeightsConfig::validate`]), not here.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoringWeights {
    pub medical_urgency: f64,
    pub time_on_waitlist: f64,
    pub organ_specific: f64,
    pub evaluation_recency: f64,
    pub blood_type_rarity: f64,
    /// Fraction of the evaluation-recency factor lost per 90 days without review.
    pub evaluation_decay_rate: f64,
}

/// The weights in effect when no configuration has been activated.
pub const DEFAULT_WEIGHTS: ScoringWeights = ScoringWeights {
    medical_urgency: 30.0,
    time_on_waitlist: 25.0,
    organ_specific: 25.0,
    evaluation_recency: 10.0,
    blood_type_rarity: 10.0,
    evaluation_decay_rate: 0.5,
};

impl Default for ScoringWeights {
    fn default() -> Self {
        DEFAULT_WEIGHTS
    }
}
