//! Priority scoring engine.
//!
//! A patient's priority score is a weighted blend of five factors, each expressed on a
//! 0-100 scale before weighting:
//!
//! - **medical urgency** — clinician-assessed urgency, amplified by functional status and
//!   prognosis multipliers; the product is not capped at 100 and the overflow carries
//!   through the weighting.
//! - **time on waitlist** — days waited against a two-year scale.
//! - **organ-specific** — MELD (liver), LAS (lung) or PRA/CPRA sensitisation (kidney);
//!   other organs fall back to a fraction of the urgency lookup value.
//! - **evaluation recency** — full marks within 90 days of the last evaluation, then
//!   exponential decay per further 90-day period.
//! - **blood-type rarity** — rarer groups wait longer for compatible organs.
//!
//! After the weighted sum, three additive adjustments apply (comorbidity and retransplant
//! penalties, compliance bonus) and the final score is clamped to `[0, 100]`.
//!
//! Scoring is deterministic: the same `(patient, weights, now)` always produces the same
//! score and the same breakdown, bit for bit. All clock and storage access lives in
//! [`ScoringService`]; [`compute_priority`] itself is a pure function.

pub mod legacy;
mod weights;

pub use weights::{ScoringWeights, DEFAULT_WEIGHTS};

use crate::config::CoreConfig;
use crate::error::TrackResult;
use crate::model::{
    AuditAction, FunctionalStatus, MedicalUrgency, OrganType, Patient, PrognosisRating,
};
use crate::repositories;
use crate::repositories::shared::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use transtrack_types::EntityId;
use utoipa::ToSchema;

/// One factor of a computed score: the raw 0-100 value and its weighted contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FactorScore {
    pub raw: f64,
    pub weighted: f64,
}

/// The three additive adjustments applied after the weighted sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreAdjustments {
    /// `-(comorbidity_score / 10) * 10`; zero when unrecorded.
    pub comorbidity_penalty: f64,
    /// `-5` per previous transplant.
    pub retransplant_penalty: f64,
    /// `+(compliance_score / 10) * 5`; zero when unrecorded.
    pub compliance_bonus: f64,
}

impl ScoreAdjustments {
    pub fn total(&self) -> f64 {
        self.comorbidity_penalty + self.retransplant_penalty + self.compliance_bonus
    }
}

/// Per-factor decomposition of one scoring run, persisted alongside the final score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ScoreBreakdown {
    pub medical_urgency: FactorScore,
    pub time_on_waitlist: FactorScore,
    pub organ_specific: FactorScore,
    pub evaluation_recency: FactorScore,
    pub blood_type_rarity: FactorScore,
    pub adjustments: ScoreAdjustments,
    /// Sum of the five weighted factor values, before adjustments and clamping.
    pub weighted_total: f64,
    pub final_score: f64,
    pub weights_used: ScoringWeights,
    pub computed_at: DateTime<Utc>,
}

impl ScoreBreakdown {
    /// The `count` largest weighted factors as `"name value"` pairs, for the audit trail.
    pub fn strongest_factors(&self, count: usize) -> String {
        let mut factors = [
            ("medical_urgency", self.medical_urgency.weighted),
            ("time_on_waitlist", self.time_on_waitlist.weighted),
            ("organ_specific", self.organ_specific.weighted),
            ("evaluation_recency", self.evaluation_recency.weighted),
            ("blood_type_rarity", self.blood_type_rarity.weighted),
        ];
        factors.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        factors
            .iter()
            .take(count)
            .map(|(name, weighted)| format!("{name} {weighted:.1}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Result of one scoring run. `score` mirrors `breakdown.final_score`.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityScore {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Base urgency lookup. The unset fallback is the `medium` value, not zero: an unassessed
/// patient is treated as middling rather than non-urgent.
fn urgency_base(urgency: Option<MedicalUrgency>) -> f64 {
    match urgency {
        Some(MedicalUrgency::Critical) => 100.0,
        Some(MedicalUrgency::High) => 75.0,
        Some(MedicalUrgency::Medium) => 50.0,
        Some(MedicalUrgency::Low) => 25.0,
        None => 50.0,
    }
}

fn functional_multiplier(status: Option<FunctionalStatus>) -> f64 {
    match status {
        Some(FunctionalStatus::Critical) => 1.2,
        Some(FunctionalStatus::FullyDependent) => 1.1,
        Some(FunctionalStatus::PartiallyDependent) => 1.0,
        Some(FunctionalStatus::Independent) => 0.95,
        None => 1.0,
    }
}

fn prognosis_multiplier(prognosis: Option<PrognosisRating>) -> f64 {
    match prognosis {
        Some(PrognosisRating::Critical) => 1.3,
        Some(PrognosisRating::Poor) => 1.15,
        Some(PrognosisRating::Fair) => 1.0,
        Some(PrognosisRating::Good) => 0.95,
        Some(PrognosisRating::Excellent) => 0.9,
        None => 1.0,
    }
}

/// Urgency factor: base lookup amplified by functional status and prognosis. Not capped;
/// the maximum combination reaches 156.
fn medical_urgency_raw(patient: &Patient) -> f64 {
    urgency_base(patient.medical_urgency)
        * functional_multiplier(patient.functional_status)
        * prognosis_multiplier(patient.prognosis)
}

/// Waitlist factor: linear against a 730-day scale, with a flat +10 beyond three years.
/// No waitlist date scores zero.
fn time_on_waitlist_raw(waitlist_days: Option<i64>) -> f64 {
    let Some(days) = waitlist_days else {
        return 0.0;
    };
    let base = (days as f64 / 730.0 * 100.0).min(100.0);
    if days > 1095 {
        (base + 10.0).min(100.0)
    } else {
        base
    }
}

/// Organ-specific factor.
///
/// Liver uses the MELD range 6-40 stretched to 0-100 (uncapped either side, so an
/// out-of-range MELD carries through). Lung uses the LAS directly. Kidney builds a base of
/// 50 plus sensitisation (PRA, CPRA) even when neither antibody value is on file. A liver
/// or lung case with no measurement recorded, and every organ without a formula of its
/// own, falls back to the raw urgency lookup value (before the multipliers) at 60%.
fn organ_specific_raw(patient: &Patient) -> f64 {
    let urgency_fallback = urgency_base(patient.medical_urgency) * 0.6;
    match patient.organ_needed {
        OrganType::Liver => patient
            .meld_score
            .map_or(urgency_fallback, |meld| (meld - 6.0) / 34.0 * 100.0),
        OrganType::Lung => patient.las_score.unwrap_or(urgency_fallback),
        OrganType::Kidney => {
            let pra = patient.pra.unwrap_or(0.0);
            let cpra = patient.cpra.unwrap_or(0.0);
            (50.0 + pra / 100.0 * 30.0 + cpra / 100.0 * 20.0).min(100.0)
        }
        OrganType::Heart
        | OrganType::Pancreas
        | OrganType::KidneyPancreas
        | OrganType::Intestine => urgency_fallback,
    }
}

/// Recency factor: 100 within 90 days of the last evaluation, then decayed once per whole
/// further 90-day period. Never evaluated scores zero.
fn evaluation_recency_raw(
    last_evaluation: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    decay_rate: f64,
) -> f64 {
    let Some(evaluated) = last_evaluation else {
        return 0.0;
    };
    let days = (now - evaluated).num_days();
    if days <= 90 {
        100.0
    } else {
        let periods = (days as f64 / 90.0).floor() as i32;
        100.0 * (1.0 - decay_rate).powi(periods)
    }
}

fn blood_type_rarity_raw(patient: &Patient) -> f64 {
    match patient.blood_type {
        Some(blood_type) => blood_type.rarity_score(),
        None => 40.0,
    }
}

fn adjustments(patient: &Patient) -> ScoreAdjustments {
    ScoreAdjustments {
        comorbidity_penalty: patient
            .comorbidity_score
            .map_or(0.0, |score| -(score / 10.0) * 10.0),
        retransplant_penalty: patient
            .previous_transplants
            .map_or(0.0, |count| -5.0 * f64::from(count)),
        compliance_bonus: patient
            .compliance_score
            .map_or(0.0, |score| score / 10.0 * 5.0),
    }
}

/// Computes a patient's priority score.
///
/// Pure function of its inputs; `now` is the reference instant for every day count. Every
/// absent clinical field degrades to a documented default rather than failing the run.
pub fn compute_priority(
    patient: &Patient,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> PriorityScore {
    let waitlist_days = patient
        .date_added_to_waitlist
        .map(|added| (now - added).num_days());

    let urgency = medical_urgency_raw(patient);
    let waitlist = time_on_waitlist_raw(waitlist_days);
    let organ = organ_specific_raw(patient);
    let recency =
        evaluation_recency_raw(patient.last_evaluation_date, now, weights.evaluation_decay_rate);
    let rarity = blood_type_rarity_raw(patient);
    let adjustments = adjustments(patient);

    let breakdown = ScoreBreakdown {
        medical_urgency: FactorScore {
            raw: urgency,
            weighted: urgency / 100.0 * weights.medical_urgency,
        },
        time_on_waitlist: FactorScore {
            raw: waitlist,
            weighted: waitlist / 100.0 * weights.time_on_waitlist,
        },
        organ_specific: FactorScore {
            raw: organ,
            weighted: organ / 100.0 * weights.organ_specific,
        },
        evaluation_recency: FactorScore {
            raw: recency,
            weighted: recency / 100.0 * weights.evaluation_recency,
        },
        blood_type_rarity: FactorScore {
            raw: rarity,
            weighted: rarity / 100.0 * weights.blood_type_rarity,
        },
        adjustments,
        weighted_total: 0.0,
        final_score: 0.0,
        weights_used: *weights,
        computed_at: now,
    };

    let weighted_total = breakdown.medical_urgency.weighted
        + breakdown.time_on_waitlist.weighted
        + breakdown.organ_specific.weighted
        + breakdown.evaluation_recency.weighted
        + breakdown.blood_type_rarity.weighted;
    let final_score = (weighted_total + adjustments.total()).clamp(0.0, 100.0);

    let breakdown = ScoreBreakdown {
        weighted_total,
        final_score,
        ..breakdown
    };

    PriorityScore {
        score: final_score,
        breakdown,
    }
}

/// Computes and writes score + breakdown onto `patient` in place.
///
/// Used by intake and edit paths so that a stored patient always carries the engine's most
/// recent output, never a caller-supplied score.
pub fn apply_priority(patient: &mut Patient, weights: &ScoringWeights, now: DateTime<Utc>) {
    let result = compute_priority(patient, weights, now);
    patient.priority_score = Some(result.score);
    patient.priority_score_breakdown = Some(result.breakdown);
}

/// Persisting orchestration around the pure scoring functions.
#[derive(Clone)]
pub struct ScoringService {
    cfg: Arc<CoreConfig>,
}

impl ScoringService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Scores one patient with the active weights and persists score + breakdown.
    ///
    /// Returns the updated record together with the scoring result.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::NotFound` if the patient does not exist; storage errors
    /// propagate unchanged.
    pub fn score_patient(
        &self,
        patient_id: &EntityId,
        actor: &str,
    ) -> TrackResult<(Record<Patient>, PriorityScore)> {
        let record = repositories::patients::get_patient(&self.cfg, patient_id)?;
        let weights = repositories::weights::active_weights(&self.cfg);
        let result = compute_priority(&record.data, &weights, Utc::now());

        let mut patient = record.data;
        patient.priority_score = Some(result.score);
        patient.priority_score_breakdown = Some(result.breakdown.clone());
        let updated = repositories::patients::update_patient(&self.cfg, patient_id, patient)?;

        repositories::audit::record_action(
            &self.cfg,
            AuditAction::PriorityScoreCalculated,
            "patient",
            &patient_id.to_string(),
            format!(
                "priority score {:.2}; strongest factors: {}",
                result.score,
                result.breakdown.strongest_factors(3)
            ),
            actor,
        )?;

        Ok((updated, result))
    }

    /// Scores one patient with the first-generation formula (see [`legacy`]).
    ///
    /// The coarse score replaces the stored one and the advanced breakdown is cleared; a
    /// stored breakdown always describes the stored score.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::NotFound` if the patient does not exist.
    pub fn score_patient_legacy(
        &self,
        patient_id: &EntityId,
        actor: &str,
    ) -> TrackResult<(Record<Patient>, f64)> {
        let record = repositories::patients::get_patient(&self.cfg, patient_id)?;
        let score = legacy::compute_legacy_priority(&record.data, Utc::now());

        let mut patient = record.data;
        patient.priority_score = Some(score);
        patient.priority_score_breakdown = None;
        let updated = repositories::patients::update_patient(&self.cfg, patient_id, patient)?;

        repositories::audit::record_action(
            &self.cfg,
            AuditAction::PriorityScoreRecalculated,
            "patient",
            &patient_id.to_string(),
            format!("legacy priority score {score:.2}"),
            actor,
        )?;

        Ok((updated, score))
    }
}
