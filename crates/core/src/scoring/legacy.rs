//! First-generation scoring formula.
//!
//! Kept as an alternate entry point for comparison against historical scores. The formula
//! works in coarse fixed point bands (30/25/25/10/10) with no multipliers, no configurable
//! weights and no per-factor breakdown. New scoring work belongs in the main engine; this
//! module changes only if the historical behaviour was recorded wrongly.

use crate::model::{BloodType, MedicalUrgency, OrganType, Patient};
use chrono::{DateTime, Utc};

/// Computes the first-generation priority score, clamped to `[0, 100]`.
///
/// Pure function of `(patient, now)`; weights are hard-coded.
pub fn compute_legacy_priority(patient: &Patient, now: DateTime<Utc>) -> f64 {
    let urgency = match patient.medical_urgency {
        Some(MedicalUrgency::Critical) => 30.0,
        Some(MedicalUrgency::High) => 20.0,
        Some(MedicalUrgency::Medium) => 10.0,
        Some(MedicalUrgency::Low) => 5.0,
        None => 10.0,
    };

    // One point roughly every two weeks, capped at 25.
    let waitlist = patient.date_added_to_waitlist.map_or(0.0, |added| {
        let days = (now - added).num_days();
        (days as f64 / 14.6).floor().min(25.0)
    });

    let organ = match patient.organ_needed {
        OrganType::Liver => patient
            .meld_score
            .map_or(0.0, |meld| (meld - 6.0) / 34.0 * 25.0),
        OrganType::Lung => patient.las_score.map_or(0.0, |las| las * 0.25),
        OrganType::Kidney => {
            let pra = patient.pra.map_or(0.0, |pra| (pra * 0.15).min(15.0));
            let cpra = patient.cpra.map_or(0.0, |cpra| (cpra * 0.1).min(10.0));
            pra + cpra
        }
        OrganType::Heart
        | OrganType::Pancreas
        | OrganType::KidneyPancreas
        | OrganType::Intestine => 0.0,
    };

    let recency = match patient.last_evaluation_date {
        Some(evaluated) if (now - evaluated).num_days() <= 90 => 10.0,
        _ => 0.0,
    };

    let rarity = match patient.blood_type {
        Some(BloodType::AbNegative) => 10.0,
        Some(BloodType::BNegative) => 8.0,
        Some(BloodType::ANegative) => 7.0,
        Some(BloodType::ONegative) => 6.0,
        Some(BloodType::AbPositive) => 5.0,
        Some(BloodType::BPositive) => 4.0,
        Some(BloodType::APositive) => 2.0,
        Some(BloodType::OPositive) => 1.0,
        None => 2.0,
    };

    (urgency + waitlist + organ + recency + rarity).clamp(0.0, 100.0)
}
