//! Donor matching engine.
//!
//! Matching runs over a snapshot of the active waitlist for the donor's organ type, taken
//! once at the start of the run:
//!
//! 1. **Hard filter** — ABO/Rh compatibility via [`crate::model::BloodType::can_donate_to`].
//!    Candidates without a recorded blood type are excluded; compatibility cannot be
//!    verified without one. This is the only filter — every other missing attribute
//!    degrades the candidate's score instead of removing it.
//! 2. **Evaluate** — HLA antigen overlap, donor/recipient size ratio, time waited.
//! 3. **Rank** — stable descending sort on the composite score; each candidate takes
//!    its 1-based sorted position as rank, so ties resolve in encounter order.
//!
//! [`MatchingService`] persists the top candidates as potential matches and notifies
//! administrators about the leading three. [`rank_candidates`] itself is pure.

use crate::config::CoreConfig;
use crate::error::TrackResult;
use crate::model::{
    AuditAction, DonorOrgan, MatchStatus, Notification, NotificationKind, OrganMatch, Patient,
    PriorityLevel,
};
use crate::repositories;
use crate::repositories::shared::Record;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use transtrack_types::EntityId;

/// Share of the patient's priority score in the composite.
const PRIORITY_SHARE: f64 = 0.4;
/// Share of the HLA overlap score in the composite.
const HLA_SHARE: f64 = 0.25;
/// Flat bonus for an exact blood-group match.
const EXACT_BLOOD_BONUS: f64 = 15.0;
/// Flat bonus for a compatible donor/recipient size ratio.
const SIZE_BONUS: f64 = 10.0;
/// Waiting-time bonus cap (reached after one year on the list).
const WAIT_BONUS_CAP: f64 = 10.0;

/// Matches persisted per run.
pub const MAX_PERSISTED_MATCHES: usize = 10;
/// Leading matches fanned out to administrator notifications.
pub const NOTIFIED_MATCHES: usize = 3;

/// One scored candidate produced by [`rank_candidates`].
#[derive(Debug, Clone, PartialEq)]
pub struct RankedMatch {
    pub patient_id: EntityId,
    pub compatibility_score: f64,
    pub hla_match_score: f64,
    pub size_compatible: bool,
    /// 1-based position in the sorted order; tied composites take consecutive ranks
    /// in filter-encounter order, so no rank repeats.
    pub priority_rank: u32,
}

/// Outcome of one matching run.
#[derive(Debug)]
pub struct MatchRunOutcome {
    pub donor: Record<DonorOrgan>,
    /// Candidates that survived the blood-compatibility filter.
    pub total_compatible: usize,
    /// The persisted matches, best rank first.
    pub matches: Vec<Record<OrganMatch>>,
}

/// Splits an HLA typing string into its antigen set.
///
/// Accepts whitespace-, comma- or semicolon-separated antigen lists
/// (`"A1 A2 B8"`, `"A1,A2;B8"`).
fn hla_antigens(typing: &str) -> HashSet<&str> {
    typing
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .collect()
}

/// Shared antigens against the six classic HLA loci, as a 0-100 score.
///
/// When either side has no typing on file the pairing scores a neutral 50. A typing
/// whose antigen set parses empty counts as no typing; zero only ever means two
/// populated sets with nothing in common.
fn hla_match_score(donor_typing: Option<&str>, patient_typing: Option<&str>) -> f64 {
    match (donor_typing, patient_typing) {
        (Some(donor), Some(patient)) => {
            let donor = hla_antigens(donor);
            let patient = hla_antigens(patient);
            if donor.is_empty() || patient.is_empty() {
                50.0
            } else {
                donor.intersection(&patient).count() as f64 / 6.0 * 100.0
            }
        }
        _ => 50.0,
    }
}

/// Donor/recipient weight ratio check, `[0.7, 1.5]` inclusive.
///
/// Treated as compatible when either weight is unrecorded.
fn size_compatible(donor_kg: Option<f64>, patient_kg: Option<f64>) -> bool {
    match (donor_kg, patient_kg) {
        (Some(donor), Some(patient)) if patient > 0.0 => {
            let ratio = donor / patient;
            (0.7..=1.5).contains(&ratio)
        }
        _ => true,
    }
}

/// Waiting-time bonus: linear against a one-year scale, capped.
fn waiting_bonus(date_added: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    date_added.map_or(0.0, |added| {
        let days = (now - added).num_days();
        (days as f64 / 365.0 * 10.0).min(WAIT_BONUS_CAP)
    })
}

/// Ranks waitlist candidates for a donor organ.
///
/// `candidates` is the active-waitlist snapshot for the donor's organ type; each patient's
/// currently persisted `priority_score` is read from the snapshot (unscored patients count
/// as zero). The function does not touch storage.
pub fn rank_candidates(
    donor: &DonorOrgan,
    candidates: &[Record<Patient>],
    now: DateTime<Utc>,
) -> Vec<RankedMatch> {
    let mut ranked: Vec<RankedMatch> = candidates
        .iter()
        .filter_map(|record| {
            let patient = &record.data;
            let blood_type = patient.blood_type?;
            if !donor.blood_type.can_donate_to(blood_type) {
                return None;
            }

            let hla = hla_match_score(donor.hla_typing.as_deref(), patient.hla_typing.as_deref());
            let size = size_compatible(donor.weight_kg, patient.weight_kg);
            let priority = patient.priority_score.unwrap_or(0.0);

            let mut composite = priority * PRIORITY_SHARE
                + hla * HLA_SHARE
                + waiting_bonus(patient.date_added_to_waitlist, now);
            if blood_type == donor.blood_type {
                composite += EXACT_BLOOD_BONUS;
            }
            if size {
                composite += SIZE_BONUS;
            }

            Some(RankedMatch {
                patient_id: record.id,
                compatibility_score: composite.min(100.0),
                hla_match_score: hla,
                size_compatible: size,
                priority_rank: 0,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.compatibility_score
            .partial_cmp(&a.compatibility_score)
            .unwrap_or(Ordering::Equal)
    });

    for (index, candidate) in ranked.iter_mut().enumerate() {
        candidate.priority_rank = index as u32 + 1;
    }

    ranked
}

/// Persisting orchestration around [`rank_candidates`].
#[derive(Clone)]
pub struct MatchingService {
    cfg: Arc<CoreConfig>,
}

impl MatchingService {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    /// Runs matching for one donor organ and persists the outcome.
    ///
    /// The top [`MAX_PERSISTED_MATCHES`] candidates are stored as potential matches; for the
    /// leading [`NOTIFIED_MATCHES`] every administrator receives a notification (`critical`
    /// priority for rank 1, `high` for the rest). Individual match or notification write
    /// failures are logged and skipped; the run itself keeps going.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::NotFound` if the donor organ does not exist. A run with zero
    /// compatible candidates is a success with an empty match list.
    pub fn match_donor(&self, donor_organ_id: &EntityId, actor: &str) -> TrackResult<MatchRunOutcome> {
        let donor_record = repositories::donors::get_donor_organ(&self.cfg, donor_organ_id)?;
        let donor = donor_record.data.clone();

        let candidates =
            repositories::patients::list_active_waitlist(&self.cfg, Some(donor.organ_type));
        let ranked = rank_candidates(&donor, &candidates, Utc::now());

        let mut persisted = Vec::new();
        for candidate in ranked.iter().take(MAX_PERSISTED_MATCHES) {
            let organ_match = OrganMatch {
                donor_organ_id: donor_record.id,
                patient_id: candidate.patient_id,
                compatibility_score: candidate.compatibility_score,
                blood_type_compatible: true,
                hla_match_score: candidate.hla_match_score,
                size_compatible: candidate.size_compatible,
                status: MatchStatus::Potential,
                priority_rank: candidate.priority_rank,
            };
            match repositories::matches::create_match(&self.cfg, organ_match) {
                Ok(record) => persisted.push(record),
                Err(e) => {
                    tracing::warn!(
                        "failed to persist match for patient {}: {}",
                        candidate.patient_id,
                        e
                    );
                }
            }
        }

        let admins = repositories::users::list_admins(&self.cfg);
        for candidate in ranked.iter().take(NOTIFIED_MATCHES) {
            let priority_level = if candidate.priority_rank == 1 {
                PriorityLevel::Critical
            } else {
                PriorityLevel::High
            };
            for admin in &admins {
                let notification = Notification {
                    recipient: admin.data.email.to_string(),
                    title: format!("Potential {} match", donor.organ_type),
                    message: format!(
                        "Donor organ {} matches patient {} with compatibility {:.1} (rank {})",
                        donor.donor_identifier,
                        candidate.patient_id,
                        candidate.compatibility_score,
                        candidate.priority_rank
                    ),
                    kind: NotificationKind::DonorMatch,
                    priority_level,
                    read: false,
                    patient_id: Some(candidate.patient_id),
                };
                if let Err(e) =
                    repositories::notifications::create_notification(&self.cfg, notification)
                {
                    tracing::warn!("failed to notify {}: {}", admin.data.email, e);
                }
            }
        }

        let details = match ranked.first() {
            Some(best) => format!(
                "{} compatible candidates, top score {:.1}",
                ranked.len(),
                best.compatibility_score
            ),
            None => "no compatible candidates".to_string(),
        };
        repositories::audit::record_action(
            &self.cfg,
            AuditAction::DonorMatchingCompleted,
            "donor_organ",
            &donor_record.id.to_string(),
            details,
            actor,
        )?;

        Ok(MatchRunOutcome {
            donor: donor_record,
            total_compatible: ranked.len(),
            matches: persisted,
        })
    }
}
