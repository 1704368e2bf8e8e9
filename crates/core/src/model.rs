//! Domain model for the transplant waitlist.
//!
//! Records arrive from clinical staff with very uneven completeness, so most clinical fields
//! are `Option`s and every consumer of this model (the scoring and matching engines) carries
//! an explicit fallback for an absent value rather than refusing to work. The two
//! engine-owned fields on [`Patient`] (`priority_score`, `priority_score_breakdown`) are only
//! ever written by the scoring engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use transtrack_types::{EntityId, NonEmptyText};
use utoipa::ToSchema;

use crate::error::{TrackError, TrackResult};
use crate::scoring::{ScoreBreakdown, ScoringWeights};

/// ABO/Rh blood group of a patient or a donor organ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BloodType {
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "AB+")]
    AbPositive,
}

impl BloodType {
    pub fn as_str(self) -> &'static str {
        match self {
            BloodType::ONegative => "O-",
            BloodType::OPositive => "O+",
            BloodType::ANegative => "A-",
            BloodType::APositive => "A+",
            BloodType::BNegative => "B-",
            BloodType::BPositive => "B+",
            BloodType::AbNegative => "AB-",
            BloodType::AbPositive => "AB+",
        }
    }

    /// Whether an organ of this blood group can be transplanted into `recipient`.
    ///
    /// Standard one-directional ABO/Rh compatibility: O− donates to everyone, AB+ receives
    /// from everyone, and Rh-negative groups donate to their Rh-positive counterparts but
    /// not the reverse.
    pub fn can_donate_to(self, recipient: BloodType) -> bool {
        use BloodType::*;
        match self {
            ONegative => true,
            OPositive => matches!(recipient, OPositive | APositive | BPositive | AbPositive),
            ANegative => matches!(recipient, ANegative | APositive | AbNegative | AbPositive),
            APositive => matches!(recipient, APositive | AbPositive),
            BNegative => matches!(recipient, BNegative | BPositive | AbNegative | AbPositive),
            BPositive => matches!(recipient, BPositive | AbPositive),
            AbNegative => matches!(recipient, AbNegative | AbPositive),
            AbPositive => matches!(recipient, AbPositive),
        }
    }

    /// Population-rarity value on a 0-100 scale, used by the scoring engine.
    ///
    /// Rarer groups wait longer for a compatible organ, so they score higher.
    pub fn rarity_score(self) -> f64 {
        match self {
            BloodType::AbNegative => 100.0,
            BloodType::BNegative => 85.0,
            BloodType::ANegative => 70.0,
            BloodType::ONegative => 60.0,
            BloodType::AbPositive => 50.0,
            BloodType::BPositive => 40.0,
            BloodType::APositive => 30.0,
            BloodType::OPositive => 20.0,
        }
    }
}

impl std::fmt::Display for BloodType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organ a patient is waiting for, or that a donor is offering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrganType {
    Kidney,
    Liver,
    Heart,
    Lung,
    Pancreas,
    KidneyPancreas,
    Intestine,
}

impl OrganType {
    pub fn as_str(self) -> &'static str {
        match self {
            OrganType::Kidney => "kidney",
            OrganType::Liver => "liver",
            OrganType::Heart => "heart",
            OrganType::Lung => "lung",
            OrganType::Pancreas => "pancreas",
            OrganType::KidneyPancreas => "kidney_pancreas",
            OrganType::Intestine => "intestine",
        }
    }
}

impl std::fmt::Display for OrganType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a patient currently stands on the waitlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WaitlistStatus {
    /// Eligible for offers; the only status the matching engine considers.
    #[default]
    Active,
    /// Temporarily unfit for transplant (infection, travel, ...), expected back.
    TemporarilyInactive,
    Transplanted,
    Removed,
    Deceased,
}

/// Clinician-assessed urgency of transplantation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MedicalUrgency {
    Critical,
    High,
    Medium,
    Low,
}

/// How dependent the patient is on care in daily life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FunctionalStatus {
    Independent,
    PartiallyDependent,
    FullyDependent,
    Critical,
}

/// Expected outcome without transplant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PrognosisRating {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

/// Review state of a persisted donor/patient match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Written by the matching engine; awaiting coordinator review.
    Potential,
    UnderReview,
    Accepted,
    Declined,
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DonorMatch,
    System,
}

/// Display priority of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PriorityLevel {
    Critical,
    High,
    Medium,
    Low,
}

/// Staff role; administrators receive donor-match notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Admin,
    Coordinator,
    Clinician,
}

impl StaffRole {
    pub fn as_str(self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Coordinator => "coordinator",
            StaffRole::Clinician => "clinician",
        }
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StaffRole {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(StaffRole::Admin),
            "coordinator" => Ok(StaffRole::Coordinator),
            "clinician" => Ok(StaffRole::Clinician),
            other => Err(TrackError::InvalidInput(format!(
                "unknown staff role '{other}', expected admin, coordinator or clinician"
            ))),
        }
    }
}

/// Actions recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    PatientCreated,
    PatientUpdated,
    DonorRegistered,
    UserRegistered,
    PriorityScoreCalculated,
    PriorityScoreRecalculated,
    DonorMatchingCompleted,
    WeightsActivated,
}

/// A patient on the transplant waitlist.
///
/// `organ_needed` is the only required clinical attribute; everything else may be absent and
/// is defaulted inside the engines. See the scoring module for the exact fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    #[schema(value_type = String)]
    pub medical_record_number: NonEmptyText,
    #[schema(value_type = String)]
    pub full_name: NonEmptyText,
    pub organ_needed: OrganType,
    #[serde(default)]
    pub waitlist_status: WaitlistStatus,
    pub blood_type: Option<BloodType>,
    pub medical_urgency: Option<MedicalUrgency>,
    pub functional_status: Option<FunctionalStatus>,
    pub prognosis: Option<PrognosisRating>,
    /// MELD score, 6-40; liver candidates.
    pub meld_score: Option<f64>,
    /// Lung Allocation Score, 0-100.
    pub las_score: Option<f64>,
    /// Panel-reactive antibody percentage, 0-100; kidney candidates.
    pub pra: Option<f64>,
    /// Calculated panel-reactive antibody percentage, 0-100.
    pub cpra: Option<f64>,
    pub weight_kg: Option<f64>,
    /// Free-text antigen list, e.g. `"A1 A2 B8 B44 DR4 DR7"`.
    pub hla_typing: Option<String>,
    pub date_added_to_waitlist: Option<DateTime<Utc>>,
    pub last_evaluation_date: Option<DateTime<Utc>>,
    /// 0-10; higher means more comorbid.
    pub comorbidity_score: Option<f64>,
    pub previous_transplants: Option<u32>,
    /// 0-10; higher means better adherence to treatment.
    pub compliance_score: Option<f64>,
    pub priority_score: Option<f64>,
    pub priority_score_breakdown: Option<ScoreBreakdown>,
}

/// An organ offered by a donor. Read-only input to the matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DonorOrgan {
    #[schema(value_type = String)]
    pub donor_identifier: NonEmptyText,
    pub organ_type: OrganType,
    pub blood_type: BloodType,
    pub weight_kg: Option<f64>,
    pub hla_typing: Option<String>,
}

/// One scored donor/patient pairing, persisted by the matching engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrganMatch {
    #[schema(value_type = String)]
    pub donor_organ_id: EntityId,
    #[schema(value_type = String)]
    pub patient_id: EntityId,
    pub compatibility_score: f64,
    pub blood_type_compatible: bool,
    pub hla_match_score: f64,
    pub size_compatible: bool,
    pub status: MatchStatus,
    /// 1-based position within the matching run that produced this record;
    /// tied scores take consecutive ranks, so rank 1 is unique per run.
    pub priority_rank: u32,
}

/// A message for one staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Email address of the recipient.
    pub recipient: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority_level: PriorityLevel,
    pub read: bool,
    #[schema(value_type = Option<String>)]
    pub patient_id: Option<EntityId>,
}

/// Append-only record of a state-changing action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub details: String,
    pub user_email: String,
}

/// A named set of scoring-factor weights.
///
/// At most one configuration is active at a time; superseded configurations are deactivated,
/// never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PriorityWeightsConfig {
    #[schema(value_type = String)]
    pub name: NonEmptyText,
    pub medical_urgency_weight: f64,
    pub time_on_waitlist_weight: f64,
    pub organ_specific_weight: f64,
    pub evaluation_recency_weight: f64,
    pub blood_type_rarity_weight: f64,
    pub evaluation_decay_rate: f64,
    #[serde(default)]
    pub is_active: bool,
}

impl PriorityWeightsConfig {
    /// Checks the invariants the scoring engine assumes but does not enforce itself.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::InvalidInput` if the five factor weights do not sum to 100 or
    /// the decay rate is outside `[0, 1]`.
    pub fn validate(&self) -> TrackResult<()> {
        let total = self.medical_urgency_weight
            + self.time_on_waitlist_weight
            + self.organ_specific_weight
            + self.evaluation_recency_weight
            + self.blood_type_rarity_weight;
        if (total - 100.0).abs() > 1e-6 {
            return Err(TrackError::InvalidInput(format!(
                "factor weights must sum to 100, got {total}"
            )));
        }
        if !(0.0..=1.0).contains(&self.evaluation_decay_rate) {
            return Err(TrackError::InvalidInput(format!(
                "evaluation_decay_rate must be within [0, 1], got {}",
                self.evaluation_decay_rate
            )));
        }
        Ok(())
    }

    pub fn to_weights(&self) -> ScoringWeights {
        ScoringWeights {
            medical_urgency: self.medical_urgency_weight,
            time_on_waitlist: self.time_on_waitlist_weight,
            organ_specific: self.organ_specific_weight,
            evaluation_recency: self.evaluation_recency_weight,
            blood_type_rarity: self.blood_type_rarity_weight,
            evaluation_decay_rate: self.evaluation_decay_rate,
        }
    }
}

/// A staff member. Administrators form the notification pool for donor matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct User {
    #[schema(value_type = String)]
    pub email: NonEmptyText,
    #[schema(value_type = String)]
    pub full_name: NonEmptyText,
    pub role: StaffRole,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blood_types_use_clinical_notation_on_the_wire() {
        let json = serde_json::to_string(&BloodType::AbNegative).expect("serialize");
        assert_eq!(json, "\"AB-\"");
        let parsed: BloodType = serde_json::from_str("\"O+\"").expect("deserialize");
        assert_eq!(parsed, BloodType::OPositive);
    }

    #[test]
    fn o_negative_donates_to_every_group() {
        let all = [
            BloodType::ONegative,
            BloodType::OPositive,
            BloodType::ANegative,
            BloodType::APositive,
            BloodType::BNegative,
            BloodType::BPositive,
            BloodType::AbNegative,
            BloodType::AbPositive,
        ];
        for recipient in all {
            assert!(BloodType::ONegative.can_donate_to(recipient));
        }
    }

    #[test]
    fn ab_positive_donates_only_to_ab_positive() {
        assert!(BloodType::AbPositive.can_donate_to(BloodType::AbPositive));
        assert!(!BloodType::AbPositive.can_donate_to(BloodType::AbNegative));
        assert!(!BloodType::AbPositive.can_donate_to(BloodType::OPositive));
        assert!(!BloodType::AbPositive.can_donate_to(BloodType::APositive));
    }

    #[test]
    fn rh_negative_donates_to_its_positive_counterpart_but_not_back() {
        assert!(BloodType::ANegative.can_donate_to(BloodType::APositive));
        assert!(!BloodType::APositive.can_donate_to(BloodType::ANegative));
        assert!(BloodType::BNegative.can_donate_to(BloodType::BPositive));
        assert!(!BloodType::BPositive.can_donate_to(BloodType::BNegative));
    }

    #[test]
    fn patient_deserialises_from_minimal_intake_document() {
        let json = r#"{
            "medical_record_number": "MRN-100",
            "full_name": "Alex Doe",
            "organ_needed": "kidney"
        }"#;
        let patient: Patient = serde_json::from_str(json).expect("deserialize");
        assert_eq!(patient.waitlist_status, WaitlistStatus::Active);
        assert!(patient.blood_type.is_none());
        assert!(patient.priority_score.is_none());
        assert!(patient.priority_score_breakdown.is_none());
    }

    #[test]
    fn weights_config_rejects_bad_totals_and_decay() {
        let mut config = PriorityWeightsConfig {
            name: NonEmptyText::new("standard").expect("name"),
            medical_urgency_weight: 30.0,
            time_on_waitlist_weight: 25.0,
            organ_specific_weight: 25.0,
            evaluation_recency_weight: 10.0,
            blood_type_rarity_weight: 10.0,
            evaluation_decay_rate: 0.5,
            is_active: true,
        };
        assert!(config.validate().is_ok());

        config.medical_urgency_weight = 50.0;
        let err = config.validate().expect_err("sum is 120");
        assert!(matches!(err, TrackError::InvalidInput(_)));

        config.medical_urgency_weight = 30.0;
        config.evaluation_decay_rate = 1.5;
        let err = config.validate().expect_err("decay out of range");
        assert!(matches!(err, TrackError::InvalidInput(_)));
    }
}
