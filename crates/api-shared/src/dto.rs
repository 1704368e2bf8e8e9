//! Request and response bodies for the REST API.
//!
//! Conversions into domain types live next to the requests that carry them, so handlers
//! stay thin. Identifier fields travel as strings on the wire; parsing them is the
//! handler's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use transtrack_core::model::{
    BloodType, DonorOrgan, FunctionalStatus, MatchStatus, MedicalUrgency, Notification,
    NotificationKind, OrganMatch, OrganType, Patient, PriorityLevel, PriorityWeightsConfig,
    PrognosisRating, StaffRole, User, WaitlistStatus,
};
use transtrack_core::repositories::shared::Record;
use transtrack_core::scoring::{ScoreBreakdown, DEFAULT_WEIGHTS};
use transtrack_core::TrackResult;
use transtrack_types::NonEmptyText;
use utoipa::ToSchema;

/// Uniform error body returned by every failing route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

/// Response payload of the health check.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Intake payload for a new waitlist patient.
///
/// Only the record number, name and needed organ are required; clinical attributes can be
/// supplied later through an update.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreatePatientRequest {
    pub medical_record_number: String,
    pub full_name: String,
    pub organ_needed: OrganType,
    pub waitlist_status: Option<WaitlistStatus>,
    pub blood_type: Option<BloodType>,
    pub medical_urgency: Option<MedicalUrgency>,
    pub functional_status: Option<FunctionalStatus>,
    pub prognosis: Option<PrognosisRating>,
    pub meld_score: Option<f64>,
    pub las_score: Option<f64>,
    pub pra: Option<f64>,
    pub cpra: Option<f64>,
    pub weight_kg: Option<f64>,
    pub hla_typing: Option<String>,
    pub date_added_to_waitlist: Option<DateTime<Utc>>,
    pub last_evaluation_date: Option<DateTime<Utc>>,
    pub comorbidity_score: Option<f64>,
    pub previous_transplants: Option<u32>,
    pub compliance_score: Option<f64>,
}

impl CreatePatientRequest {
    /// Converts the intake payload into a domain patient with no score assigned yet.
    ///
    /// # Errors
    ///
    /// Returns an error if `medical_record_number` or `full_name` is blank.
    pub fn into_patient(self) -> TrackResult<Patient> {
        Ok(Patient {
            medical_record_number: NonEmptyText::new(self.medical_record_number)?,
            full_name: NonEmptyText::new(self.full_name)?,
            organ_needed: self.organ_needed,
            waitlist_status: self.waitlist_status.unwrap_or_default(),
            blood_type: self.blood_type,
            medical_urgency: self.medical_urgency,
            functional_status: self.functional_status,
            prognosis: self.prognosis,
            meld_score: self.meld_score,
            las_score: self.las_score,
            pra: self.pra,
            cpra: self.cpra,
            weight_kg: self.weight_kg,
            hla_typing: self.hla_typing,
            date_added_to_waitlist: self.date_added_to_waitlist,
            last_evaluation_date: self.last_evaluation_date,
            comorbidity_score: self.comorbidity_score,
            previous_transplants: self.previous_transplants,
            compliance_score: self.compliance_score,
            priority_score: None,
            priority_score_breakdown: None,
        })
    }
}

/// Partial update of a patient's clinical attributes.
///
/// The medical record number is fixed at intake and cannot be changed here.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdatePatientRequest {
    pub full_name: Option<String>,
    pub organ_needed: Option<OrganType>,
    pub waitlist_status: Option<WaitlistStatus>,
    pub blood_type: Option<BloodType>,
    pub medical_urgency: Option<MedicalUrgency>,
    pub functional_status: Option<FunctionalStatus>,
    pub prognosis: Option<PrognosisRating>,
    pub meld_score: Option<f64>,
    pub las_score: Option<f64>,
    pub pra: Option<f64>,
    pub cpra: Option<f64>,
    pub weight_kg: Option<f64>,
    pub hla_typing: Option<String>,
    pub date_added_to_waitlist: Option<DateTime<Utc>>,
    pub last_evaluation_date: Option<DateTime<Utc>>,
    pub comorbidity_score: Option<f64>,
    pub previous_transplants: Option<u32>,
    pub compliance_score: Option<f64>,
}

impl UpdatePatientRequest {
    /// Applies every provided field onto `patient`, leaving absent fields untouched.
    ///
    /// A field cannot be cleared through this request; sending `null` is the same as
    /// omitting it.
    ///
    /// # Errors
    ///
    /// Returns an error if `full_name` is provided but blank.
    pub fn apply_to(self, patient: &mut Patient) -> TrackResult<()> {
        if let Some(full_name) = self.full_name {
            patient.full_name = NonEmptyText::new(full_name)?;
        }
        if let Some(organ) = self.organ_needed {
            patient.organ_needed = organ;
        }
        if let Some(status) = self.waitlist_status {
            patient.waitlist_status = status;
        }
        if let Some(blood_type) = self.blood_type {
            patient.blood_type = Some(blood_type);
        }
        if let Some(urgency) = self.medical_urgency {
            patient.medical_urgency = Some(urgency);
        }
        if let Some(functional) = self.functional_status {
            patient.functional_status = Some(functional);
        }
        if let Some(prognosis) = self.prognosis {
            patient.prognosis = Some(prognosis);
        }
        if let Some(meld) = self.meld_score {
            patient.meld_score = Some(meld);
        }
        if let Some(las) = self.las_score {
            patient.las_score = Some(las);
        }
        if let Some(pra) = self.pra {
            patient.pra = Some(pra);
        }
        if let Some(cpra) = self.cpra {
            patient.cpra = Some(cpra);
        }
        if let Some(weight) = self.weight_kg {
            patient.weight_kg = Some(weight);
        }
        if let Some(hla) = self.hla_typing {
            patient.hla_typing = Some(hla);
        }
        if let Some(added) = self.date_added_to_waitlist {
            patient.date_added_to_waitlist = Some(added);
        }
        if let Some(evaluated) = self.last_evaluation_date {
            patient.last_evaluation_date = Some(evaluated);
        }
        if let Some(comorbidity) = self.comorbidity_score {
            patient.comorbidity_score = Some(comorbidity);
        }
        if let Some(transplants) = self.previous_transplants {
            patient.previous_transplants = Some(transplants);
        }
        if let Some(compliance) = self.compliance_score {
            patient.compliance_score = Some(compliance);
        }
        Ok(())
    }
}

/// Full view of a stored patient.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientResponse {
    pub id: String,
    pub medical_record_number: String,
    pub full_name: String,
    pub organ_needed: OrganType,
    pub waitlist_status: WaitlistStatus,
    pub blood_type: Option<BloodType>,
    pub medical_urgency: Option<MedicalUrgency>,
    pub functional_status: Option<FunctionalStatus>,
    pub prognosis: Option<PrognosisRating>,
    pub meld_score: Option<f64>,
    pub las_score: Option<f64>,
    pub pra: Option<f64>,
    pub cpra: Option<f64>,
    pub weight_kg: Option<f64>,
    pub hla_typing: Option<String>,
    pub date_added_to_waitlist: Option<DateTime<Utc>>,
    pub last_evaluation_date: Option<DateTime<Utc>>,
    pub comorbidity_score: Option<f64>,
    pub previous_transplants: Option<u32>,
    pub compliance_score: Option<f64>,
    pub priority_score: Option<f64>,
    pub priority_score_breakdown: Option<ScoreBreakdown>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Record<Patient>> for PatientResponse {
    fn from(record: Record<Patient>) -> Self {
        let Record {
            id,
            created_at,
            updated_at,
            data,
        } = record;
        Self {
            id: id.to_string(),
            medical_record_number: data.medical_record_number.into_inner(),
            full_name: data.full_name.into_inner(),
            organ_needed: data.organ_needed,
            waitlist_status: data.waitlist_status,
            blood_type: data.blood_type,
            medical_urgency: data.medical_urgency,
            functional_status: data.functional_status,
            prognosis: data.prognosis,
            meld_score: data.meld_score,
            las_score: data.las_score,
            pra: data.pra,
            cpra: data.cpra,
            weight_kg: data.weight_kg,
            hla_typing: data.hla_typing,
            date_added_to_waitlist: data.date_added_to_waitlist,
            last_evaluation_date: data.last_evaluation_date,
            comorbidity_score: data.comorbidity_score,
            previous_transplants: data.previous_transplants,
            compliance_score: data.compliance_score,
            priority_score: data.priority_score,
            priority_score_breakdown: data.priority_score_breakdown,
            created_at,
            updated_at,
        }
    }
}

/// Compact list view of a patient.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PatientSummary {
    pub id: String,
    pub medical_record_number: String,
    pub full_name: String,
    pub organ_needed: OrganType,
    pub waitlist_status: WaitlistStatus,
    pub medical_urgency: Option<MedicalUrgency>,
    pub blood_type: Option<BloodType>,
    pub priority_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl From<Record<Patient>> for PatientSummary {
    fn from(record: Record<Patient>) -> Self {
        Self {
            id: record.id.to_string(),
            medical_record_number: record.data.medical_record_number.into_inner(),
            full_name: record.data.full_name.into_inner(),
            organ_needed: record.data.organ_needed,
            waitlist_status: record.data.waitlist_status,
            medical_urgency: record.data.medical_urgency,
            blood_type: record.data.blood_type,
            priority_score: record.data.priority_score,
            created_at: record.created_at,
        }
    }
}

/// Payload of `POST /functions/calculate-priority`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CalculatePriorityRequest {
    pub patient_id: String,
}

/// Result of a scoring run, including the per-factor breakdown.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CalculatePriorityResponse {
    pub success: bool,
    pub patient_id: String,
    pub priority_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Result of a legacy scoring run. The legacy formula produces no breakdown.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecalculatePriorityResponse {
    pub success: bool,
    pub patient_id: String,
    pub priority_score: f64,
}

/// Payload of `POST /functions/donor-matching`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct DonorMatchingRequest {
    pub donor_organ_id: String,
}

/// Result of a matching run.
///
/// `total_matches` counts every blood-compatible candidate; `matches_created` counts the
/// persisted subset.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DonorMatchingResponse {
    pub success: bool,
    pub donor: DonorResponse,
    pub matches: Vec<MatchResponse>,
    pub total_matches: usize,
    pub matches_created: usize,
}

/// Registration payload for a donor organ.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDonorRequest {
    pub donor_identifier: String,
    pub organ_type: OrganType,
    pub blood_type: BloodType,
    pub weight_kg: Option<f64>,
    pub hla_typing: Option<String>,
}

impl CreateDonorRequest {
    /// # Errors
    ///
    /// Returns an error if `donor_identifier` is blank.
    pub fn into_donor(self) -> TrackResult<DonorOrgan> {
        Ok(DonorOrgan {
            donor_identifier: NonEmptyText::new(self.donor_identifier)?,
            organ_type: self.organ_type,
            blood_type: self.blood_type,
            weight_kg: self.weight_kg,
            hla_typing: self.hla_typing,
        })
    }
}

/// View of a stored donor organ.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DonorResponse {
    pub id: String,
    pub donor_identifier: String,
    pub organ_type: OrganType,
    pub blood_type: BloodType,
    pub weight_kg: Option<f64>,
    pub hla_typing: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Record<DonorOrgan>> for DonorResponse {
    fn from(record: Record<DonorOrgan>) -> Self {
        Self {
            id: record.id.to_string(),
            donor_identifier: record.data.donor_identifier.into_inner(),
            organ_type: record.data.organ_type,
            blood_type: record.data.blood_type,
            weight_kg: record.data.weight_kg,
            hla_typing: record.data.hla_typing,
            created_at: record.created_at,
        }
    }
}

/// View of a stored donor/patient match.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MatchResponse {
    pub id: String,
    pub donor_organ_id: String,
    pub patient_id: String,
    pub compatibility_score: f64,
    pub blood_type_compatible: bool,
    pub hla_match_score: f64,
    pub size_compatible: bool,
    pub status: MatchStatus,
    pub priority_rank: u32,
    pub created_at: DateTime<Utc>,
}

impl From<Record<OrganMatch>> for MatchResponse {
    fn from(record: Record<OrganMatch>) -> Self {
        Self {
            id: record.id.to_string(),
            donor_organ_id: record.data.donor_organ_id.to_string(),
            patient_id: record.data.patient_id.to_string(),
            compatibility_score: record.data.compatibility_score,
            blood_type_compatible: record.data.blood_type_compatible,
            hla_match_score: record.data.hla_match_score,
            size_compatible: record.data.size_compatible,
            status: record.data.status,
            priority_rank: record.data.priority_rank,
            created_at: record.created_at,
        }
    }
}

/// Payload for creating and activating a weights configuration.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateWeightsRequest {
    pub name: String,
    pub medical_urgency_weight: f64,
    pub time_on_waitlist_weight: f64,
    pub organ_specific_weight: f64,
    pub evaluation_recency_weight: f64,
    pub blood_type_rarity_weight: f64,
    pub evaluation_decay_rate: f64,
}

impl CreateWeightsRequest {
    /// Converts the payload into a domain configuration. Range checks happen on
    /// activation, not here.
    ///
    /// # Errors
    ///
    /// Returns an error if `name` is blank.
    pub fn into_config(self) -> TrackResult<PriorityWeightsConfig> {
        Ok(PriorityWeightsConfig {
            name: NonEmptyText::new(self.name)?,
            medical_urgency_weight: self.medical_urgency_weight,
            time_on_waitlist_weight: self.time_on_waitlist_weight,
            organ_specific_weight: self.organ_specific_weight,
            evaluation_recency_weight: self.evaluation_recency_weight,
            blood_type_rarity_weight: self.blood_type_rarity_weight,
            evaluation_decay_rate: self.evaluation_decay_rate,
            is_active: false,
        })
    }
}

/// The weights currently in effect.
///
/// `is_active: false` together with the name `default` means no stored configuration is
/// active and the built-in defaults apply.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WeightsResponse {
    pub name: String,
    pub medical_urgency_weight: f64,
    pub time_on_waitlist_weight: f64,
    pub organ_specific_weight: f64,
    pub evaluation_recency_weight: f64,
    pub blood_type_rarity_weight: f64,
    pub evaluation_decay_rate: f64,
    pub is_active: bool,
}

impl WeightsResponse {
    pub fn built_in_defaults() -> Self {
        Self {
            name: "default".to_owned(),
            medical_urgency_weight: DEFAULT_WEIGHTS.medical_urgency,
            time_on_waitlist_weight: DEFAULT_WEIGHTS.time_on_waitlist,
            organ_specific_weight: DEFAULT_WEIGHTS.organ_specific,
            evaluation_recency_weight: DEFAULT_WEIGHTS.evaluation_recency,
            blood_type_rarity_weight: DEFAULT_WEIGHTS.blood_type_rarity,
            evaluation_decay_rate: DEFAULT_WEIGHTS.evaluation_decay_rate,
            is_active: false,
        }
    }
}

impl From<Record<PriorityWeightsConfig>> for WeightsResponse {
    fn from(record: Record<PriorityWeightsConfig>) -> Self {
        let config = record.data;
        Self {
            name: config.name.into_inner(),
            medical_urgency_weight: config.medical_urgency_weight,
            time_on_waitlist_weight: config.time_on_waitlist_weight,
            organ_specific_weight: config.organ_specific_weight,
            evaluation_recency_weight: config.evaluation_recency_weight,
            blood_type_rarity_weight: config.blood_type_rarity_weight,
            evaluation_decay_rate: config.evaluation_decay_rate,
            is_active: config.is_active,
        }
    }
}

/// View of a stored notification.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: String,
    pub recipient: String,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub priority_level: PriorityLevel,
    pub read: bool,
    pub patient_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Record<Notification>> for NotificationResponse {
    fn from(record: Record<Notification>) -> Self {
        Self {
            id: record.id.to_string(),
            recipient: record.data.recipient,
            title: record.data.title,
            message: record.data.message,
            kind: record.data.kind,
            priority_level: record.data.priority_level,
            read: record.data.read,
            patient_id: record.data.patient_id.map(|id| id.to_string()),
            created_at: record.created_at,
        }
    }
}

/// Registration payload for a staff member.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
    pub role: StaffRole,
}

impl CreateUserRequest {
    /// # Errors
    ///
    /// Returns an error if `email` or `full_name` is blank.
    pub fn into_user(self) -> TrackResult<User> {
        Ok(User {
            email: NonEmptyText::new(self.email)?,
            full_name: NonEmptyText::new(self.full_name)?,
            role: self.role,
        })
    }
}

/// View of a stored staff member.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: StaffRole,
    pub created_at: DateTime<Utc>,
}

impl From<Record<User>> for UserResponse {
    fn from(record: Record<User>) -> Self {
        Self {
            id: record.id.to_string(),
            email: record.data.email.into_inner(),
            full_name: record.data.full_name.into_inner(),
            role: record.data.role,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use transtrack_core::TrackError;

    fn sample_patient() -> Patient {
        serde_json::from_str(
            r#"{
                "medical_record_number": "MRN-1",
                "full_name": "Alex Doe",
                "organ_needed": "kidney",
                "blood_type": "O+"
            }"#,
        )
        .expect("patient json")
    }

    #[test]
    fn intake_rejects_blank_name() {
        let request = CreatePatientRequest {
            medical_record_number: "MRN-2".to_owned(),
            full_name: "   ".to_owned(),
            organ_needed: OrganType::Kidney,
            waitlist_status: None,
            blood_type: None,
            medical_urgency: None,
            functional_status: None,
            prognosis: None,
            meld_score: None,
            las_score: None,
            pra: None,
            cpra: None,
            weight_kg: None,
            hla_typing: None,
            date_added_to_waitlist: None,
            last_evaluation_date: None,
            comorbidity_score: None,
            previous_transplants: None,
            compliance_score: None,
        };
        let err = request.into_patient().expect_err("blank name");
        assert!(matches!(err, TrackError::Text(_)));
    }

    #[test]
    fn update_applies_only_provided_fields() {
        let mut patient = sample_patient();
        let request = UpdatePatientRequest {
            medical_urgency: Some(MedicalUrgency::Critical),
            pra: Some(45.0),
            ..Default::default()
        };
        request.apply_to(&mut patient).expect("apply");
        assert_eq!(patient.medical_urgency, Some(MedicalUrgency::Critical));
        assert_eq!(patient.pra, Some(45.0));
        assert_eq!(patient.blood_type, Some(BloodType::OPositive));
        assert_eq!(patient.full_name.as_str(), "Alex Doe");
    }

    #[test]
    fn built_in_defaults_report_inactive() {
        let weights = WeightsResponse::built_in_defaults();
        assert_eq!(weights.name, "default");
        assert!(!weights.is_active);
        let total = weights.medical_urgency_weight
            + weights.time_on_waitlist_weight
            + weights.organ_specific_weight
            + weights.evaluation_recency_weight
            + weights.blood_type_rarity_weight;
        assert_eq!(total, 100.0);
    }
}
