//! Patient records.

use crate::config::CoreConfig;
use crate::error::TrackResult;
use crate::model::{OrganType, Patient, WaitlistStatus};
use crate::repositories::shared::{self, Record};
use transtrack_types::EntityId;

pub const COLLECTION: &str = "patients";

/// Persists a new patient record.
pub fn create_patient(cfg: &CoreConfig, patient: Patient) -> TrackResult<Record<Patient>> {
    shared::create_record(cfg, COLLECTION, patient)
}

pub fn get_patient(cfg: &CoreConfig, id: &EntityId) -> TrackResult<Record<Patient>> {
    shared::get_record(cfg, COLLECTION, id)
}

pub fn update_patient(
    cfg: &CoreConfig,
    id: &EntityId,
    patient: Patient,
) -> TrackResult<Record<Patient>> {
    shared::update_record(cfg, COLLECTION, id, patient)
}

/// Lists every patient record, oldest first.
pub fn list_patients(cfg: &CoreConfig) -> Vec<Record<Patient>> {
    let mut patients = shared::list_records(cfg, COLLECTION);
    patients.sort_by_key(|record| record.created_at);
    patients
}

/// The matching engine's candidate pool: active-waitlist patients, optionally restricted to
/// one organ type.
pub fn list_active_waitlist(cfg: &CoreConfig, organ: Option<OrganType>) -> Vec<Record<Patient>> {
    list_patients(cfg)
        .into_iter()
        .filter(|record| record.data.waitlist_status == WaitlistStatus::Active)
        .filter(|record| organ.map_or(true, |wanted| record.data.organ_needed == wanted))
        .collect()
}
