//! Donor organ records.

use crate::config::CoreConfig;
use crate::error::TrackResult;
use crate::model::DonorOrgan;
use crate::repositories::shared::{self, Record};
use transtrack_types::EntityId;

pub const COLLECTION: &str = "donor_organs";

pub fn create_donor_organ(cfg: &CoreConfig, donor: DonorOrgan) -> TrackResult<Record<DonorOrgan>> {
    shared::create_record(cfg, COLLECTION, donor)
}

pub fn get_donor_organ(cfg: &CoreConfig, id: &EntityId) -> TrackResult<Record<DonorOrgan>> {
    shared::get_record(cfg, COLLECTION, id)
}
