//! Persisted donor/patient matches.

use crate::config::CoreConfig;
use crate::error::TrackResult;
use crate::model::OrganMatch;
use crate::repositories::shared::{self, Record};
use transtrack_types::EntityId;

pub const COLLECTION: &str = "matches";

pub fn create_match(cfg: &CoreConfig, organ_match: OrganMatch) -> TrackResult<Record<OrganMatch>> {
    shared::create_record(cfg, COLLECTION, organ_match)
}

/// Matches produced for one donor organ, best rank first.
pub fn list_matches_for_donor(cfg: &CoreConfig, donor_organ_id: &EntityId) -> Vec<Record<OrganMatch>> {
    let mut matches: Vec<Record<OrganMatch>> = shared::list_records(cfg, COLLECTION)
        .into_iter()
        .filter(|record: &Record<OrganMatch>| record.data.donor_organ_id == *donor_organ_id)
        .collect();
    matches.sort_by_key(|record| record.data.priority_rank);
    matches
}
