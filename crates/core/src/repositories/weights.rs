//! Scoring weight configurations.
//!
//! At most one configuration is active at a time. Activating a new one deactivates the
//! previous holder; superseded configurations stay on disk for the audit trail.

use crate::config::CoreConfig;
use crate::error::TrackResult;
use crate::model::PriorityWeightsConfig;
use crate::repositories::shared::{self, Record};
use crate::scoring::{ScoringWeights, DEFAULT_WEIGHTS};

pub const COLLECTION: &str = "priority_weights";

/// The weights the scoring engine should use right now: the active configuration, or the
/// built-in defaults when none has been activated.
pub fn active_weights(cfg: &CoreConfig) -> ScoringWeights {
    active_config(cfg)
        .map(|record| record.data.to_weights())
        .unwrap_or(DEFAULT_WEIGHTS)
}

/// The currently active configuration record, if any.
pub fn active_config(cfg: &CoreConfig) -> Option<Record<PriorityWeightsConfig>> {
    shared::list_records(cfg, COLLECTION)
        .into_iter()
        .find(|record: &Record<PriorityWeightsConfig>| record.data.is_active)
}

/// Persists a configuration and makes it the active one.
///
/// # Errors
///
/// Returns `TrackError::InvalidInput` if the configuration violates the sum-100 or decay
/// invariants, or a storage error if a write fails.
pub fn activate_config(
    cfg: &CoreConfig,
    mut config: PriorityWeightsConfig,
) -> TrackResult<Record<PriorityWeightsConfig>> {
    config.validate()?;
    config.is_active = true;

    for existing in shared::list_records::<PriorityWeightsConfig>(cfg, COLLECTION) {
        if existing.data.is_active {
            let mut superseded = existing.data;
            superseded.is_active = false;
            shared::update_record(cfg, COLLECTION, &existing.id, superseded)?;
        }
    }

    shared::create_record(cfg, COLLECTION, config)
}

pub fn list_configs(cfg: &CoreConfig) -> Vec<Record<PriorityWeightsConfig>> {
    let mut configs = shared::list_records(cfg, COLLECTION);
    configs.sort_by_key(|record: &Record<PriorityWeightsConfig>| record.created_at);
    configs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use transtrack_types::NonEmptyText;

    fn test_cfg(dir: &TempDir) -> CoreConfig {
        CoreConfig::new(dir.path().to_path_buf())
    }

    fn named_config(name: &str, urgency_weight: f64) -> PriorityWeightsConfig {
        PriorityWeightsConfig {
            name: NonEmptyText::new(name).expect("name"),
            medical_urgency_weight: urgency_weight,
            time_on_waitlist_weight: 25.0,
            organ_specific_weight: 55.0 - urgency_weight,
            evaluation_recency_weight: 10.0,
            blood_type_rarity_weight: 10.0,
            evaluation_decay_rate: 0.5,
            is_active: false,
        }
    }

    #[test]
    fn defaults_apply_until_a_config_is_activated() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        assert!(active_config(&cfg).is_none());
        assert_eq!(active_weights(&cfg), DEFAULT_WEIGHTS);
    }

    #[test]
    fn activation_supersedes_the_previous_config() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        activate_config(&cfg, named_config("first", 30.0)).expect("activate first");
        activate_config(&cfg, named_config("second", 20.0)).expect("activate second");

        let active = active_config(&cfg).expect("one active config");
        assert_eq!(active.data.name.as_str(), "second");
        assert_eq!(active_weights(&cfg).medical_urgency, 20.0);

        let all = list_configs(&cfg);
        assert_eq!(all.len(), 2);
        assert_eq!(all.iter().filter(|r| r.data.is_active).count(), 1);
    }

    #[test]
    fn activation_rejects_invalid_weights() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let mut bad = named_config("bad", 30.0);
        bad.blood_type_rarity_weight = 40.0;
        assert!(activate_config(&cfg, bad).is_err());
        assert!(active_config(&cfg).is_none());
    }
}
