//! Append-only audit trail.

use crate::config::CoreConfig;
use crate::error::TrackResult;
use crate::model::{AuditAction, AuditEntry};
use crate::repositories::shared::{self, Record};

pub const COLLECTION: &str = "audit_log";

/// Appends one entry to the audit log.
pub fn record_action(
    cfg: &CoreConfig,
    action: AuditAction,
    entity_type: &str,
    entity_id: &str,
    details: String,
    user_email: &str,
) -> TrackResult<Record<AuditEntry>> {
    let entry = AuditEntry {
        action,
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        details,
        user_email: user_email.to_string(),
    };
    shared::create_record(cfg, COLLECTION, entry)
}

/// The most recent `limit` entries, newest first.
pub fn list_recent(cfg: &CoreConfig, limit: usize) -> Vec<Record<AuditEntry>> {
    let mut entries = shared::list_records(cfg, COLLECTION);
    entries.sort_by_key(|record: &Record<AuditEntry>| std::cmp::Reverse(record.created_at));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_cfg(dir: &TempDir) -> CoreConfig {
        CoreConfig::new(dir.path().to_path_buf())
    }

    #[test]
    fn recent_entries_come_newest_first_and_truncated() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        for n in 0..3 {
            record_action(
                &cfg,
                AuditAction::PatientCreated,
                "patient",
                &format!("id-{n}"),
                format!("created patient {n}"),
                "system",
            )
            .expect("record");
        }

        let recent = list_recent(&cfg, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].data.entity_id, "id-2");
        assert_eq!(recent[1].data.entity_id, "id-1");
    }
}
