//! Staff notifications.

use crate::config::CoreConfig;
use crate::error::TrackResult;
use crate::model::Notification;
use crate::repositories::shared::{self, Record};
use transtrack_types::EntityId;

pub const COLLECTION: &str = "notifications";

pub fn create_notification(
    cfg: &CoreConfig,
    notification: Notification,
) -> TrackResult<Record<Notification>> {
    shared::create_record(cfg, COLLECTION, notification)
}

/// Notifications addressed to one recipient, newest first.
pub fn list_for_recipient(
    cfg: &CoreConfig,
    recipient: &str,
    unread_only: bool,
) -> Vec<Record<Notification>> {
    let mut notifications: Vec<Record<Notification>> = shared::list_records(cfg, COLLECTION)
        .into_iter()
        .filter(|record: &Record<Notification>| record.data.recipient == recipient)
        .filter(|record| !unread_only || !record.data.read)
        .collect();
    notifications.sort_by_key(|record| std::cmp::Reverse(record.created_at));
    notifications
}

/// Marks one notification as read.
///
/// # Errors
///
/// Returns `TrackError::NotFound` if no notification exists for `id`.
pub fn mark_read(cfg: &CoreConfig, id: &EntityId) -> TrackResult<Record<Notification>> {
    let record = shared::get_record::<Notification>(cfg, COLLECTION, id)?;
    let mut notification = record.data;
    notification.read = true;
    shared::update_record(cfg, COLLECTION, id, notification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NotificationKind, PriorityLevel};
    use tempfile::TempDir;

    fn test_cfg(dir: &TempDir) -> CoreConfig {
        CoreConfig::new(dir.path().to_path_buf())
    }

    fn test_notification(recipient: &str, read: bool) -> Notification {
        Notification {
            recipient: recipient.to_string(),
            title: "Potential kidney match".to_string(),
            message: "A donor organ matched one of your patients".to_string(),
            kind: NotificationKind::DonorMatch,
            priority_level: PriorityLevel::High,
            read,
            patient_id: None,
        }
    }

    #[test]
    fn listing_filters_by_recipient_and_read_state() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        create_notification(&cfg, test_notification("admin@example.org", false)).expect("create");
        create_notification(&cfg, test_notification("admin@example.org", true)).expect("create");
        create_notification(&cfg, test_notification("other@example.org", false)).expect("create");

        assert_eq!(list_for_recipient(&cfg, "admin@example.org", false).len(), 2);
        assert_eq!(list_for_recipient(&cfg, "admin@example.org", true).len(), 1);
        assert_eq!(list_for_recipient(&cfg, "nobody@example.org", false).len(), 0);
    }

    #[test]
    fn mark_read_flips_the_flag_once() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);

        let created =
            create_notification(&cfg, test_notification("admin@example.org", false)).expect("create");
        let marked = mark_read(&cfg, &created.id).expect("mark read");
        assert!(marked.data.read);

        assert!(list_for_recipient(&cfg, "admin@example.org", true).is_empty());
    }
}
