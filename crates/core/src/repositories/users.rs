//! Staff accounts.

use crate::config::CoreConfig;
use crate::error::{TrackError, TrackResult};
use crate::model::{StaffRole, User};
use crate::repositories::shared::{self, Record};

pub const COLLECTION: &str = "users";

/// Registers a staff member. Emails are unique across the collection.
///
/// # Errors
///
/// Returns `TrackError::InvalidInput` if a user with the same email already exists.
pub fn create_user(cfg: &CoreConfig, user: User) -> TrackResult<Record<User>> {
    if find_by_email(cfg, user.email.as_str()).is_some() {
        return Err(TrackError::InvalidInput(format!(
            "a user with email {} already exists",
            user.email
        )));
    }
    shared::create_record(cfg, COLLECTION, user)
}

pub fn find_by_email(cfg: &CoreConfig, email: &str) -> Option<Record<User>> {
    shared::list_records(cfg, COLLECTION)
        .into_iter()
        .find(|record: &Record<User>| record.data.email.as_str() == email)
}

/// The notification pool for donor matching.
pub fn list_admins(cfg: &CoreConfig) -> Vec<Record<User>> {
    shared::list_records(cfg, COLLECTION)
        .into_iter()
        .filter(|record: &Record<User>| record.data.role == StaffRole::Admin)
        .collect()
}
