//! In-app notification feed. Newest first, never expires.

use crate::db::{LocalStore, StorageError};
use crate::models::{NewNotification, Notification, NotificationKind, NotificationPatch};

/// Push a new unread notification to the head of the feed.
pub fn push_notification(
    store: &LocalStore,
    kind: NotificationKind,
    title: &str,
    message: &str,
) -> Result<Notification, StorageError> {
    store.create(NewNotification {
        kind,
        title: title.to_string(),
        message: message.to_string(),
    })
}

pub fn list_notifications(store: &LocalStore) -> Result<Vec<Notification>, StorageError> {
    store.get_all()
}

/// Mark one notification read. `false` when the id is unknown.
pub fn mark_read(store: &LocalStore, id: &str) -> Result<bool, StorageError> {
    let updated = store.update::<Notification>(
        id,
        NotificationPatch {
            read: Some(true),
            ..Default::default()
        },
    )?;
    Ok(updated.is_some())
}

/// Mark every unread notification read. Returns how many changed.
pub fn mark_all_read(store: &LocalStore) -> Result<usize, StorageError> {
    store.update_where::<Notification>(|n| !n.read, |n| n.read = true)
}

pub fn unread_count(store: &LocalStore) -> Result<usize, StorageError> {
    Ok(list_notifications(store)?.iter().filter(|n| !n.read).count())
}

pub fn remove_notification(store: &LocalStore, id: &str) -> Result<bool, StorageError> {
    store.remove::<Notification>(id)
}

pub fn clear_notifications(store: &LocalStore) -> Result<(), StorageError> {
    store.clear::<Notification>()
}
