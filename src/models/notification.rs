use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{NotificationIcon, NotificationKind};
use crate::db::{Collection, Insertion, Record};

/// Relative-time label given to a freshly pushed notification.
pub const JUST_NOW: &str = "Just now";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    /// Free-text display time ("Just now", "2 hours ago").
    pub time: String,
    pub read: bool,
    pub icon: NotificationIcon,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

record_patch!(NotificationPatch for Notification {
    title: String,
    message: String,
    time: String,
    read: bool,
});

impl NotificationKind {
    /// Icon shown next to a notification of this kind.
    pub fn icon(&self) -> NotificationIcon {
        match self {
            Self::Appointment => NotificationIcon::Calendar,
            Self::Reminder => NotificationIcon::Clock,
            Self::Prescription => NotificationIcon::Pill,
            Self::Message => NotificationIcon::MessageCircle,
            Self::Payment => NotificationIcon::CreditCard,
            Self::System => NotificationIcon::Bell,
        }
    }
}

impl Record for Notification {
    const COLLECTION: Collection = Collection::Notifications;
    const ID_PREFIX: &'static str = "notif";
    const INSERTION: Insertion = Insertion::Prepend;

    type Draft = NewNotification;
    type Update = NotificationPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(draft: NewNotification, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            icon: draft.kind.icon(),
            kind: draft.kind,
            title: draft.title,
            message: draft.message,
            time: JUST_NOW.to_string(),
            read: false,
            created_at,
        }
    }
}
