use crate::db::StorageError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// The string form is also the serialized form.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = StorageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(StorageError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(AppointmentStatus {
    Upcoming => "upcoming",
    Completed => "completed",
    Cancelled => "cancelled",
});

str_enum!(FollowUpStatus {
    Scheduled => "scheduled",
    Completed => "completed",
    Missed => "missed",
    Rescheduled => "rescheduled",
});

str_enum!(
    /// Derived from the scheduled time on every read, never stored.
    FollowUpUrgency {
        Normal => "normal",
        DueSoon => "due-soon",
        Overdue => "overdue",
    }
);

str_enum!(NotificationKind {
    Appointment => "appointment",
    Reminder => "reminder",
    Prescription => "prescription",
    Message => "message",
    Payment => "payment",
    System => "system",
});

str_enum!(NotificationIcon {
    Calendar => "calendar",
    Clock => "clock",
    Pill => "pill",
    MessageCircle => "message-circle",
    CreditCard => "credit-card",
    Bell => "bell",
});

str_enum!(ChatSender {
    Patient => "patient",
    Doctor => "doctor",
});

impl FollowUpStatus {
    /// Scheduled or rescheduled follow-ups still have a visit ahead.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Rescheduled)
    }
}

impl ChatSender {
    pub fn other(&self) -> Self {
        match self {
            Self::Patient => Self::Doctor,
            Self::Doctor => Self::Patient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn appointment_status_strings() {
        for (variant, s) in [
            (AppointmentStatus::Upcoming, "upcoming"),
            (AppointmentStatus::Completed, "completed"),
            (AppointmentStatus::Cancelled, "cancelled"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(AppointmentStatus::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn urgency_serializes_kebab_case() {
        let json = serde_json::to_string(&FollowUpUrgency::DueSoon).unwrap();
        assert_eq!(json, "\"due-soon\"");
        let back: FollowUpUrgency = serde_json::from_str("\"overdue\"").unwrap();
        assert_eq!(back, FollowUpUrgency::Overdue);
    }

    #[test]
    fn invalid_value_rejected() {
        let err = FollowUpStatus::from_str("postponed").unwrap_err();
        assert!(matches!(err, StorageError::InvalidEnum { .. }));
        assert!(serde_json::from_str::<NotificationKind>("\"fax\"").is_err());
    }

    #[test]
    fn pending_follow_up_statuses() {
        assert!(FollowUpStatus::Scheduled.is_pending());
        assert!(FollowUpStatus::Rescheduled.is_pending());
        assert!(!FollowUpStatus::Completed.is_pending());
        assert!(!FollowUpStatus::Missed.is_pending());
    }

    #[test]
    fn chat_sender_other_side() {
        assert_eq!(ChatSender::Patient.other(), ChatSender::Doctor);
        assert_eq!(ChatSender::Doctor.other(), ChatSender::Patient);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(NotificationIcon::MessageCircle.to_string(), "message-circle");
    }
}
