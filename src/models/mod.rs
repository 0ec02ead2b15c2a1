//! Stored record types.
//!
//! Field names serialize in camelCase so records written by earlier
//! web-client builds read back unchanged after migration.

/// Generate an all-`Option` patch struct for a record plus its
/// `Patch` impl: every `Some` field overwrites, every `None` field is kept.
macro_rules! record_patch {
    ($(#[$meta:meta])* $patch:ident for $record:ty { $($field:ident : $ty:ty),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $patch {
            $(
                #[serde(default, skip_serializing_if = "Option::is_none")]
                pub $field: Option<$ty>,
            )+
        }

        impl crate::db::Patch<$record> for $patch {
            fn apply_to(self, target: &mut $record) {
                $(
                    if let Some(value) = self.$field {
                        target.$field = value;
                    }
                )+
            }

            fn is_empty(&self) -> bool {
                true $(&& self.$field.is_none())+
            }
        }
    };
}

pub mod appointment;
pub mod chat;
pub mod doctor;
pub mod enums;
pub mod family;
pub mod follow_up;
mod lenient;
pub mod notification;
pub mod prescription;
pub mod profile;

pub use appointment::*;
pub use chat::*;
pub use doctor::*;
pub use enums::*;
pub use family::*;
pub use follow_up::*;
pub use notification::*;
pub use prescription::*;
pub use profile::*;
