use serde::{Deserialize, Serialize};

use crate::db::{Collection, Singleton};

/// The account holder. One per store; a default is seeded on first read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub dob: String,
    pub blood_group: String,
    pub gender: String,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Guest Patient".into(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            dob: String::new(),
            blood_group: "Unknown".into(),
            gender: "Prefer not to say".into(),
        }
    }
}

record_patch!(ProfilePatch for UserProfile {
    name: String,
    email: String,
    phone: String,
    address: String,
    dob: String,
    blood_group: String,
    gender: String,
});

impl Singleton for UserProfile {
    const COLLECTION: Collection = Collection::UserProfile;
}
