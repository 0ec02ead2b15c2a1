use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Collection, Record};

/// A relative whose appointments the account holder manages.
/// Not linked to any appointment record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyMember {
    pub id: String,
    pub name: String,
    pub relationship: String,
    #[serde(deserialize_with = "super::lenient::number")]
    pub age: u32,
    pub phone: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFamilyMember {
    pub name: String,
    pub relationship: String,
    pub age: u32,
    pub phone: String,
}

record_patch!(FamilyMemberPatch for FamilyMember {
    name: String,
    relationship: String,
    age: u32,
    phone: String,
});

impl Record for FamilyMember {
    const COLLECTION: Collection = Collection::FamilyMembers;
    const ID_PREFIX: &'static str = "fam";

    type Draft = NewFamilyMember;
    type Update = FamilyMemberPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(draft: NewFamilyMember, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            relationship: draft.relationship,
            age: draft.age,
            phone: draft.phone,
            created_at,
        }
    }
}
