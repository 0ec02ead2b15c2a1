use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::FollowUpStatus;
use crate::db::{Collection, Record};

/// A post-visit check scheduled by a doctor for a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub doctor_specialty: String,
    #[serde(deserialize_with = "super::lenient::date")]
    pub date: NaiveDate,
    pub time: String,
    #[serde(default)]
    pub notes: String,
    pub status: FollowUpStatus,
    #[serde(default)]
    pub is_reassigned: bool,
    /// Doctor who originally owned the follow-up, set on first reassignment.
    #[serde(default)]
    pub original_doctor_id: Option<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFollowUp {
    pub patient_id: String,
    pub patient_name: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub doctor_specialty: String,
    pub date: NaiveDate,
    pub time: String,
    pub notes: String,
}

record_patch!(FollowUpPatch for FollowUp {
    date: NaiveDate,
    time: String,
    notes: String,
    status: FollowUpStatus,
});

impl Record for FollowUp {
    const COLLECTION: Collection = Collection::FollowUps;
    const ID_PREFIX: &'static str = "fu";

    type Draft = NewFollowUp;
    type Update = FollowUpPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(draft: NewFollowUp, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            patient_id: draft.patient_id,
            patient_name: draft.patient_name,
            doctor_id: draft.doctor_id,
            doctor_name: draft.doctor_name,
            doctor_specialty: draft.doctor_specialty,
            date: draft.date,
            time: draft.time,
            notes: draft.notes,
            status: FollowUpStatus::Scheduled,
            is_reassigned: false,
            original_doctor_id: None,
            created_at,
        }
    }
}
