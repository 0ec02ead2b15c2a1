use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Collection, Record};

/// One line of a prescription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub patient_id: String,
    pub patient_name: String,
    #[serde(default)]
    pub appointment_id: Option<String>,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(deserialize_with = "super::lenient::date")]
    pub issued_on: NaiveDate,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPrescription {
    pub doctor_id: String,
    pub doctor_name: String,
    pub patient_id: String,
    pub patient_name: String,
    pub appointment_id: Option<String>,
    pub diagnosis: String,
    pub medicines: Vec<Medicine>,
    pub notes: Option<String>,
    pub issued_on: NaiveDate,
}

record_patch!(PrescriptionPatch for Prescription {
    diagnosis: String,
    medicines: Vec<Medicine>,
    notes: Option<String>,
});

impl Record for Prescription {
    const COLLECTION: Collection = Collection::Prescriptions;
    const ID_PREFIX: &'static str = "rx";

    type Draft = NewPrescription;
    type Update = PrescriptionPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(draft: NewPrescription, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            doctor_id: draft.doctor_id,
            doctor_name: draft.doctor_name,
            patient_id: draft.patient_id,
            patient_name: draft.patient_name,
            appointment_id: draft.appointment_id,
            diagnosis: draft.diagnosis,
            medicines: draft.medicines,
            notes: draft.notes,
            issued_on: draft.issued_on,
            created_at,
        }
    }
}
