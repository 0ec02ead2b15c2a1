use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;
use crate::db::{Collection, Record};

/// Token numbers are drawn from `1..=MAX_TOKEN_NUMBER`.
pub const MAX_TOKEN_NUMBER: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub doctor_id: String,
    pub doctor_name: String,
    pub doctor_specialty: String,
    #[serde(deserialize_with = "super::lenient::date")]
    pub date: NaiveDate,
    /// Display string as picked in the UI ("10:30 AM"), not ISO.
    pub time: String,
    pub patient_name: String,
    pub patient_dob: String,
    pub patient_phone: String,
    pub symptoms: String,
    pub status: AppointmentStatus,
    pub paid: bool,
    /// Queue ticket shown to the patient; fixed at creation.
    #[serde(deserialize_with = "super::lenient::number")]
    pub token_number: u32,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

/// Booking form input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub doctor_id: String,
    pub doctor_name: String,
    pub doctor_specialty: String,
    pub date: NaiveDate,
    pub time: String,
    pub patient_name: String,
    pub patient_dob: String,
    pub patient_phone: String,
    pub symptoms: String,
}

record_patch!(AppointmentPatch for Appointment {
    date: NaiveDate,
    time: String,
    symptoms: String,
    patient_phone: String,
    status: AppointmentStatus,
    paid: bool,
});

impl Record for Appointment {
    const COLLECTION: Collection = Collection::Appointments;
    const ID_PREFIX: &'static str = "apt";

    type Draft = NewAppointment;
    type Update = AppointmentPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(draft: NewAppointment, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            doctor_id: draft.doctor_id,
            doctor_name: draft.doctor_name,
            doctor_specialty: draft.doctor_specialty,
            date: draft.date,
            time: draft.time,
            patient_name: draft.patient_name,
            patient_dob: draft.patient_dob,
            patient_phone: draft.patient_phone,
            symptoms: draft.symptoms,
            status: AppointmentStatus::Upcoming,
            paid: false,
            token_number: rand::thread_rng().gen_range(1..=MAX_TOKEN_NUMBER),
            created_at,
        }
    }
}
