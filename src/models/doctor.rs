use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{Collection, Record};

/// Directory entry patients search and book against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub experience_years: u32,
    /// 0.0 to 5.0
    pub rating: f32,
    /// Consultation fee in whole currency units.
    pub fee: u32,
    /// Weekday names the doctor takes appointments on ("Monday", ...).
    #[serde(default)]
    pub available_days: Vec<String>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDoctor {
    pub name: String,
    pub specialty: String,
    pub experience_years: u32,
    pub rating: f32,
    pub fee: u32,
    pub available_days: Vec<String>,
}

record_patch!(
    /// Rating is not patchable; it goes through `clamp_rating` instead.
    DoctorPatch for Doctor {
        specialty: String,
        experience_years: u32,
        fee: u32,
        available_days: Vec<String>,
    }
);

/// Ratings live in `0.0..=5.0`; NaN counts as unrated.
pub fn clamp_rating(rating: f32) -> f32 {
    if rating.is_nan() {
        0.0
    } else {
        rating.clamp(0.0, 5.0)
    }
}

impl Record for Doctor {
    const COLLECTION: Collection = Collection::Doctors;
    const ID_PREFIX: &'static str = "doc";

    type Draft = NewDoctor;
    type Update = DoctorPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(draft: NewDoctor, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            specialty: draft.specialty,
            experience_years: draft.experience_years,
            rating: clamp_rating(draft.rating),
            fee: draft.fee,
            available_days: draft.available_days,
            created_at,
        }
    }
}
