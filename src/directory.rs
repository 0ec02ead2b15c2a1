//! Doctor directory: registration, availability and search.

use crate::db::{LocalStore, StorageError};
use crate::models::{clamp_rating, Doctor, DoctorPatch, NewDoctor};

/// Search filter. Both parts are optional; an empty query matches everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctorQuery {
    /// Case-insensitive substring of name or specialty.
    pub text: Option<String>,
    /// Exact specialty, case-insensitive.
    pub specialty: Option<String>,
}

impl DoctorQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_specialty(mut self, specialty: impl Into<String>) -> Self {
        self.specialty = Some(specialty.into());
        self
    }

    fn matches(&self, doctor: &Doctor) -> bool {
        if let Some(specialty) = self.specialty.as_deref() {
            if !doctor.specialty.eq_ignore_ascii_case(specialty.trim()) {
                return false;
            }
        }
        match self.text.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(text) => {
                let needle = text.to_lowercase();
                doctor.name.to_lowercase().contains(&needle)
                    || doctor.specialty.to_lowercase().contains(&needle)
            }
        }
    }
}

pub fn add_doctor(store: &LocalStore, draft: NewDoctor) -> Result<Doctor, StorageError> {
    if draft.name.trim().is_empty() {
        return Err(StorageError::Validation("doctor name is required".into()));
    }
    let doctor = store.create::<Doctor>(draft)?;
    tracing::info!(doctor_id = %doctor.id, specialty = %doctor.specialty, "Doctor registered");
    Ok(doctor)
}

pub fn list_doctors(store: &LocalStore) -> Result<Vec<Doctor>, StorageError> {
    store.get_all()
}

pub fn find_doctor(store: &LocalStore, id: &str) -> Result<Option<Doctor>, StorageError> {
    store.find(id)
}

/// Replace the weekdays a doctor takes appointments on.
pub fn set_availability(
    store: &LocalStore,
    id: &str,
    days: Vec<String>,
) -> Result<Option<Doctor>, StorageError> {
    store.update::<Doctor>(
        id,
        DoctorPatch {
            available_days: Some(days),
            ..Default::default()
        },
    )
}

/// Set a doctor's rating, clamped to `0.0..=5.0`.
pub fn set_rating(store: &LocalStore, id: &str, rating: f32) -> Result<Option<Doctor>, StorageError> {
    store.modify::<Doctor>(id, |doctor| doctor.rating = clamp_rating(rating))
}

/// Matching doctors, best rated first, ties by name.
pub fn search_doctors(store: &LocalStore, query: &DoctorQuery) -> Result<Vec<Doctor>, StorageError> {
    let mut found: Vec<Doctor> = list_doctors(store)?
        .into_iter()
        .filter(|d| query.matches(d))
        .collect();
    found.sort_by(|a, b| {
        b.rating
            .total_cmp(&a.rating)
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(found)
}

/// Doctors taking appointments on `weekday` ("Monday", case-insensitive).
pub fn doctors_available_on(store: &LocalStore, weekday: &str) -> Result<Vec<Doctor>, StorageError> {
    Ok(list_doctors(store)?
        .into_iter()
        .filter(|d| d.available_days.iter().any(|day| day.eq_ignore_ascii_case(weekday)))
        .collect())
}

/// Distinct specialties, sorted.
pub fn specialties(store: &LocalStore) -> Result<Vec<String>, StorageError> {
    let mut all: Vec<String> = list_doctors(store)?.into_iter().map(|d| d.specialty).collect();
    all.sort();
    all.dedup();
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str, specialty: &str, rating: f32, days: &[&str]) -> NewDoctor {
        NewDoctor {
            name: name.into(),
            specialty: specialty.into(),
            experience_years: 10,
            rating,
            fee: 60,
            available_days: days.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn seeded() -> LocalStore {
        let store = LocalStore::open_in_memory().unwrap();
        add_doctor(&store, doc("Dr. Amara Obi", "Cardiology", 4.8, &["Monday", "Wednesday"])).unwrap();
        add_doctor(&store, doc("Dr. Ben Carter", "Dermatology", 4.2, &["Tuesday"])).unwrap();
        add_doctor(&store, doc("Dr. Ana Cruz", "Cardiology", 4.8, &["Friday"])).unwrap();
        add_doctor(&store, doc("Dr. Lena Vogt", "Pediatrics", 3.9, &["Monday"])).unwrap();
        store
    }

    fn names(doctors: &[Doctor]) -> Vec<&str> {
        doctors.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn empty_query_returns_all_by_rating() {
        let store = seeded();
        let all = search_doctors(&store, &DoctorQuery::default()).unwrap();
        assert_eq!(
            names(&all),
            vec!["Dr. Amara Obi", "Dr. Ana Cruz", "Dr. Ben Carter", "Dr. Lena Vogt"]
        );
    }

    #[test]
    fn text_matches_name_or_specialty() {
        let store = seeded();
        assert_eq!(names(&search_doctors(&store, &DoctorQuery::text("CARTER")).unwrap()), vec!["Dr. Ben Carter"]);
        assert_eq!(search_doctors(&store, &DoctorQuery::text("cardio")).unwrap().len(), 2);
        assert!(search_doctors(&store, &DoctorQuery::text("neuro")).unwrap().is_empty());
    }

    #[test]
    fn specialty_filter_is_exact() {
        let store = seeded();
        let query = DoctorQuery::text("dr.").with_specialty("pediatrics");
        assert_eq!(names(&search_doctors(&store, &query).unwrap()), vec!["Dr. Lena Vogt"]);

        let partial = DoctorQuery::default().with_specialty("Cardio");
        assert!(search_doctors(&store, &partial).unwrap().is_empty());
    }

    #[test]
    fn distinct_sorted_specialties() {
        let store = seeded();
        assert_eq!(
            specialties(&store).unwrap(),
            vec!["Cardiology", "Dermatology", "Pediatrics"]
        );
    }

    #[test]
    fn availability_updates_and_filters() {
        let store = seeded();
        assert_eq!(doctors_available_on(&store, "monday").unwrap().len(), 2);

        let carter = search_doctors(&store, &DoctorQuery::text("Carter")).unwrap().remove(0);
        let updated = set_availability(&store, &carter.id, vec!["Monday".into()]).unwrap().unwrap();
        assert_eq!(updated.available_days, vec!["Monday"]);
        assert_eq!(doctors_available_on(&store, "Monday").unwrap().len(), 3);
        assert_eq!(find_doctor(&store, &carter.id).unwrap(), Some(updated));
    }

    #[test]
    fn rating_updates_are_clamped() {
        let store = seeded();
        let vogt = search_doctors(&store, &DoctorQuery::text("Vogt")).unwrap().remove(0);

        let high = set_rating(&store, &vogt.id, 9.0).unwrap().unwrap();
        assert_eq!(high.rating, 5.0);
        let low = set_rating(&store, &vogt.id, -2.5).unwrap().unwrap();
        assert_eq!(low.rating, 0.0);
        let nan = set_rating(&store, &vogt.id, f32::NAN).unwrap().unwrap();
        assert_eq!(nan.rating, 0.0);
        let mid = set_rating(&store, &vogt.id, 4.4).unwrap().unwrap();
        assert_eq!(find_doctor(&store, &vogt.id).unwrap().unwrap().rating, mid.rating);

        assert!(set_rating(&store, "doc-0", 3.0).unwrap().is_none());
    }

    #[test]
    fn patch_cannot_touch_rating() {
        let patch: DoctorPatch = serde_json::from_str(r#"{"rating":9.0,"fee":75}"#).unwrap();
        assert_eq!(patch.fee, Some(75));

        let store = seeded();
        let carter = search_doctors(&store, &DoctorQuery::text("Carter")).unwrap().remove(0);
        let updated = store.update::<Doctor>(&carter.id, patch).unwrap().unwrap();
        assert_eq!(updated.rating, carter.rating);
        assert_eq!(updated.fee, 75);
    }

    #[test]
    fn rating_clamped_and_name_required() {
        let store = LocalStore::open_in_memory().unwrap();
        let high = add_doctor(&store, doc("Dr. Max", "Surgery", 9.0, &[])).unwrap();
        assert_eq!(high.rating, 5.0);
        assert!(matches!(
            add_doctor(&store, doc(" ", "Surgery", 4.0, &[])),
            Err(StorageError::Validation(_))
        ));
    }
}
