//! Prescriptions written by doctors, read by patients.

use crate::db::{LocalStore, StorageError};
use crate::models::{NewPrescription, NotificationKind, Prescription};
use crate::notifications::push_notification;

/// Store a prescription and notify the patient.
///
/// A prescription with no medicines is rejected. As with booking, the
/// notification is a separate write and its failure does not undo the
/// prescription.
pub fn write_prescription(store: &LocalStore, draft: NewPrescription) -> Result<Prescription, StorageError> {
    if draft.medicines.is_empty() {
        return Err(StorageError::Validation(
            "prescription needs at least one medicine".into(),
        ));
    }
    if let Some(blank) = draft.medicines.iter().position(|m| m.name.trim().is_empty()) {
        return Err(StorageError::Validation(format!(
            "medicine #{} has no name",
            blank + 1
        )));
    }

    let prescription = store.create::<Prescription>(draft)?;
    tracing::info!(
        prescription_id = %prescription.id,
        medicines = prescription.medicines.len(),
        "Prescription written"
    );

    let message = format!(
        "{} prescribed {} medicine(s) for {}.",
        prescription.doctor_name,
        prescription.medicines.len(),
        prescription.diagnosis
    );
    if let Err(e) = push_notification(store, NotificationKind::Prescription, "New prescription", &message) {
        tracing::warn!(prescription_id = %prescription.id, error = %e, "Prescription notification not saved");
    }
    Ok(prescription)
}

pub fn list_prescriptions(store: &LocalStore) -> Result<Vec<Prescription>, StorageError> {
    store.get_all()
}

/// Newest issue date first.
pub fn prescriptions_for_patient(store: &LocalStore, patient_id: &str) -> Result<Vec<Prescription>, StorageError> {
    let mut found: Vec<Prescription> = list_prescriptions(store)?
        .into_iter()
        .filter(|p| p.patient_id == patient_id)
        .collect();
    found.sort_by(|a, b| b.issued_on.cmp(&a.issued_on));
    Ok(found)
}

/// Newest issue date first.
pub fn prescriptions_by_doctor(store: &LocalStore, doctor_id: &str) -> Result<Vec<Prescription>, StorageError> {
    let mut found: Vec<Prescription> = list_prescriptions(store)?
        .into_iter()
        .filter(|p| p.doctor_id == doctor_id)
        .collect();
    found.sort_by(|a, b| b.issued_on.cmp(&a.issued_on));
    Ok(found)
}
