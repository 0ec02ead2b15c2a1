//! Appointment booking flows and the upcoming/completed/cancelled views.
//!
//! Status changes are plain patches: any status can be set from any other,
//! nothing enforces a lifecycle. Booking writes the appointment and then a
//! confirmation notification as two separate writes; a failure on the second
//! is logged and the booking still stands.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::db::{LocalStore, StorageError};
use crate::models::{Appointment, AppointmentPatch, AppointmentStatus, NewAppointment, NotificationKind};
use crate::notifications;
use crate::schedule::slot_datetime;

// ─── Types ────────────────────────────────────────────────────────────────────

/// Appointments split by status, in the order each tab shows them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentBuckets {
    /// Soonest first.
    pub upcoming: Vec<Appointment>,
    /// Most recent first.
    pub completed: Vec<Appointment>,
    /// Most recent first.
    pub cancelled: Vec<Appointment>,
}

impl AppointmentBuckets {
    pub fn get(&self, status: AppointmentStatus) -> &[Appointment] {
        match status {
            AppointmentStatus::Upcoming => &self.upcoming,
            AppointmentStatus::Completed => &self.completed,
            AppointmentStatus::Cancelled => &self.cancelled,
        }
    }
}

// ─── Booking ──────────────────────────────────────────────────────────────────

/// Book an appointment (upcoming, unpaid, fresh token) and notify the patient.
pub fn book_appointment(
    store: &LocalStore,
    request: NewAppointment,
) -> Result<Appointment, StorageError> {
    let appointment = store.create::<Appointment>(request)?;
    tracing::info!(
        appointment_id = %appointment.id,
        doctor_id = %appointment.doctor_id,
        token = appointment.token_number,
        "Appointment booked"
    );

    let message = format!(
        "Your appointment with {} on {} at {} is confirmed. Token #{}.",
        appointment.doctor_name,
        appointment.date.format("%b %-d, %Y"),
        appointment.time,
        appointment.token_number,
    );
    if let Err(e) =
        notifications::push_notification(store, NotificationKind::Appointment, "Appointment booked", &message)
    {
        tracing::warn!(appointment_id = %appointment.id, error = %e, "Booking notification not stored");
    }

    Ok(appointment)
}

/// Move an appointment to a new date and time. Status is left as is.
pub fn reschedule_appointment(
    store: &LocalStore,
    id: &str,
    date: NaiveDate,
    time: &str,
) -> Result<Option<Appointment>, StorageError> {
    store.update::<Appointment>(
        id,
        AppointmentPatch {
            date: Some(date),
            time: Some(time.to_string()),
            ..Default::default()
        },
    )
}

pub fn cancel_appointment(store: &LocalStore, id: &str) -> Result<Option<Appointment>, StorageError> {
    set_status(store, id, AppointmentStatus::Cancelled)
}

pub fn complete_appointment(store: &LocalStore, id: &str) -> Result<Option<Appointment>, StorageError> {
    set_status(store, id, AppointmentStatus::Completed)
}

pub fn set_status(
    store: &LocalStore,
    id: &str,
    status: AppointmentStatus,
) -> Result<Option<Appointment>, StorageError> {
    store.update::<Appointment>(
        id,
        AppointmentPatch {
            status: Some(status),
            ..Default::default()
        },
    )
}

pub fn mark_paid(store: &LocalStore, id: &str) -> Result<Option<Appointment>, StorageError> {
    store.update::<Appointment>(
        id,
        AppointmentPatch {
            paid: Some(true),
            ..Default::default()
        },
    )
}

// ─── Queries ──────────────────────────────────────────────────────────────────

pub fn list_appointments(store: &LocalStore) -> Result<Vec<Appointment>, StorageError> {
    store.get_all()
}

pub fn appointments_for_doctor(
    store: &LocalStore,
    doctor_id: &str,
) -> Result<Vec<Appointment>, StorageError> {
    Ok(list_appointments(store)?
        .into_iter()
        .filter(|a| a.doctor_id == doctor_id)
        .collect())
}

/// Pure status filter, stored order kept.
pub fn appointments_with_status(
    appointments: &[Appointment],
    status: AppointmentStatus,
) -> Vec<Appointment> {
    appointments
        .iter()
        .filter(|a| a.status == status)
        .cloned()
        .collect()
}

pub fn bucket_appointments(appointments: Vec<Appointment>) -> AppointmentBuckets {
    let mut buckets = AppointmentBuckets::default();
    for appointment in appointments {
        match appointment.status {
            AppointmentStatus::Upcoming => buckets.upcoming.push(appointment),
            AppointmentStatus::Completed => buckets.completed.push(appointment),
            AppointmentStatus::Cancelled => buckets.cancelled.push(appointment),
        }
    }

    buckets.upcoming.sort_by_key(|a| slot_datetime(a.date, &a.time));
    buckets
        .completed
        .sort_by_key(|a| std::cmp::Reverse(slot_datetime(a.date, &a.time)));
    buckets
        .cancelled
        .sort_by_key(|a| std::cmp::Reverse(slot_datetime(a.date, &a.time)));
    buckets
}
