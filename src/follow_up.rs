//! Follow-up visits: lifecycle helpers, urgency classification and the
//! background refresher that recounts urgency on a fixed period.
//!
//! Urgency is never stored. It is derived from the scheduled date + time
//! against "now" on every read:
//! - `Overdue`: now is past the scheduled time
//! - `DueSoon`: at most 24 hours to go (inclusive)
//! - `Normal`: anything further out
//!
//! Only pending follow-ups (scheduled or rescheduled) carry an urgency.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::config::StoreConfig;
use crate::db::{LocalStore, StorageError};
use crate::events::StoreEvent;
use crate::models::{Doctor, FollowUp, FollowUpPatch, FollowUpStatus, FollowUpUrgency, NewFollowUp};
use crate::schedule::slot_datetime;

/// Upper bound of the due-soon window, inclusive.
pub const DUE_SOON_WINDOW_HOURS: i64 = 24;

/// Default recount period of the background refresher.
pub const DEFAULT_REFRESH_PERIOD: Duration = Duration::from_secs(60);

/// Sleep granularity for shutdown responsiveness.
const SLEEP_GRANULARITY: Duration = Duration::from_millis(250);

// ═══════════════════════════════════════════
// Urgency
// ═══════════════════════════════════════════

pub fn classify_urgency(scheduled: NaiveDateTime, now: NaiveDateTime) -> FollowUpUrgency {
    if now > scheduled {
        return FollowUpUrgency::Overdue;
    }
    if scheduled - now <= chrono::Duration::hours(DUE_SOON_WINDOW_HOURS) {
        FollowUpUrgency::DueSoon
    } else {
        FollowUpUrgency::Normal
    }
}

/// When the follow-up is due.
pub fn scheduled_at(follow_up: &FollowUp) -> NaiveDateTime {
    slot_datetime(follow_up.date, &follow_up.time)
}

/// Urgency of a single follow-up, `None` once it is no longer pending.
pub fn urgency_of(follow_up: &FollowUp, now: NaiveDateTime) -> Option<FollowUpUrgency> {
    follow_up
        .status
        .is_pending()
        .then(|| classify_urgency(scheduled_at(follow_up), now))
}

/// Follow-up paired with its urgency at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpView {
    #[serde(flatten)]
    pub follow_up: FollowUp,
    pub urgency: Option<FollowUpUrgency>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrgencyCounts {
    pub overdue: usize,
    pub due_soon: usize,
    pub normal: usize,
}

/// Every follow-up with its urgency, soonest first.
pub fn follow_ups_with_urgency(
    store: &LocalStore,
    now: NaiveDateTime,
) -> Result<Vec<FollowUpView>, StorageError> {
    let mut follow_ups = list_follow_ups(store)?;
    follow_ups.sort_by_key(scheduled_at);
    Ok(follow_ups
        .into_iter()
        .map(|follow_up| FollowUpView {
            urgency: urgency_of(&follow_up, now),
            follow_up,
        })
        .collect())
}

pub fn urgency_counts(store: &LocalStore, now: NaiveDateTime) -> Result<UrgencyCounts, StorageError> {
    let mut counts = UrgencyCounts::default();
    for follow_up in list_follow_ups(store)? {
        match urgency_of(&follow_up, now) {
            Some(FollowUpUrgency::Overdue) => counts.overdue += 1,
            Some(FollowUpUrgency::DueSoon) => counts.due_soon += 1,
            Some(FollowUpUrgency::Normal) => counts.normal += 1,
            None => {}
        }
    }
    Ok(counts)
}

/// Recount urgency and publish `StoreEvent::UrgencyRefreshed`.
pub fn refresh_urgency(store: &LocalStore, now: NaiveDateTime) -> Result<UrgencyCounts, StorageError> {
    let counts = urgency_counts(store, now)?;
    store.events().publish(StoreEvent::UrgencyRefreshed {
        overdue: counts.overdue,
        due_soon: counts.due_soon,
    });
    Ok(counts)
}

// ═══════════════════════════════════════════
// Lifecycle
// ═══════════════════════════════════════════

pub fn schedule_follow_up(store: &LocalStore, draft: NewFollowUp) -> Result<FollowUp, StorageError> {
    let follow_up = store.create::<FollowUp>(draft)?;
    tracing::info!(follow_up_id = %follow_up.id, date = %follow_up.date, "Follow-up scheduled");
    Ok(follow_up)
}

pub fn list_follow_ups(store: &LocalStore) -> Result<Vec<FollowUp>, StorageError> {
    store.get_all()
}

pub fn follow_ups_for_patient(store: &LocalStore, patient_id: &str) -> Result<Vec<FollowUp>, StorageError> {
    Ok(list_follow_ups(store)?
        .into_iter()
        .filter(|f| f.patient_id == patient_id)
        .collect())
}

pub fn follow_ups_for_doctor(store: &LocalStore, doctor_id: &str) -> Result<Vec<FollowUp>, StorageError> {
    Ok(list_follow_ups(store)?
        .into_iter()
        .filter(|f| f.doctor_id == doctor_id)
        .collect())
}

/// Move to a new slot and mark as rescheduled.
pub fn reschedule_follow_up(
    store: &LocalStore,
    id: &str,
    date: NaiveDate,
    time: &str,
) -> Result<Option<FollowUp>, StorageError> {
    store.update::<FollowUp>(
        id,
        FollowUpPatch {
            date: Some(date),
            time: Some(time.to_string()),
            status: Some(FollowUpStatus::Rescheduled),
            ..Default::default()
        },
    )
}

/// Hand the follow-up to another doctor. The first owner is remembered
/// across any number of reassignments.
pub fn reassign_follow_up(
    store: &LocalStore,
    id: &str,
    doctor: &Doctor,
) -> Result<Option<FollowUp>, StorageError> {
    store.modify::<FollowUp>(id, |follow_up| {
        if follow_up.original_doctor_id.is_none() {
            follow_up.original_doctor_id = Some(follow_up.doctor_id.clone());
        }
        follow_up.is_reassigned = true;
        follow_up.doctor_id = doctor.id.clone();
        follow_up.doctor_name = doctor.name.clone();
        follow_up.doctor_specialty = doctor.specialty.clone();
    })
}

pub fn complete_follow_up(store: &LocalStore, id: &str) -> Result<Option<FollowUp>, StorageError> {
    set_follow_up_status(store, id, FollowUpStatus::Completed)
}

pub fn mark_missed(store: &LocalStore, id: &str) -> Result<Option<FollowUp>, StorageError> {
    set_follow_up_status(store, id, FollowUpStatus::Missed)
}

fn set_follow_up_status(
    store: &LocalStore,
    id: &str,
    status: FollowUpStatus,
) -> Result<Option<FollowUp>, StorageError> {
    store.update::<FollowUp>(
        id,
        FollowUpPatch {
            status: Some(status),
            ..Default::default()
        },
    )
}

// ═══════════════════════════════════════════
// Background refresher
// ═══════════════════════════════════════════

/// Handle for the urgency refresher thread.
///
/// Recounts once at start and then every `period`. Shuts down on
/// `shutdown()` or when dropped.
pub struct UrgencyWatcher {
    period: Duration,
    shutdown: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl UrgencyWatcher {
    /// Start with the period configured in `StoreConfig::urgency_refresh`.
    pub fn from_config(store: Arc<LocalStore>, config: &StoreConfig) -> Self {
        Self::start(store, config.urgency_refresh)
    }

    pub fn start(store: Arc<LocalStore>, period: Duration) -> Self {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = shutdown.clone();

        let handle = std::thread::spawn(move || {
            tracing::info!("Urgency refresher started (every {}s)", period.as_secs_f32());
            watch_loop(&store, period, &flag);
        });

        Self {
            period,
            shutdown,
            handle: Some(handle),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for UrgencyWatcher {
    fn drop(&mut self) {
        self.shutdown();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}

fn watch_loop(store: &LocalStore, period: Duration, shutdown: &AtomicBool) {
    let slice = period.min(SLEEP_GRANULARITY).max(Duration::from_millis(1));
    while !shutdown.load(Ordering::Relaxed) {
        if let Err(e) = refresh_urgency(store, Local::now().naive_local()) {
            tracing::warn!(error = %e, "Urgency refresh failed");
        }

        let mut waited = Duration::ZERO;
        while waited < period {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            std::thread::sleep(slice);
            waited += slice;
        }
    }
    tracing::info!("Urgency refresher shutting down");
}
