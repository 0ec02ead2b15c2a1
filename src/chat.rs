//! Doctor–patient messaging: sending, thread reads, read receipts and the
//! thread list with derived summary fields.
//!
//! A thread is not stored. It is the set of messages sharing
//! (doctor_id, patient_id), grouped on read.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::{LocalStore, StorageError};
use crate::models::{ChatMessage, ChatSender, NewChatMessage, NotificationKind};
use crate::notifications::push_notification;

/// Maximum characters of a thread preview before "..." is appended.
pub const PREVIEW_CHARS: usize = 50;

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

/// Whose inbox a thread list is built for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatParty {
    Patient(String),
    Doctor(String),
}

impl ChatParty {
    pub fn role(&self) -> ChatSender {
        match self {
            Self::Patient(_) => ChatSender::Patient,
            Self::Doctor(_) => ChatSender::Doctor,
        }
    }

    fn takes_part_in(&self, message: &ChatMessage) -> bool {
        match self {
            Self::Patient(id) => message.patient_id == *id,
            Self::Doctor(id) => message.doctor_id == *id,
        }
    }
}

/// One row of the thread list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSummary {
    pub doctor_id: String,
    pub patient_id: String,
    pub last_message_preview: String,
    pub last_sender: ChatSender,
    pub last_message_at: DateTime<Utc>,
    pub message_count: usize,
    /// Messages from the other party the viewer has not read.
    pub unread_count: usize,
}

// ═══════════════════════════════════════════
// Preview
// ═══════════════════════════════════════════

/// First 50 characters of a message, with "..." if cut. UTF-8 safe.
pub fn preview(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((boundary, _)) => format!("{}...", &trimmed[..boundary]),
        None => trimmed.to_string(),
    }
}

// ═══════════════════════════════════════════
// Repository functions
// ═══════════════════════════════════════════

/// Append a message to the thread. A blank body is rejected.
///
/// Messages from a doctor also raise a notification for the patient.
pub fn send_message(
    store: &LocalStore,
    doctor_id: &str,
    patient_id: &str,
    sender: ChatSender,
    body: &str,
) -> Result<ChatMessage, StorageError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(StorageError::Validation("message body is empty".into()));
    }

    let message = store.create::<ChatMessage>(NewChatMessage {
        doctor_id: doctor_id.to_string(),
        patient_id: patient_id.to_string(),
        sender,
        body: body.to_string(),
    })?;
    tracing::debug!(message_id = %message.id, sender = sender.as_str(), "Chat message sent");

    if sender == ChatSender::Doctor {
        if let Err(e) = push_notification(store, NotificationKind::Message, "New message", &preview(body)) {
            tracing::warn!(message_id = %message.id, error = %e, "Message notification not saved");
        }
    }
    Ok(message)
}

/// Messages of one thread, oldest first.
pub fn thread_messages(
    store: &LocalStore,
    doctor_id: &str,
    patient_id: &str,
) -> Result<Vec<ChatMessage>, StorageError> {
    let mut messages: Vec<ChatMessage> = store
        .get_all::<ChatMessage>()?
        .into_iter()
        .filter(|m| m.in_thread(doctor_id, patient_id))
        .collect();
    messages.sort_by_key(|m| m.created_at);
    Ok(messages)
}

/// Mark everything the other party sent in the thread as read by `reader`.
/// Returns how many messages changed.
pub fn mark_thread_read(
    store: &LocalStore,
    doctor_id: &str,
    patient_id: &str,
    reader: ChatSender,
) -> Result<usize, StorageError> {
    let from = reader.other();
    store.update_where::<ChatMessage>(
        |m| m.in_thread(doctor_id, patient_id) && m.sender == from && !m.read,
        |m| m.read = true,
    )
}

/// Every thread `party` takes part in, most recent activity first.
pub fn list_threads(store: &LocalStore, party: &ChatParty) -> Result<Vec<ThreadSummary>, StorageError> {
    let mut threads: BTreeMap<(String, String), Vec<ChatMessage>> = BTreeMap::new();
    for message in store.get_all::<ChatMessage>()? {
        if party.takes_part_in(&message) {
            threads
                .entry((message.doctor_id.clone(), message.patient_id.clone()))
                .or_default()
                .push(message);
        }
    }

    let viewer = party.role();
    let mut summaries: Vec<ThreadSummary> = threads
        .into_iter()
        .filter_map(|((doctor_id, patient_id), mut messages)| {
            messages.sort_by_key(|m| m.created_at);
            let unread_count = messages
                .iter()
                .filter(|m| m.sender != viewer && !m.read)
                .count();
            let message_count = messages.len();
            let last = messages.pop()?;
            Some(ThreadSummary {
                doctor_id,
                patient_id,
                last_message_preview: preview(&last.body),
                last_sender: last.sender,
                last_message_at: last.created_at,
                message_count,
                unread_count,
            })
        })
        .collect();

    summaries.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
    Ok(summaries)
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Notification;

    // ── Preview ──

    #[test]
    fn preview_short_message() {
        assert_eq!(preview("See you Monday"), "See you Monday");
    }

    #[test]
    fn preview_exactly_50_chars() {
        let msg = "A".repeat(50);
        assert_eq!(preview(&msg), msg);
    }

    #[test]
    fn preview_long_message_truncated() {
        let msg = "B".repeat(80);
        let p = preview(&msg);
        assert_eq!(p, format!("{}...", "B".repeat(50)));
    }

    #[test]
    fn preview_unicode_safe() {
        let msg = "日本語のテキスト".repeat(10);
        let p = preview(&msg);
        assert!(p.ends_with("..."));
        assert_eq!(p.chars().count(), PREVIEW_CHARS + 3);
    }

    // ── Threads ──

    #[test]
    fn blank_body_rejected() {
        let store = LocalStore::open_in_memory().unwrap();
        let err = send_message(&store, "doc-1", "pat-1", ChatSender::Patient, "  \n ").unwrap_err();
        assert!(matches!(err, StorageError::Validation(_)));
        assert!(store.get_all::<ChatMessage>().unwrap().is_empty());
    }

    #[test]
    fn thread_is_oldest_first_and_isolated() {
        let store = LocalStore::open_in_memory().unwrap();
        let a = send_message(&store, "doc-1", "pat-1", ChatSender::Patient, "Hello").unwrap();
        send_message(&store, "doc-2", "pat-1", ChatSender::Patient, "Other doctor").unwrap();
        let b = send_message(&store, "doc-1", "pat-1", ChatSender::Doctor, "Hi, how are you?").unwrap();

        let thread = thread_messages(&store, "doc-1", "pat-1").unwrap();
        assert_eq!(thread, vec![a, b]);
    }

    #[test]
    fn doctor_messages_notify_patient() {
        let store = LocalStore::open_in_memory().unwrap();
        send_message(&store, "doc-1", "pat-1", ChatSender::Patient, "Question").unwrap();
        assert!(store.get_all::<Notification>().unwrap().is_empty());

        send_message(&store, "doc-1", "pat-1", ChatSender::Doctor, "Answer").unwrap();
        let feed = store.get_all::<Notification>().unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].kind, NotificationKind::Message);
        assert_eq!(feed[0].message, "Answer");
    }

    #[test]
    fn mark_read_only_touches_other_party() {
        let store = LocalStore::open_in_memory().unwrap();
        send_message(&store, "doc-1", "pat-1", ChatSender::Doctor, "Take rest").unwrap();
        send_message(&store, "doc-1", "pat-1", ChatSender::Doctor, "Drink water").unwrap();
        send_message(&store, "doc-1", "pat-1", ChatSender::Patient, "Thanks").unwrap();

        assert_eq!(mark_thread_read(&store, "doc-1", "pat-1", ChatSender::Patient).unwrap(), 2);
        assert_eq!(mark_thread_read(&store, "doc-1", "pat-1", ChatSender::Patient).unwrap(), 0);

        let thread = thread_messages(&store, "doc-1", "pat-1").unwrap();
        assert!(!thread[2].read);
    }

    #[test]
    fn thread_list_summaries() {
        let store = LocalStore::open_in_memory().unwrap();
        send_message(&store, "doc-1", "pat-1", ChatSender::Patient, "First thread").unwrap();
        send_message(&store, "doc-2", "pat-1", ChatSender::Doctor, "Second thread opens").unwrap();
        send_message(&store, "doc-2", "pat-1", ChatSender::Doctor, "And continues").unwrap();
        send_message(&store, "doc-1", "pat-9", ChatSender::Patient, "Someone else").unwrap();

        let threads = list_threads(&store, &ChatParty::Patient("pat-1".into())).unwrap();
        assert_eq!(threads.len(), 2);

        assert_eq!(threads[0].doctor_id, "doc-2");
        assert_eq!(threads[0].message_count, 2);
        assert_eq!(threads[0].unread_count, 2);
        assert_eq!(threads[0].last_message_preview, "And continues");
        assert_eq!(threads[0].last_sender, ChatSender::Doctor);

        assert_eq!(threads[1].doctor_id, "doc-1");
        assert_eq!(threads[1].unread_count, 0);

        let doctor_view = list_threads(&store, &ChatParty::Doctor("doc-1".into())).unwrap();
        assert_eq!(doctor_view.len(), 2);
        assert!(doctor_view.iter().all(|t| t.unread_count == 1));
    }

    #[test]
    fn no_messages_no_threads() {
        let store = LocalStore::open_in_memory().unwrap();
        assert!(list_threads(&store, &ChatParty::Doctor("doc-1".into())).unwrap().is_empty());
    }
}
