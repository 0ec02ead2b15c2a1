use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::ChatSender;
use crate::db::{Collection, Record};

/// One message in the conversation between a doctor and a patient.
/// A thread is the set of messages sharing (doctor_id, patient_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: String,
    pub sender: ChatSender,
    pub body: String,
    pub read: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChatMessage {
    pub doctor_id: String,
    pub patient_id: String,
    pub sender: ChatSender,
    pub body: String,
}

record_patch!(ChatMessagePatch for ChatMessage {
    read: bool,
});

impl ChatMessage {
    pub fn in_thread(&self, doctor_id: &str, patient_id: &str) -> bool {
        self.doctor_id == doctor_id && self.patient_id == patient_id
    }
}

impl Record for ChatMessage {
    const COLLECTION: Collection = Collection::ChatMessages;
    const ID_PREFIX: &'static str = "msg";

    type Draft = NewChatMessage;
    type Update = ChatMessagePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(draft: NewChatMessage, id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            doctor_id: draft.doctor_id,
            patient_id: draft.patient_id,
            sender: draft.sender,
            body: draft.body,
            read: false,
            created_at,
        }
    }
}
