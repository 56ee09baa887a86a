use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text shown in place of a deleted message. The record itself is kept so the
/// conversation ordering and the message id stay stable.
pub const DELETED_MESSAGE_TEXT: &str = "삭제된 메시지입니다.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    Sending,   // Appended locally, confirmation still in flight
    Delivered, // Confirmed by the transport
    Failed,    // Confirmation failed, may be retried or discarded
}

/// Attachment payload of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attachment {
    Image { url: String },
    File { name: String, size: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub attachments: Vec<Attachment>,
    pub deleted: bool,
    /// Participants who have not read this message yet, in group rooms only.
    pub read_count: Option<u32>,
}

impl Message {
    /// A message authored by the local user, not yet confirmed.
    pub fn outgoing(
        sender_id: &str,
        sender_name: &str,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Self {
        Message {
            id: Uuid::new_v4().to_string(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            timestamp: Utc::now(),
            status: DeliveryStatus::Sending,
            attachments,
            deleted: false,
            read_count: None,
        }
    }

    /// A message received from another participant. These arrive already
    /// confirmed, so they start out as delivered.
    pub fn incoming(
        sender_id: &str,
        sender_name: &str,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Self {
        Message {
            status: DeliveryStatus::Delivered,
            ..Message::outgoing(sender_id, sender_name, content, attachments)
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Which chat-list category a room belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomKind {
    Personal,
    Group,
    Popular,
}

/// One row of the chat-list screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub id: String,
    pub name: String,
    pub kind: RoomKind,
    pub tag: Option<String>,
    pub participant_count: Option<u32>,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    pub has_unread: bool,
    pub muted: bool,
}

impl RoomSummary {
    pub fn new(id: &str, name: &str, kind: RoomKind) -> Self {
        RoomSummary {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            tag: None,
            participant_count: None,
            last_message: String::new(),
            last_message_at: Utc::now(),
            has_unread: false,
            muted: false,
        }
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    pub fn with_participants(mut self, count: u32) -> Self {
        self.participant_count = Some(count);
        self
    }
}
