// In-memory message store for one conversation. Append-only at the tail;
// everything else is an in-place status mutation looked up by message id.

use std::collections::HashMap;

use log::{debug, warn};

use crate::error::ChatError;
use crate::models::{DeliveryStatus, Message, DELETED_MESSAGE_TEXT};

/// Ordered message list for a single room.
///
/// Per-message lifecycle: `Sending -> {Delivered, Failed}`,
/// `Failed -> {Sending (retry), removed}`, `Delivered -> deleted` (sender
/// only, terminal). Deleted records keep their id and timestamp but lose
/// content and attachments.
pub struct ConversationStore {
    room_id: String,
    messages: Vec<Message>,
    index: HashMap<String, usize>,
}

impl ConversationStore {
    pub fn new(room_id: &str) -> Self {
        ConversationStore {
            room_id: room_id.to_string(),
            messages: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.index.get(id).map(|&pos| &self.messages[pos])
    }

    pub fn latest(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Insert at the tail. Ids must be unique within the conversation.
    pub fn append(&mut self, mut message: Message) -> Result<(), ChatError> {
        if self.index.contains_key(&message.id) {
            return Err(ChatError::DuplicateMessage(message.id));
        }
        if let Some(last) = self.messages.last() {
            // Keep appended timestamps non-decreasing when the clock steps back.
            if message.timestamp < last.timestamp {
                warn!(
                    "message {} timestamp behind tail of room {}; clamping",
                    message.id, self.room_id
                );
                message.timestamp = last.timestamp;
            }
        }
        self.index.insert(message.id.clone(), self.messages.len());
        self.messages.push(message);
        Ok(())
    }

    /// Confirmation arrived for an in-flight send. Idempotent once delivered.
    pub fn mark_delivered(&mut self, id: &str) -> Result<(), ChatError> {
        let message = self.get_mut(id)?;
        match message.status {
            DeliveryStatus::Sending => {
                message.status = DeliveryStatus::Delivered;
                Ok(())
            }
            DeliveryStatus::Delivered => Ok(()),
            DeliveryStatus::Failed => Err(ChatError::InvalidTransition {
                id: id.to_string(),
                from: DeliveryStatus::Failed,
            }),
        }
    }

    /// Confirmation failed for an in-flight send. Idempotent once failed.
    pub fn mark_failed(&mut self, id: &str) -> Result<(), ChatError> {
        let message = self.get_mut(id)?;
        match message.status {
            DeliveryStatus::Sending | DeliveryStatus::Failed => {
                message.status = DeliveryStatus::Failed;
                // Failed sends never reached anyone, so they carry no read info.
                message.read_count = None;
                Ok(())
            }
            DeliveryStatus::Delivered => Err(ChatError::InvalidTransition {
                id: id.to_string(),
                from: DeliveryStatus::Delivered,
            }),
        }
    }

    /// Put a failed message back in flight for a retry.
    pub fn mark_sending(&mut self, id: &str) -> Result<(), ChatError> {
        let message = self.get_mut(id)?;
        match message.status {
            DeliveryStatus::Failed | DeliveryStatus::Sending => {
                message.status = DeliveryStatus::Sending;
                Ok(())
            }
            DeliveryStatus::Delivered => Err(ChatError::InvalidTransition {
                id: id.to_string(),
                from: DeliveryStatus::Delivered,
            }),
        }
    }

    /// Replace the content of a delivered message with the tombstone text.
    /// Only the original sender may do this; the record itself stays in place.
    pub fn mark_deleted(&mut self, id: &str, requester_id: &str) -> Result<(), ChatError> {
        let message = self.get_mut(id)?;
        if message.sender_id != requester_id {
            return Err(ChatError::PermissionDenied);
        }
        if message.deleted {
            debug!("message {} already deleted", id);
            return Ok(());
        }
        if message.status != DeliveryStatus::Delivered {
            return Err(ChatError::InvalidTransition {
                id: id.to_string(),
                from: message.status,
            });
        }
        message.content = DELETED_MESSAGE_TEXT.to_string();
        message.deleted = true;
        message.attachments.clear();
        message.read_count = None;
        Ok(())
    }

    /// Physically drop a message. Only legal for failed sends the user chose
    /// to discard; everything else is retained for ordering.
    pub fn remove(&mut self, id: &str) -> Result<Message, ChatError> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| ChatError::UnknownMessage(id.to_string()))?;
        if self.messages[pos].status != DeliveryStatus::Failed {
            return Err(ChatError::InvalidTransition {
                id: id.to_string(),
                from: self.messages[pos].status,
            });
        }
        let removed = self.messages.remove(pos);
        self.index.remove(id);
        for entry in self.index.values_mut() {
            if *entry > pos {
                *entry -= 1;
            }
        }
        Ok(removed)
    }

    /// Seed the unread-participant badge for a group-room message.
    pub fn set_read_count(&mut self, id: &str, count: u32) -> Result<(), ChatError> {
        let message = self.get_mut(id)?;
        message.read_count = Some(count);
        Ok(())
    }

    /// One more participant has read this message. Returns the new count, or
    /// `None` when the message carries no read tracking.
    pub fn acknowledge_read(&mut self, id: &str) -> Result<Option<u32>, ChatError> {
        let message = self.get_mut(id)?;
        if let Some(count) = message.read_count.as_mut() {
            *count = count.saturating_sub(1);
            return Ok(Some(*count));
        }
        Ok(None)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Message, ChatError> {
        let pos = *self
            .index
            .get(id)
            .ok_or_else(|| ChatError::UnknownMessage(id.to_string()))?;
        Ok(&mut self.messages[pos])
    }
}
