// Conversation engine for the Devths client. This module owns the message
// store, the optimistic send pipeline, and the event channel the screens
// listen on; submodules are organized by concern.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error};
use tokio::sync::{mpsc, Mutex as TokioMutex};
use tokio_util::sync::CancellationToken;

pub mod assistant;
pub mod directory;
pub mod pipeline;
pub mod receipts;
pub mod store;
pub mod transport;
pub mod typing;

pub use directory::ConversationDirectory;
pub use pipeline::SendPolicy;
pub use store::ConversationStore;
pub use transport::{DeliveryReceipt, MessageTransport, OutgoingMessage, SimulatedTransport};
pub use typing::TypingStatus;

use crate::error::ChatError;
use crate::models::{Attachment, DeliveryStatus, Message};

/// Capacity of the event channel between the engine and the screen.
const EVENT_CHANNEL_CAPACITY: usize = 100;

/// What the screens observe about a conversation. Every mutation the session
/// makes is mirrored by exactly one event.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    MessageAppended(Message),
    StatusChanged {
        message_id: String,
        status: DeliveryStatus,
    },
    MessageDeleted {
        message_id: String,
    },
    MessageRemoved {
        message_id: String,
    },
    ReadCountChanged {
        message_id: String,
        read_count: u32,
    },
    Typing {
        user_id: String,
        status: TypingStatus,
    },
}

/// One not-yet-settled send. Kept until the message is delivered or discarded
/// so a retry can replay the same payload.
#[derive(Clone)]
pub(crate) struct PendingSend {
    pub outgoing: OutgoingMessage,
    pub cancel: CancellationToken,
}

/// Handle to one open conversation. Cheap to clone; all state is shared.
///
/// The store is owned here and handed to presentation code by snapshot, never
/// through a global.
#[derive(Clone)]
pub struct ChatSession {
    room_id: String,
    user_id: String,
    user_name: String,
    pub(crate) store: Arc<TokioMutex<ConversationStore>>,
    pub(crate) transport: Arc<dyn MessageTransport>,
    pub(crate) pending: Arc<TokioMutex<HashMap<String, PendingSend>>>,
    pub(crate) event_tx: mpsc::Sender<ChatEvent>,
    pub(crate) policy: SendPolicy,
    pub(crate) shutdown: CancellationToken,
}

impl ChatSession {
    pub fn new(
        room_id: &str,
        user_id: &str,
        user_name: &str,
        transport: Arc<dyn MessageTransport>,
    ) -> (Self, mpsc::Receiver<ChatEvent>) {
        Self::with_policy(room_id, user_id, user_name, transport, SendPolicy::default())
    }

    pub fn with_policy(
        room_id: &str,
        user_id: &str,
        user_name: &str,
        transport: Arc<dyn MessageTransport>,
        policy: SendPolicy,
    ) -> (Self, mpsc::Receiver<ChatEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let session = ChatSession {
            room_id: room_id.to_string(),
            user_id: user_id.to_string(),
            user_name: user_name.to_string(),
            store: Arc::new(TokioMutex::new(ConversationStore::new(room_id))),
            transport,
            pending: Arc::new(TokioMutex::new(HashMap::new())),
            event_tx,
            policy,
            shutdown: CancellationToken::new(),
        };
        (session, event_rx)
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    /// Snapshot of the conversation in order, for rendering.
    pub async fn messages(&self) -> Vec<Message> {
        self.store.lock().await.messages().to_vec()
    }

    pub async fn message(&self, id: &str) -> Option<Message> {
        self.store.lock().await.get(id).cloned()
    }

    /// Append a message from another participant. These arrive confirmed, so
    /// no pipeline is involved.
    pub async fn receive_message(
        &self,
        sender_id: &str,
        sender_name: &str,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<String, ChatError> {
        let message = Message::incoming(sender_id, sender_name, content, attachments);
        let id = message.id.clone();
        let stored = {
            let mut store = self.store.lock().await;
            store.append(message)?;
            store.get(&id).cloned()
        };
        if let Some(message) = stored {
            self.emit(ChatEvent::MessageAppended(message)).await;
        }
        Ok(id)
    }

    /// Delete one of the local user's delivered messages, leaving a tombstone.
    pub async fn delete_message(&self, id: &str) -> Result<(), ChatError> {
        self.store.lock().await.mark_deleted(id, &self.user_id)?;
        self.emit(ChatEvent::MessageDeleted {
            message_id: id.to_string(),
        })
        .await;
        Ok(())
    }

    /// Drop a failed send entirely. The only path that removes a record.
    pub async fn discard_message(&self, id: &str) -> Result<(), ChatError> {
        let removed = self.store.lock().await.remove(id)?;
        if let Some(pending) = self.pending.lock().await.remove(id) {
            pending.cancel.cancel();
        }
        debug!("discarded failed message {}", removed.id);
        self.emit(ChatEvent::MessageRemoved {
            message_id: id.to_string(),
        })
        .await;
        Ok(())
    }

    /// Forward a typing-state change to the screen. Fire and forget; a full
    /// channel only costs us the indicator, never a stall.
    pub fn notify_typing(&self, user_id: &str, status: TypingStatus) {
        let event = ChatEvent::Typing {
            user_id: user_id.to_string(),
            status,
        };
        if let Err(e) = self.event_tx.try_send(event) {
            debug!("dropped typing event: {}", e);
        }
    }

    /// Tear the session down. In-flight confirmations are cancelled so none
    /// of them mutate the store afterwards.
    pub fn shutdown(&self) {
        debug!("shutting down session for room {}", self.room_id);
        self.shutdown.cancel();
    }

    pub(crate) async fn emit(&self, event: ChatEvent) {
        if let Err(e) = self.event_tx.send(event).await {
            error!("failed to send event to the screen: {}", e);
        }
    }
}
