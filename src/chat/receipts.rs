// Delivery and read receipts: settling in-flight sends and keeping the
// unread-participant badges of group rooms current.

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::{mpsc, Mutex as TokioMutex};

use super::{ChatEvent, ChatSession, ConversationStore, DeliveryReceipt, PendingSend};
use crate::error::ChatError;
use crate::models::DeliveryStatus;

/// Settle one message to its post-confirmation status. Called from the
/// confirmation tasks, which hold clones of the shared state rather than a
/// session handle. A result that no longer applies (the user discarded the
/// message, or a retry already settled it) is logged and dropped.
pub(crate) async fn resolve_delivery(
    store: &Arc<TokioMutex<ConversationStore>>,
    pending: &Arc<TokioMutex<HashMap<String, PendingSend>>>,
    event_tx: &mpsc::Sender<ChatEvent>,
    message_id: &str,
    status: DeliveryStatus,
) {
    let applied = {
        let mut store = store.lock().await;
        match status {
            DeliveryStatus::Delivered => store.mark_delivered(message_id),
            DeliveryStatus::Failed => store.mark_failed(message_id),
            DeliveryStatus::Sending => store.mark_sending(message_id),
        }
    };

    match applied {
        Ok(()) => {
            info!("message {} settled as {:?}", message_id, status);
            if status == DeliveryStatus::Delivered {
                pending.lock().await.remove(message_id);
            }
            let event = ChatEvent::StatusChanged {
                message_id: message_id.to_string(),
                status,
            };
            if let Err(e) = event_tx.send(event).await {
                error!("failed to send status update to the screen: {}", e);
            }
        }
        Err(e) => {
            debug!("stale confirmation for {}: {}", message_id, e);
        }
    }
}

impl ChatSession {
    /// Apply a delivery receipt that arrived out of band, e.g. pushed by a
    /// backend rather than returned from our own send.
    pub async fn apply_delivery_receipt(&self, receipt: &DeliveryReceipt) {
        resolve_delivery(
            &self.store,
            &self.pending,
            &self.event_tx,
            &receipt.message_id,
            DeliveryStatus::Delivered,
        )
        .await;
    }

    /// Start tracking unread participants for a group-room message.
    pub async fn track_reads(&self, message_id: &str, unread: u32) -> Result<(), ChatError> {
        self.store.lock().await.set_read_count(message_id, unread)?;
        self.emit(ChatEvent::ReadCountChanged {
            message_id: message_id.to_string(),
            read_count: unread,
        })
        .await;
        Ok(())
    }

    /// One participant has read the message; shrink its unread badge.
    /// Messages without read tracking ignore the receipt.
    pub async fn apply_read_receipt(&self, message_id: &str) -> Result<(), ChatError> {
        let updated = self.store.lock().await.acknowledge_read(message_id)?;
        if let Some(read_count) = updated {
            self.emit(ChatEvent::ReadCountChanged {
                message_id: message_id.to_string(),
                read_count,
            })
            .await;
        }
        Ok(())
    }
}
