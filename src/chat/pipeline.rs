// Optimistic send pipeline. Submitting a message appends it in the Sending
// state and returns its id before any confirmation arrives; a background task
// then drives the transport with bounded attempts and settles the record to
// Delivered or Failed.

use log::{debug, error, info};
use tokio::time::{timeout, Duration};
use tokio_util::sync::CancellationToken;

use super::{receipts, ChatEvent, ChatSession, OutgoingMessage, PendingSend};
use crate::error::ChatError;
use crate::models::{Attachment, DeliveryStatus, Message};

/// Bounds on one send's confirmation: attempt count, per-attempt timeout, and
/// the base used for the jittered backoff between attempts.
#[derive(Debug, Clone, Copy)]
pub struct SendPolicy {
    pub max_attempts: u32,
    pub attempt_timeout: Duration,
    pub backoff_base: Duration,
}

impl Default for SendPolicy {
    fn default() -> Self {
        SendPolicy {
            max_attempts: 2,
            attempt_timeout: Duration::from_secs(2),
            backoff_base: Duration::from_millis(500),
        }
    }
}

impl SendPolicy {
    /// Backoff before the attempt after `attempt`, doubled each round with
    /// jitter on top.
    fn backoff(&self, attempt: u32) -> Duration {
        let base_ms = self.backoff_base.as_millis() as u64;
        let jitter = if base_ms > 0 {
            rand::random::<u64>() % base_ms
        } else {
            0
        };
        Duration::from_millis(base_ms * 2u64.pow(attempt) + jitter)
    }
}

impl ChatSession {
    /// Submit a message. The record is appended synchronously in the Sending
    /// state and the id is returned immediately; confirmation runs in the
    /// background. Rejects sends with neither text nor attachments.
    pub async fn send_message(
        &self,
        content: &str,
        attachments: Vec<Attachment>,
    ) -> Result<String, ChatError> {
        let trimmed = content.trim();
        if trimmed.is_empty() && attachments.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let message = Message::outgoing(self.user_id(), self.user_name(), trimmed, attachments);
        let id = message.id.clone();
        let attachments = message.attachments.clone();
        info!("sending message {} to room {}", id, self.room_id());

        let stored = {
            let mut store = self.store.lock().await;
            store.append(message)?;
            store.get(&id).cloned()
        };
        if let Some(message) = stored {
            self.emit(ChatEvent::MessageAppended(message)).await;
        }

        let outgoing = OutgoingMessage {
            conversation_id: self.room_id().to_string(),
            message_id: id.clone(),
            content: trimmed.to_string(),
            attachments,
        };
        let cancel = self.shutdown.child_token();
        self.pending.lock().await.insert(
            id.clone(),
            PendingSend {
                outgoing: outgoing.clone(),
                cancel: cancel.clone(),
            },
        );
        self.spawn_confirmation(outgoing, cancel);
        Ok(id)
    }

    /// Put a failed message back in flight and rerun its confirmation with
    /// the original payload.
    pub async fn retry_message(&self, id: &str) -> Result<(), ChatError> {
        {
            let message = self
                .message(id)
                .await
                .ok_or_else(|| ChatError::UnknownMessage(id.to_string()))?;
            if message.status != DeliveryStatus::Failed {
                return Err(ChatError::InvalidTransition {
                    id: id.to_string(),
                    from: message.status,
                });
            }
        }

        let outgoing = {
            let pending = self.pending.lock().await;
            pending
                .get(id)
                .map(|entry| entry.outgoing.clone())
                .ok_or_else(|| ChatError::UnknownMessage(id.to_string()))?
        };

        self.store.lock().await.mark_sending(id)?;
        info!("retrying message {}", id);
        self.emit(ChatEvent::StatusChanged {
            message_id: id.to_string(),
            status: DeliveryStatus::Sending,
        })
        .await;

        let cancel = self.shutdown.child_token();
        if let Some(entry) = self.pending.lock().await.get_mut(id) {
            entry.cancel = cancel.clone();
        }
        self.spawn_confirmation(outgoing, cancel);
        Ok(())
    }

    /// Drive the transport until the message settles. The task holds clones
    /// of the shared state so a dropped session handle does not strand it;
    /// the cancellation token is what actually stops it.
    fn spawn_confirmation(&self, outgoing: OutgoingMessage, cancel: CancellationToken) {
        let store = self.store.clone();
        let pending = self.pending.clone();
        let event_tx = self.event_tx.clone();
        let transport = self.transport.clone();
        let policy = self.policy;

        tokio::spawn(async move {
            let message_id = outgoing.message_id.clone();
            for attempt in 1..=policy.max_attempts {
                let attempt_result = tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("confirmation for {} cancelled", message_id);
                        return;
                    }
                    result = timeout(policy.attempt_timeout, transport.deliver(&outgoing)) => result,
                };

                match attempt_result {
                    Ok(Ok(receipt)) => {
                        debug!(
                            "message {} confirmed at {}",
                            message_id, receipt.delivered_at
                        );
                        receipts::resolve_delivery(
                            &store,
                            &pending,
                            &event_tx,
                            &message_id,
                            DeliveryStatus::Delivered,
                        )
                        .await;
                        return;
                    }
                    Ok(Err(e)) => {
                        error!(
                            "send attempt {}/{} for {} failed: {}",
                            attempt, policy.max_attempts, message_id, e
                        );
                    }
                    Err(_) => {
                        error!(
                            "send attempt {}/{} for {} timed out",
                            attempt, policy.max_attempts, message_id
                        );
                    }
                }

                if attempt < policy.max_attempts {
                    let backoff = policy.backoff(attempt);
                    info!("retrying message {} in {:?}", message_id, backoff);
                    tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!("confirmation for {} cancelled during backoff", message_id);
                            return;
                        }
                        _ = tokio::time::sleep(backoff) => {}
                    }
                }
            }

            receipts::resolve_delivery(
                &store,
                &pending,
                &event_tx,
                &message_id,
                DeliveryStatus::Failed,
            )
            .await;
        });
    }
}
