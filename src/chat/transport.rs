// Transport seam for the send pipeline. The conversation engine only ever
// awaits `deliver`; what sits behind it (a real backend, or the simulated one
// below) is the caller's choice.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use tokio::time::Duration;

use crate::error::ChatError;
use crate::models::Attachment;

/// Payload handed to the transport for one send attempt. This is the shape a
/// conversation-send endpoint would accept.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub conversation_id: String,
    pub message_id: String,
    pub content: String,
    pub attachments: Vec<Attachment>,
}

/// Confirmation returned by a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub message_id: String,
    pub delivered_at: DateTime<Utc>,
}

#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Deliver one message and wait for the confirmation. An `Err` means this
    /// attempt failed; the pipeline decides whether to retry.
    async fn deliver(&self, outgoing: &OutgoingMessage) -> Result<DeliveryReceipt, ChatError>;
}

/// Stand-in for the network round trip: sleeps for a configurable latency
/// (plus jitter) and fails a configurable fraction of deliveries.
pub struct SimulatedTransport {
    latency: Duration,
    jitter: Duration,
    failure_rate: f64,
}

impl SimulatedTransport {
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        SimulatedTransport {
            latency,
            jitter: latency / 2,
            failure_rate: failure_rate.clamp(0.0, 1.0),
        }
    }

    /// A transport that confirms instantly and never fails. Handy in tests.
    pub fn instant() -> Self {
        SimulatedTransport::new(Duration::from_millis(0), 0.0)
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }
}

#[async_trait]
impl MessageTransport for SimulatedTransport {
    async fn deliver(&self, outgoing: &OutgoingMessage) -> Result<DeliveryReceipt, ChatError> {
        let mut wait = self.latency;
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms > 0 {
            wait += Duration::from_millis(rand::random::<u64>() % jitter_ms);
        }
        debug!(
            "simulated delivery of {} to room {} in {:?}",
            outgoing.message_id, outgoing.conversation_id, wait
        );
        tokio::time::sleep(wait).await;

        if self.failure_rate > 0.0 && rand::random::<f64>() < self.failure_rate {
            debug!("simulated delivery failure for {}", outgoing.message_id);
            return Err(ChatError::DeliveryFailed {
                id: outgoing.message_id.clone(),
            });
        }

        Ok(DeliveryReceipt {
            message_id: outgoing.message_id.clone(),
            delivered_at: Utc::now(),
        })
    }
}
