// Common test utilities for integration tests
// This module contains shared code for all integration tests

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::LevelFilter;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

use devths_chat::chat::{
    ChatSession, DeliveryReceipt, MessageTransport, OutgoingMessage, SendPolicy,
};
use devths_chat::{ChatError, ChatEvent};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

/// One scripted delivery outcome.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Deliver(Duration),
    Fail(Duration),
}

/// Transport that plays back scripted outcomes per message content, one per
/// delivery attempt. Content without a script (or with an exhausted one)
/// delivers instantly, so tests only script what they care about.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        ScriptedTransport::default()
    }

    pub fn script(self, content: &str, outcomes: Vec<Outcome>) -> Self {
        self.scripts
            .lock()
            .expect("script lock")
            .insert(content.to_string(), outcomes.into());
        self
    }
}

#[async_trait]
impl MessageTransport for ScriptedTransport {
    async fn deliver(&self, outgoing: &OutgoingMessage) -> Result<DeliveryReceipt, ChatError> {
        let outcome = {
            let mut scripts = self.scripts.lock().expect("script lock");
            scripts
                .get_mut(&outgoing.content)
                .and_then(|queue| queue.pop_front())
        };
        let outcome = outcome.unwrap_or(Outcome::Deliver(Duration::from_millis(0)));
        match outcome {
            Outcome::Deliver(delay) => {
                tokio::time::sleep(delay).await;
                Ok(DeliveryReceipt {
                    message_id: outgoing.message_id.clone(),
                    delivered_at: chrono::Utc::now(),
                })
            }
            Outcome::Fail(delay) => {
                tokio::time::sleep(delay).await;
                Err(ChatError::DeliveryFailed {
                    id: outgoing.message_id.clone(),
                })
            }
        }
    }
}

/// Single-attempt policy with short timeouts so failures settle fast.
pub fn fast_policy() -> SendPolicy {
    SendPolicy {
        max_attempts: 1,
        attempt_timeout: Duration::from_secs(1),
        backoff_base: Duration::from_millis(10),
    }
}

/// Session over a scripted transport, as `user1`/나 in a fixed test room.
pub fn new_test_session(
    transport: ScriptedTransport,
) -> (ChatSession, mpsc::Receiver<ChatEvent>) {
    setup_logging();
    ChatSession::with_policy("room1", "user1", "나", Arc::new(transport), fast_policy())
}

/// Wait for an event matching the predicate, with a timeout in seconds.
/// Non-matching events are consumed and dropped.
pub async fn wait_for_event<F>(
    rx: &mut mpsc::Receiver<ChatEvent>,
    mut predicate: F,
    secs: u64,
) -> Result<ChatEvent>
where
    F: FnMut(&ChatEvent) -> bool,
{
    timeout(Duration::from_secs(secs), async {
        while let Some(event) = rx.recv().await {
            if predicate(&event) {
                return Ok(event);
            }
        }
        Err(anyhow!("event channel closed"))
    })
    .await
    .map_err(|_| anyhow!("timed out waiting for event"))?
}

/// True when the event is a status change for `message_id` to `status`.
pub fn is_status_change(
    event: &ChatEvent,
    message_id: &str,
    status: devths_chat::DeliveryStatus,
) -> bool {
    matches!(
        event,
        ChatEvent::StatusChanged {
            message_id: id,
            status: s,
        } if id.as_str() == message_id && *s == status
    )
}
