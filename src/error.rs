use thiserror::Error;

use crate::models::DeliveryStatus;

/// Errors surfaced by the conversation engine. Everything here is handled
/// locally by the caller (disable a button, flip a message status); nothing is
/// fatal to the session.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Send was attempted with no text and no attachments.
    #[error("message has no content or attachments")]
    EmptyMessage,

    /// A delete was attempted by someone other than the sender.
    #[error("only the sender may delete a message")]
    PermissionDenied,

    /// The transport could not confirm the message. Recoverable through
    /// retry or discard.
    #[error("delivery failed for message {id}")]
    DeliveryFailed { id: String },

    #[error("unknown message id: {0}")]
    UnknownMessage(String),

    #[error("unknown room id: {0}")]
    UnknownRoom(String),

    #[error("duplicate message id: {0}")]
    DuplicateMessage(String),

    /// The requested operation is not legal from the message's current state,
    /// e.g. retrying a delivered message or discarding one that never failed.
    #[error("invalid transition from {from:?} for message {id}")]
    InvalidTransition { id: String, from: DeliveryStatus },

    /// Anything the transport reports that does not match a known kind.
    #[error("unknown send failure: {0}")]
    Unknown(String),
}
