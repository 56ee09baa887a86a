// Typing-state notifications, shown as the "입력 중" indicator row under the
// newest message.

use super::ChatSession;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypingStatus {
    Active,    // Participating in the chat
    Composing, // Writing a message right now
    Paused,    // Started writing but stopped
    Inactive,  // Not active recently
    Gone,      // Left the conversation
}

impl TypingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypingStatus::Active => "active",
            TypingStatus::Composing => "composing",
            TypingStatus::Paused => "paused",
            TypingStatus::Inactive => "inactive",
            TypingStatus::Gone => "gone",
        }
    }

    pub fn parse(value: &str) -> Option<TypingStatus> {
        match value {
            "active" => Some(TypingStatus::Active),
            "composing" => Some(TypingStatus::Composing),
            "paused" => Some(TypingStatus::Paused),
            "inactive" => Some(TypingStatus::Inactive),
            "gone" => Some(TypingStatus::Gone),
            _ => None,
        }
    }

    /// Whether the indicator row should be visible for this state.
    pub fn is_typing(&self) -> bool {
        matches!(self, TypingStatus::Composing)
    }
}

impl ChatSession {
    /// Announce the local user's typing state.
    pub fn set_typing(&self, status: TypingStatus) {
        let user_id = self.user_id().to_string();
        self.notify_typing(&user_id, status);
    }
}
