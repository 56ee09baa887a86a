// Re-export needed modules for testing
pub mod chat;
pub mod error;
pub mod format;
pub mod models;
pub mod profile;

// Re-export main types for convenience
pub use chat::{ChatEvent, ChatSession, ConversationDirectory, TypingStatus};
pub use error::ChatError;
pub use models::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation_and_delivery_status() {
        let msg = Message::outgoing("user1", "나", "메세지 텍스트가 입력됩니다", Vec::new());

        // Verify message properties
        assert_eq!(msg.sender_id, "user1");
        assert_eq!(msg.sender_name, "나");
        assert_eq!(msg.content, "메세지 텍스트가 입력됩니다");
        assert_eq!(msg.status, DeliveryStatus::Sending);
        assert!(!msg.deleted);
        assert!(msg.attachments.is_empty());
        assert_eq!(msg.read_count, None);

        // Incoming messages arrive already confirmed
        let incoming = Message::incoming("user2", "유저 닉네임", "안녕하세요", Vec::new());
        assert_eq!(incoming.status, DeliveryStatus::Delivered);

        // Ids are unique per message
        assert_ne!(msg.id, incoming.id);
    }

    #[test]
    fn test_attachment_variants() {
        let image = Attachment::Image {
            url: "/images/sample1.jpg".to_string(),
        };
        let file = Attachment::File {
            name: "이력서.pdf".to_string(),
            size: 2 * 1024 * 1024,
        };

        match &image {
            Attachment::Image { url } => assert_eq!(url, "/images/sample1.jpg"),
            _ => panic!("Expected an image attachment"),
        }

        match &file {
            Attachment::File { name, size } => {
                assert_eq!(name, "이력서.pdf");
                assert_eq!(*size, 2 * 1024 * 1024);
            }
            _ => panic!("Expected a file attachment"),
        }

        // Attachments serialize with a kind tag
        let json = serde_json::to_string(&image).expect("serialize");
        assert!(json.contains("\"kind\":\"image\""));
    }

    #[test]
    fn test_room_summary_builders() {
        let room = RoomSummary::new("7", "프론트엔드 면접 스터디", RoomKind::Group)
            .with_tag("면접")
            .with_participants(150);

        assert_eq!(room.kind, RoomKind::Group);
        assert_eq!(room.tag.as_deref(), Some("면접"));
        assert_eq!(room.participant_count, Some(150));
        assert!(!room.has_unread);
        assert!(!room.muted);
    }
}
