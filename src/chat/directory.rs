// Room directory backing the chat-list screen: category tabs, recency
// ordering, unread flags, and keyword search with a short recent-search list.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use log::debug;

use crate::error::ChatError;
use crate::models::{RoomKind, RoomSummary};

/// How many recent search keywords are kept.
const RECENT_SEARCH_LIMIT: usize = 5;

#[derive(Default)]
pub struct ConversationDirectory {
    rooms: Vec<RoomSummary>,
    recent_searches: VecDeque<String>,
}

impl ConversationDirectory {
    pub fn new() -> Self {
        ConversationDirectory::default()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, room_id: &str) -> Option<&RoomSummary> {
        self.rooms.iter().find(|room| room.id == room_id)
    }

    /// Add a room, or replace the stored summary when the id already exists.
    pub fn upsert(&mut self, summary: RoomSummary) {
        match self.rooms.iter_mut().find(|room| room.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.rooms.push(summary),
        }
    }

    /// A message landed in a room: refresh its preview line and stamp, and
    /// flag it unread unless the viewer currently has the room open.
    pub fn record_message(
        &mut self,
        room_id: &str,
        preview: &str,
        at: DateTime<Utc>,
        viewer_active: bool,
    ) -> Result<(), ChatError> {
        let room = self.get_mut(room_id)?;
        room.last_message = preview.to_string();
        room.last_message_at = at;
        if !viewer_active {
            room.has_unread = true;
        }
        Ok(())
    }

    pub fn mark_read(&mut self, room_id: &str) -> Result<(), ChatError> {
        self.get_mut(room_id)?.has_unread = false;
        Ok(())
    }

    pub fn set_muted(&mut self, room_id: &str, muted: bool) -> Result<(), ChatError> {
        self.get_mut(room_id)?.muted = muted;
        Ok(())
    }

    /// Rooms in one chat-list tab, newest activity first.
    pub fn rooms_by_kind(&self, kind: RoomKind) -> Vec<&RoomSummary> {
        let mut rooms: Vec<&RoomSummary> = self
            .rooms
            .iter()
            .filter(|room| room.kind == kind)
            .collect();
        rooms.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        rooms
    }

    /// Case-insensitive keyword search over room names and tags. An empty
    /// keyword matches nothing and is not recorded.
    pub fn search(&mut self, keyword: &str) -> Vec<&RoomSummary> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            debug!("ignoring empty room search");
            return Vec::new();
        }
        self.record_search(keyword);
        let needle = keyword.to_lowercase();
        self.rooms
            .iter()
            .filter(|room| {
                room.name.to_lowercase().contains(&needle)
                    || room
                        .tag
                        .as_deref()
                        .map(|tag| tag.to_lowercase().contains(&needle))
                        .unwrap_or(false)
            })
            .collect()
    }

    /// Most recent search keywords, newest first.
    pub fn recent_searches(&self) -> impl Iterator<Item = &str> {
        self.recent_searches.iter().map(String::as_str)
    }

    fn record_search(&mut self, keyword: &str) {
        self.recent_searches.retain(|entry| entry != keyword);
        self.recent_searches.push_front(keyword.to_string());
        self.recent_searches.truncate(RECENT_SEARCH_LIMIT);
    }

    fn get_mut(&mut self, room_id: &str) -> Result<&mut RoomSummary, ChatError> {
        self.rooms
            .iter_mut()
            .find(|room| room.id == room_id)
            .ok_or_else(|| ChatError::UnknownRoom(room_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn directory_with_rooms() -> ConversationDirectory {
        let now = Utc::now();
        let mut directory = ConversationDirectory::new();

        let mut personal = RoomSummary::new("1", "김개발", RoomKind::Personal);
        personal.last_message = "안녕하세요! 면접 관련해서 질문이 있어요.".to_string();
        personal.last_message_at = now - Duration::minutes(30);
        directory.upsert(personal);

        let mut study = RoomSummary::new("7", "프론트엔드 면접 스터디", RoomKind::Group)
            .with_tag("면접")
            .with_participants(150);
        study.last_message_at = now - Duration::minutes(10);
        directory.upsert(study);

        let mut review = RoomSummary::new("8", "이력서 첨삭방", RoomKind::Group)
            .with_tag("이력서")
            .with_participants(320);
        review.last_message_at = now - Duration::hours(3);
        directory.upsert(review);

        directory
    }

    #[test]
    fn rooms_filter_by_kind_and_sort_by_recency() {
        let directory = directory_with_rooms();
        let groups = directory.rooms_by_kind(RoomKind::Group);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id, "7");
        assert_eq!(groups[1].id, "8");
        assert_eq!(directory.rooms_by_kind(RoomKind::Popular).len(), 0);
    }

    #[test]
    fn record_message_bumps_unread_only_when_inactive() {
        let mut directory = directory_with_rooms();
        let at = Utc::now();

        directory.record_message("1", "코딩테스트 같이 준비해요!", at, true).unwrap();
        assert!(!directory.get("1").unwrap().has_unread);

        directory.record_message("1", "포트폴리오 피드백 감사합니다.", at, false).unwrap();
        let room = directory.get("1").unwrap();
        assert!(room.has_unread);
        assert_eq!(room.last_message, "포트폴리오 피드백 감사합니다.");

        directory.mark_read("1").unwrap();
        assert!(!directory.get("1").unwrap().has_unread);

        assert!(matches!(
            directory.record_message("999", "x", at, false),
            Err(ChatError::UnknownRoom(_))
        ));
    }

    #[test]
    fn search_matches_names_and_tags_case_insensitively() {
        let mut directory = directory_with_rooms();
        let hits = directory.search("면접");
        assert_eq!(hits.len(), 2); // name match and tag match

        let hits = directory.search("이력서");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "8");

        assert!(directory.search("   ").is_empty());
    }

    #[test]
    fn recent_searches_dedupe_and_cap() {
        let mut directory = directory_with_rooms();
        for keyword in ["프론트엔드", "면접", "코딩테스트", "면접"] {
            directory.search(keyword);
        }
        let recent: Vec<&str> = directory.recent_searches().collect();
        assert_eq!(recent, vec!["면접", "코딩테스트", "프론트엔드"]);

        for keyword in ["a", "b", "c", "d", "e", "f"] {
            directory.search(keyword);
        }
        assert_eq!(directory.recent_searches().count(), 5);
    }

    #[test]
    fn muted_flag_round_trips() {
        let mut directory = directory_with_rooms();
        directory.set_muted("8", true).unwrap();
        assert!(directory.get("8").unwrap().muted);
        directory.set_muted("8", false).unwrap();
        assert!(!directory.get("8").unwrap().muted);
    }
}
