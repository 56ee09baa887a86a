// Presentation formatting for the chat screens. Everything in this module is
// a pure function over timestamps and text; screen state such as which
// messages are expanded stays with the caller in `ExpandState`.

use std::borrow::Cow;
use std::collections::HashSet;

use chrono::{DateTime, Datelike, Local, Timelike};

/// Messages longer than this many characters are collapsed behind a
/// "펼치기" toggle.
pub const MESSAGE_COLLAPSE_LIMIT: usize = 300;

/// Read counts and participant counts are capped at this value for display.
pub const COUNT_DISPLAY_CAP: u32 = 300;

/// Room names longer than this are shortened with an ellipsis in the list.
pub const ROOM_NAME_LIMIT: usize = 6;

const WEEKDAYS_KO: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

/// Now-relative day label: "오늘" for the same calendar day, "N일 전" within
/// the same year, and an absolute date once the year differs.
pub fn relative_day_label(date: DateTime<Local>, now: DateTime<Local>) -> String {
    if date.date_naive() == now.date_naive() {
        return "오늘".to_string();
    }
    if date.year() == now.year() {
        let days = (now.date_naive() - date.date_naive()).num_days();
        return format!("{}일 전", days);
    }
    format!("{}년 {}월 {}일", date.year(), date.month(), date.day())
}

/// Label for the date divider between message groups: "오늘", a
/// month/day/weekday form within the current year, or a full date.
pub fn date_divider_label(date: DateTime<Local>, now: DateTime<Local>) -> String {
    if date.date_naive() == now.date_naive() {
        return "오늘".to_string();
    }
    if date.year() == now.year() {
        let weekday = WEEKDAYS_KO[date.weekday().num_days_from_sunday() as usize];
        return format!("{}월 {}일 {}요일", date.month(), date.day(), weekday);
    }
    format!("{}년 {}월 {}일", date.year(), date.month(), date.day())
}

/// 12-hour clock label next to each bubble, e.g. "2:05pm".
pub fn clock_label(date: DateTime<Local>) -> String {
    let (is_pm, hour) = date.hour12();
    let suffix = if is_pm { "pm" } else { "am" };
    format!("{}:{:02}{}", hour, date.minute(), suffix)
}

/// Timestamp column of the chat list: clock time today, "어제" yesterday, a
/// short date within the year, and a two-digit-year date beyond that.
pub fn list_time_label(date: DateTime<Local>, now: DateTime<Local>) -> String {
    let day = date.date_naive();
    let today = now.date_naive();
    if day == today {
        return format!("{:02}:{:02}", date.hour(), date.minute());
    }
    if today.pred_opt() == Some(day) {
        return "어제".to_string();
    }
    if date.year() == now.year() {
        return format!("{}월 {}일", date.month(), date.day());
    }
    format!("{:02}년 {}월 {}일", date.year() % 100, date.month(), date.day())
}

/// Whether a date divider belongs above `curr`: the first message always gets
/// one, after that only when the calendar day changed.
pub fn should_show_divider(curr: DateTime<Local>, prev: Option<DateTime<Local>>) -> bool {
    match prev {
        Some(prev) => curr.date_naive() != prev.date_naive(),
        None => true,
    }
}

/// Collapse text beyond `limit` characters, appending an ellipsis marker.
/// Counts characters rather than bytes so multibyte Hangul is not split.
pub fn truncate(text: &str, limit: usize) -> Cow<'_, str> {
    if !is_expandable(text, limit) {
        return Cow::Borrowed(text);
    }
    let prefix: String = text.chars().take(limit).collect();
    Cow::Owned(format!("{}...", prefix))
}

/// Whether `text` exceeds `limit` and should offer an expand toggle.
pub fn is_expandable(text: &str, limit: usize) -> bool {
    text.chars().count() > limit
}

/// Unread-participant badge in group rooms, capped at "300+".
pub fn read_count_label(count: u32) -> String {
    if count > COUNT_DISPLAY_CAP {
        format!("{}+", COUNT_DISPLAY_CAP)
    } else {
        count.to_string()
    }
}

/// Room name shortened for the chat list.
pub fn room_name_label(name: &str) -> Cow<'_, str> {
    if name.chars().count() > ROOM_NAME_LIMIT {
        let prefix: String = name.chars().take(ROOM_NAME_LIMIT).collect();
        Cow::Owned(format!("{}...", prefix))
    } else {
        Cow::Borrowed(name)
    }
}

/// Participant count line for group rooms, capped the same way as read counts.
pub fn participant_count_label(count: u32) -> String {
    if count > COUNT_DISPLAY_CAP {
        format!("{}+명 참여중", COUNT_DISPLAY_CAP)
    } else {
        format!("{}명 참여중", count)
    }
}

/// Which long messages the viewer has expanded. Held by the screen, keyed by
/// message id; toggling never touches the message records themselves.
#[derive(Debug, Default)]
pub struct ExpandState {
    expanded: HashSet<String>,
}

impl ExpandState {
    pub fn new() -> Self {
        ExpandState::default()
    }

    pub fn is_expanded(&self, message_id: &str) -> bool {
        self.expanded.contains(message_id)
    }

    /// Flip the expand flag for one message, returning the new state.
    pub fn toggle(&mut self, message_id: &str) -> bool {
        if !self.expanded.remove(message_id) {
            self.expanded.insert(message_id.to_string());
            true
        } else {
            false
        }
    }

    /// Text to render for a message body given the current expand state.
    pub fn display_text<'a>(&self, message_id: &str, text: &'a str) -> Cow<'a, str> {
        if self.is_expanded(message_id) {
            Cow::Borrowed(text)
        } else {
            truncate(text, MESSAGE_COLLAPSE_LIMIT)
        }
    }
}
