use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A calendar event as seen by the rest of the crate.
///
/// Values are rebuilt from the event source on every query and never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub calendar_id: String,
    pub calendar_name: String,
    pub is_all_day: bool,
    pub notes: Option<String>,
}

impl Event {
    /// Key that changes whenever anything shown in an event row changes
    pub fn row_id(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.id,
            self.start.timestamp(),
            self.end.timestamp(),
            self.calendar_name,
            self.is_all_day
        )
    }

    /// Whether the event has already ended at `now`
    pub fn is_over(&self, now: DateTime<Utc>) -> bool {
        self.end <= now
    }
}

/// Placeholder used when an event has a blank title
pub fn untitled() -> String {
    t!("untitled_event").to_string()
}

/// Trimmed title, or the placeholder when nothing is left
pub fn display_title(raw: Option<&str>) -> String {
    let trimmed = raw.unwrap_or("").trim();
    if trimmed.is_empty() {
        untitled()
    } else {
        trimmed.to_string()
    }
}

/// Identifier for an entry the source returned without one
pub fn synthesized_id(start: DateTime<Utc>, raw_title: Option<&str>) -> String {
    format!("{}-{}", start.timestamp(), raw_title.unwrap_or("").trim())
}

/// A calendar new events can be written to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarListItem {
    pub id: String,
    pub title: String,
}

/// User input for creating or editing an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub calendar_id: Option<String>,
    pub notes: Option<String>,
}
