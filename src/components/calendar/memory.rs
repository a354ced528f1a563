//! An in-process calendar store
//!
//! Behaves like the system store the app talks to on a phone: it owns calendars
//! and raw entries, normalizes them into [`Event`]s on every read, applies the
//! all-day and end-time rules on writes, and broadcasts a change signal after
//! every mutation.

use super::models::{display_title, synthesized_id, CalendarListItem, Event, EventDraft};
use super::source::EventSource;
use crate::error::{event_store_error, not_found, PulseResult};
use crate::utils::time::{local_date, start_of_day, DateWindow};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

/// Authorization state of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessState {
    /// Never asked; a request resolves to `grant_on_request`
    NotDetermined,
    Granted,
    Denied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCalendar {
    pub id: String,
    pub title: String,
    #[serde(default = "default_writable")]
    pub writable: bool,
}

fn default_writable() -> bool {
    true
}

/// A raw entry; `id` may be empty and `title` blank, like the platform store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    #[serde(default)]
    pub id: String,
    pub title: Option<String>,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub calendar_id: String,
    #[serde(default)]
    pub is_all_day: bool,
    pub notes: Option<String>,
}

/// Seed file layout
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoreData {
    #[serde(default)]
    pub calendars: Vec<StoredCalendar>,
    #[serde(default)]
    pub events: Vec<StoredEvent>,
    /// Calendar used for new events when none is chosen
    pub default_calendar: Option<String>,
}

pub struct MemoryEventStore {
    data: RwLock<StoreData>,
    access: Mutex<AccessState>,
    grant_on_request: bool,
    tz: Tz,
    changes: broadcast::Sender<()>,
}

impl MemoryEventStore {
    /// An empty store with access already granted
    pub fn new(tz: Tz) -> Self {
        Self::with_data(StoreData::default(), tz)
    }

    pub fn with_data(data: StoreData, tz: Tz) -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            data: RwLock::new(data),
            access: Mutex::new(AccessState::Granted),
            grant_on_request: true,
            tz,
            changes,
        }
    }

    /// Load a seed file in the [`StoreData`] layout
    pub fn from_file(path: &Path, tz: Tz) -> PulseResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let data: StoreData = serde_json::from_str(&content)?;
        info!(
            "Loaded {} calendars and {} events from {}",
            data.calendars.len(),
            data.events.len(),
            path.display()
        );
        Ok(Self::with_data(data, tz))
    }

    /// Start in `access`; requests will resolve to `grant_on_request`
    pub fn with_access(mut self, access: AccessState, grant_on_request: bool) -> Self {
        self.access = Mutex::new(access);
        self.grant_on_request = grant_on_request;
        self
    }

    pub fn access_state(&self) -> AccessState {
        match self.access.lock() {
            Ok(access) => *access,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    fn set_access(&self, state: AccessState) {
        match self.access.lock() {
            Ok(mut access) => *access = state,
            Err(poisoned) => *poisoned.into_inner() = state,
        }
    }

    pub async fn add_calendar(&self, calendar: StoredCalendar) {
        self.data.write().await.calendars.push(calendar);
        self.notify();
    }

    /// Insert a raw entry as-is, bypassing the draft rules
    pub async fn insert_raw(&self, event: StoredEvent) {
        self.data.write().await.events.push(event);
        self.notify();
    }

    fn notify(&self) {
        // No receivers is fine: nobody observes the store yet
        let _ = self.changes.send(());
    }

    fn to_event(data: &StoreData, raw: &StoredEvent) -> Event {
        let calendar_name = data
            .calendars
            .iter()
            .find(|c| c.id == raw.calendar_id)
            .map(|c| c.title.clone())
            .unwrap_or_default();
        let id = if raw.id.is_empty() {
            synthesized_id(raw.start, raw.title.as_deref())
        } else {
            raw.id.clone()
        };

        Event {
            id,
            title: display_title(raw.title.as_deref()),
            start: raw.start,
            end: raw.end,
            calendar_id: raw.calendar_id.clone(),
            calendar_name,
            is_all_day: raw.is_all_day,
            notes: raw.notes.clone(),
        }
    }

    /// Resolve start/end/all-day of a draft the way the platform store does
    fn apply_times(&self, draft: &EventDraft) -> PulseResult<(DateTime<Utc>, DateTime<Utc>)> {
        if draft.is_all_day {
            let day = local_date(draft.start, self.tz);
            let next = day
                .succ_opt()
                .ok_or_else(|| event_store_error("Date out of range"))?;
            Ok((start_of_day(day, self.tz)?, start_of_day(next, self.tz)?))
        } else if draft.end > draft.start {
            Ok((draft.start, draft.end))
        } else {
            Ok((draft.start, draft.start + Duration::hours(1)))
        }
    }

    fn writable_calendar<'a>(data: &'a StoreData, id: Option<&str>) -> Option<&'a StoredCalendar> {
        let id = id?;
        data.calendars.iter().find(|c| c.id == id && c.writable)
    }

    fn default_calendar(data: &StoreData) -> Option<&StoredCalendar> {
        data.default_calendar
            .as_deref()
            .and_then(|id| data.calendars.iter().find(|c| c.id == id))
            .or_else(|| data.calendars.first())
    }

    fn stored_title(title: &str) -> Option<String> {
        if title.trim().is_empty() {
            Some(super::models::untitled())
        } else {
            Some(title.to_string())
        }
    }
}

#[async_trait]
impl EventSource for MemoryEventStore {
    fn has_read_access(&self) -> bool {
        self.access_state() == AccessState::Granted
    }

    async fn request_access(&self) -> PulseResult<bool> {
        let state = match self.access_state() {
            AccessState::NotDetermined if self.grant_on_request => AccessState::Granted,
            AccessState::NotDetermined => AccessState::Denied,
            other => other,
        };
        self.set_access(state);
        Ok(state == AccessState::Granted)
    }

    async fn fetch_events(&self, window: &DateWindow) -> PulseResult<Vec<Event>> {
        let data = self.data.read().await;
        let mut events: Vec<Event> = data
            .events
            .iter()
            .filter(|raw| window.overlaps(raw.start, raw.end))
            .map(|raw| Self::to_event(&data, raw))
            .collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        let mut seen = HashSet::new();
        events.retain(|event| seen.insert(event.id.clone()));
        Ok(events)
    }

    async fn fetch_writable_calendars(&self) -> PulseResult<Vec<CalendarListItem>> {
        let data = self.data.read().await;
        let mut calendars: Vec<CalendarListItem> = data
            .calendars
            .iter()
            .filter(|c| c.writable)
            .map(|c| CalendarListItem {
                id: c.id.clone(),
                title: c.title.clone(),
            })
            .collect();
        calendars.sort_by_key(|c| c.title.to_lowercase());
        Ok(calendars)
    }

    async fn create_event(&self, draft: EventDraft) -> PulseResult<Event> {
        let (start, end) = self.apply_times(&draft)?;
        let mut data = self.data.write().await;

        let calendar_id = match Self::writable_calendar(&data, draft.calendar_id.as_deref())
            .or_else(|| Self::default_calendar(&data))
        {
            Some(calendar) => calendar.id.clone(),
            None => return Err(event_store_error("No calendar available for new events")),
        };

        let raw = StoredEvent {
            id: uuid::Uuid::new_v4().to_string(),
            title: Self::stored_title(&draft.title),
            start,
            end,
            calendar_id,
            is_all_day: draft.is_all_day,
            notes: draft.notes,
        };
        let event = Self::to_event(&data, &raw);
        data.events.push(raw);
        drop(data);

        debug!("Created event {}", event.id);
        self.notify();
        Ok(event)
    }

    async fn update_event(&self, id: &str, draft: EventDraft) -> PulseResult<Event> {
        let (start, end) = self.apply_times(&draft)?;
        let mut data = self.data.write().await;

        let calendar_id = Self::writable_calendar(&data, draft.calendar_id.as_deref())
            .map(|c| c.id.clone());
        let index = data
            .events
            .iter()
            .position(|raw| !raw.id.is_empty() && raw.id == id)
            .ok_or_else(|| not_found(id))?;

        let raw = &mut data.events[index];
        raw.title = Self::stored_title(&draft.title);
        raw.start = start;
        raw.end = end;
        raw.is_all_day = draft.is_all_day;
        raw.notes = draft.notes;
        if let Some(calendar_id) = calendar_id {
            raw.calendar_id = calendar_id;
        }

        let event = Self::to_event(&data, &data.events[index]);
        drop(data);

        debug!("Updated event {}", event.id);
        self.notify();
        Ok(event)
    }

    async fn delete_event(&self, id: &str) -> PulseResult<()> {
        let mut data = self.data.write().await;
        let index = data
            .events
            .iter()
            .position(|raw| !raw.id.is_empty() && raw.id == id)
            .ok_or_else(|| not_found(id))?;
        data.events.remove(index);
        drop(data);

        debug!("Deleted event {}", id);
        self.notify();
        Ok(())
    }

    fn subscribe_changes(&self) -> broadcast::Receiver<()> {
        self.changes.subscribe()
    }
}
