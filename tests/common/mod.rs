#![allow(dead_code)]

use async_trait::async_trait;
use calendar_pulse::components::calendar::memory::{
    AccessState, MemoryEventStore, StoreData, StoredCalendar, StoredEvent,
};
use calendar_pulse::components::calendar::Event;
use calendar_pulse::components::important::ImportantEventStore;
use calendar_pulse::components::live_activity::MemoryActivityService;
use calendar_pulse::components::pulse::PulseServices;
use calendar_pulse::components::reminders::ReminderScheduler;
use calendar_pulse::error::{reminder_error, PulseResult};
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

/// A reminder scheduler call, as recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderCall {
    Schedule { event_id: String, minutes_before: i64 },
    ClearAll,
}

/// Mock reminder scheduler recording every call
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    calls: Mutex<Vec<ReminderCall>>,
    failing: Mutex<bool>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ReminderCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn record(&self, call: ReminderCall) -> PulseResult<()> {
        if *self.failing.lock().unwrap() {
            return Err(reminder_error("scheduler unavailable"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl ReminderScheduler for RecordingScheduler {
    async fn request_access(&self) -> PulseResult<bool> {
        Ok(true)
    }

    async fn schedule_reminders(&self, event: &Event, minutes_before: i64) -> PulseResult<()> {
        self.record(ReminderCall::Schedule {
            event_id: event.id.clone(),
            minutes_before,
        })
    }

    async fn clear_all_event_reminders(&self) -> PulseResult<()> {
        self.record(ReminderCall::ClearAll)
    }
}

pub fn work_calendar() -> StoredCalendar {
    StoredCalendar {
        id: "work".to_string(),
        title: "Work".to_string(),
        writable: true,
    }
}

/// A timed entry starting `minutes` from `now`, lasting an hour
pub fn timed(id: &str, title: &str, now: DateTime<Utc>, minutes: i64) -> StoredEvent {
    let start = now + Duration::minutes(minutes);
    StoredEvent {
        id: id.to_string(),
        title: Some(title.to_string()),
        start,
        end: start + Duration::hours(1),
        calendar_id: "work".to_string(),
        is_all_day: false,
        notes: None,
    }
}

pub fn store_with(events: Vec<StoredEvent>) -> MemoryEventStore {
    MemoryEventStore::with_data(
        StoreData {
            calendars: vec![work_calendar()],
            events,
            default_calendar: Some("work".to_string()),
        },
        chrono_tz::UTC,
    )
}

/// Services over in-memory fakes, with handles kept for assertions
pub struct Fixture {
    pub events: Arc<MemoryEventStore>,
    pub flags: Arc<ImportantEventStore>,
    pub activities: Arc<MemoryActivityService>,
    pub reminders: Arc<RecordingScheduler>,
}

impl Fixture {
    pub fn new(events: Vec<StoredEvent>) -> Self {
        Self::with_store(store_with(events))
    }

    /// Store that has never been asked for access
    pub fn undetermined(events: Vec<StoredEvent>, grant: bool) -> Self {
        Self::with_store(store_with(events).with_access(AccessState::NotDetermined, grant))
    }

    pub fn with_store(store: MemoryEventStore) -> Self {
        Self {
            events: Arc::new(store),
            flags: Arc::new(ImportantEventStore::in_memory()),
            activities: Arc::new(MemoryActivityService::default()),
            reminders: Arc::new(RecordingScheduler::new()),
        }
    }

    pub fn services(&self) -> PulseServices {
        PulseServices {
            events: self.events.clone(),
            flags: self.flags.clone(),
            activities: self.activities.clone(),
            reminders: self.reminders.clone(),
        }
    }
}
