use crate::components::calendar::{CalendarListItem, Event};
use crate::components::live_activity::VisibilityWindow;
use crate::config::Config;
use crate::error::PulseResult;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::{BTreeSet, HashSet};

/// Calendar permission as last observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionState {
    Unknown,
    Granted,
    Denied,
    Failed(String),
}

/// Status line shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    PermissionNeeded,
    PermissionAlreadyGranted,
    PermissionGranted,
    PermissionDenied,
    PermissionRequestFailed(String),
    PermissionRequired,
    NoUpcomingEvent,
    NextEvent,
    SaveFailed(String),
    UpdateFailed(String),
    DeleteFailed(String),
    EventDeleted,
    RefreshFailed(String),
}

impl Status {
    /// Localized text for the current locale
    pub fn message(&self) -> String {
        match self {
            Status::PermissionNeeded => t!("status_permission_needed").to_string(),
            Status::PermissionAlreadyGranted => t!("status_permission_already_granted").to_string(),
            Status::PermissionGranted => t!("status_permission_granted").to_string(),
            Status::PermissionDenied => t!("status_permission_denied").to_string(),
            Status::PermissionRequestFailed(error) => {
                t!("status_permission_request_failed", error = error.as_str()).to_string()
            }
            Status::PermissionRequired => t!("status_permission_required").to_string(),
            Status::NoUpcomingEvent => t!("status_no_upcoming_event").to_string(),
            Status::NextEvent => t!("status_next_event").to_string(),
            Status::SaveFailed(error) => t!("status_save_failed", error = error.as_str()).to_string(),
            Status::UpdateFailed(error) => t!("status_update_failed", error = error.as_str()).to_string(),
            Status::DeleteFailed(error) => t!("status_delete_failed", error = error.as_str()).to_string(),
            Status::EventDeleted => t!("status_event_deleted").to_string(),
            Status::RefreshFailed(error) => t!("status_refresh_failed", error = error.as_str()).to_string(),
        }
    }
}

/// Windows and cadences the refreshes work with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSettings {
    pub tz: Tz,
    pub next_event_window_hours: i64,
    pub live_activity_lookback_hours: i64,
    pub visibility: VisibilityWindow,
    pub reminder_minutes_before: i64,
    pub upcoming_days: i64,
    pub marker_past_days: i64,
    pub marker_future_days: i64,
    pub full_refresh_every_ticks: u32,
    pub debounce: Duration,
    pub refresh_interval: std::time::Duration,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            tz: Tz::UTC,
            next_event_window_hours: 24,
            live_activity_lookback_hours: 6,
            visibility: VisibilityWindow::default(),
            reminder_minutes_before: 120,
            upcoming_days: 30,
            marker_past_days: 365,
            marker_future_days: 365,
            full_refresh_every_ticks: 3,
            debounce: Duration::milliseconds(800),
            refresh_interval: std::time::Duration::from_secs(180),
        }
    }
}

impl RefreshSettings {
    pub fn from_config(config: &Config) -> PulseResult<Self> {
        Ok(Self {
            tz: config.tz()?,
            next_event_window_hours: config.next_event_window_hours,
            live_activity_lookback_hours: config.live_activity_lookback_hours,
            visibility: VisibilityWindow::from_config(config),
            reminder_minutes_before: config.reminder_minutes_before,
            upcoming_days: config.upcoming_days,
            marker_past_days: config.marker_past_days,
            marker_future_days: config.marker_future_days,
            full_refresh_every_ticks: config.full_refresh_every_ticks,
            debounce: config.debounce(),
            refresh_interval: config.refresh_interval(),
        })
    }
}

/// Everything the presentation layer renders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseState {
    pub permission: PermissionState,
    pub status: Status,
    pub next_event: Option<Event>,
    pub selected_date: NaiveDate,
    pub day_events: Vec<Event>,
    /// Important events in the upcoming window
    pub important_upcoming: Vec<Event>,
    /// Local days carrying at least one event, for calendar markers
    pub event_days: BTreeSet<NaiveDate>,
    pub calendars: Vec<CalendarListItem>,
    pub important_ids: HashSet<String>,
    pub did_request_initial_permission: bool,
    pub refresh_tick: u32,
    pub auto_refresh: bool,
    pub observing: bool,
    pub last_store_change: Option<DateTime<Utc>>,
    pub settings: RefreshSettings,
}

impl PulseState {
    pub fn new(
        settings: RefreshSettings,
        has_read_access: bool,
        important_ids: HashSet<String>,
        today: NaiveDate,
    ) -> Self {
        let (permission, status) = if has_read_access {
            (PermissionState::Granted, Status::PermissionAlreadyGranted)
        } else {
            (PermissionState::Unknown, Status::PermissionNeeded)
        };

        Self {
            permission,
            status,
            next_event: None,
            selected_date: today,
            day_events: Vec::new(),
            important_upcoming: Vec::new(),
            event_days: BTreeSet::new(),
            calendars: Vec::new(),
            important_ids,
            did_request_initial_permission: false,
            refresh_tick: 0,
            auto_refresh: false,
            observing: false,
            last_store_change: None,
            settings,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.permission == PermissionState::Granted
    }

    pub fn is_important(&self, event: &Event) -> bool {
        self.important_ids.contains(&event.id)
    }

    pub fn has_event_on(&self, date: NaiveDate) -> bool {
        self.event_days.contains(&date)
    }

    pub fn status_message(&self) -> String {
        self.status.message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_follows_access() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let granted = PulseState::new(RefreshSettings::default(), true, HashSet::new(), today);
        assert!(granted.is_granted());
        assert_eq!(granted.status, Status::PermissionAlreadyGranted);

        let unknown = PulseState::new(RefreshSettings::default(), false, HashSet::new(), today);
        assert_eq!(unknown.permission, PermissionState::Unknown);
        assert_eq!(unknown.status, Status::PermissionNeeded);
        assert_eq!(unknown.selected_date, today);
    }

    #[test]
    fn status_messages_interpolate_errors() {
        rust_i18n::set_locale("en");
        assert_eq!(
            Status::SaveFailed("disk full".into()).message(),
            "Could not save event: disk full"
        );
        assert_eq!(Status::NoUpcomingEvent.message(), "No events in the next 24 hours");
    }

    #[test]
    fn settings_follow_config() {
        let config = Config {
            timezone: "Asia/Seoul".into(),
            important_lead_minutes: 90,
            store_change_debounce_ms: 1500,
            ..Config::default()
        };
        let settings = RefreshSettings::from_config(&config).unwrap();
        assert_eq!(settings.tz, chrono_tz::Asia::Seoul);
        assert_eq!(settings.visibility.important_lead, Duration::minutes(90));
        assert_eq!(settings.debounce, Duration::milliseconds(1500));
        assert_eq!(settings.refresh_interval, std::time::Duration::from_secs(180));
    }
}
