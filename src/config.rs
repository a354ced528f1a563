use crate::error::{config_error, env_error, PulseResult};
use chrono::Duration;
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Default location of the optional configuration file
pub const CONFIG_FILE: &str = "config/pulse.toml";

const MAX_WINDOW_HOURS: i64 = 24 * 366;
const MAX_WINDOW_DAYS: i64 = 3660;
const MAX_LEAD_MINUTES: i64 = 7 * 24 * 60;
const MAX_REFRESH_INTERVAL_SECS: u64 = 24 * 60 * 60;
const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Fail unless `value` lies in `0..=max`
fn check_range<T>(name: &str, value: T, max: T) -> PulseResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value < T::default() || value > max {
        return Err(config_error(&format!(
            "{} must be between 0 and {}, got {}",
            name, max, value
        )));
    }
    Ok(())
}

/// Main configuration structure for the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timezone used for day boundaries and all-day events
    pub timezone: String,
    /// Locale for status and reminder texts
    pub locale: String,
    /// Seconds between two periodic refreshes
    pub refresh_interval_secs: u64,
    /// Minimum milliseconds between two handled store-change notifications
    pub store_change_debounce_ms: u64,
    /// Every n-th timer tick also refreshes the day, important and marker lists
    pub full_refresh_every_ticks: u32,
    /// How far ahead the next event is searched
    pub next_event_window_hours: i64,
    /// How far back live activity candidates are searched
    pub live_activity_lookback_hours: i64,
    /// Lead time before an important event becomes live
    pub important_lead_minutes: i64,
    /// Lead time before a regular event becomes live
    pub default_lead_minutes: i64,
    /// Minutes between the reminder and the event start
    pub reminder_minutes_before: i64,
    /// Days covered by the important upcoming list
    pub upcoming_days: i64,
    /// Days before today searched for event markers
    pub marker_past_days: i64,
    /// Days after today searched for event markers
    pub marker_future_days: i64,
    /// Where importance flags are persisted
    pub important_store_path: String,
    /// Optional JSON file seeding the in-memory calendar store
    pub events_file: Option<String>,
    /// Concurrent live activities allowed by the in-memory activity board
    pub max_live_activities: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: String::from("UTC"),
            locale: String::from("en"),
            refresh_interval_secs: 180,
            store_change_debounce_ms: 800,
            full_refresh_every_ticks: 3,
            next_event_window_hours: 24,
            live_activity_lookback_hours: 6,
            important_lead_minutes: 180,
            default_lead_minutes: 60,
            reminder_minutes_before: 120,
            upcoming_days: 30,
            marker_past_days: 365,
            marker_future_days: 365,
            important_store_path: String::from("data/important_events.json"),
            events_file: None,
            max_live_activities: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> PulseResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = match fs::read_to_string(CONFIG_FILE) {
            Ok(content) => Self::from_toml_str(&content)?,
            Err(_) => Self::default(),
        };

        if let Ok(timezone) = env::var("TIMEZONE") {
            config.timezone = timezone;
        }
        if let Ok(locale) = env::var("PULSE_LOCALE") {
            config.locale = locale;
        }
        if let Ok(path) = env::var("PULSE_EVENTS_FILE") {
            config.events_file = Some(path);
        }
        if let Ok(path) = env::var("PULSE_IMPORTANT_STORE") {
            config.important_store_path = path;
        }
        if let Ok(secs) = env::var("PULSE_REFRESH_INTERVAL_SECS") {
            config.refresh_interval_secs = secs
                .parse::<u64>()
                .map_err(|_| env_error("PULSE_REFRESH_INTERVAL_SECS"))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> PulseResult<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the refresh loop cannot work with
    pub fn validate(&self) -> PulseResult<()> {
        self.tz()?;
        if self.refresh_interval_secs == 0 {
            return Err(config_error("refresh_interval_secs must be positive"));
        }
        if self.full_refresh_every_ticks == 0 {
            return Err(config_error("full_refresh_every_ticks must be positive"));
        }
        check_range("refresh_interval_secs", self.refresh_interval_secs, MAX_REFRESH_INTERVAL_SECS)?;
        check_range("store_change_debounce_ms", self.store_change_debounce_ms, MAX_DEBOUNCE_MS)?;
        check_range("next_event_window_hours", self.next_event_window_hours, MAX_WINDOW_HOURS)?;
        check_range(
            "live_activity_lookback_hours",
            self.live_activity_lookback_hours,
            MAX_WINDOW_HOURS,
        )?;
        check_range("important_lead_minutes", self.important_lead_minutes, MAX_LEAD_MINUTES)?;
        check_range("default_lead_minutes", self.default_lead_minutes, MAX_LEAD_MINUTES)?;
        check_range("reminder_minutes_before", self.reminder_minutes_before, MAX_LEAD_MINUTES)?;
        check_range("upcoming_days", self.upcoming_days, MAX_WINDOW_DAYS)?;
        check_range("marker_past_days", self.marker_past_days, MAX_WINDOW_DAYS)?;
        check_range("marker_future_days", self.marker_future_days, MAX_WINDOW_DAYS)?;
        Ok(())
    }

    /// Parsed timezone
    pub fn tz(&self) -> PulseResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }

    pub fn debounce(&self) -> Duration {
        Duration::milliseconds(self.store_change_debounce_ms as i64)
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.refresh_interval_secs)
    }

    /// Path of the importance flag store
    pub fn important_store(&self) -> &Path {
        Path::new(&self.important_store_path)
    }
}
