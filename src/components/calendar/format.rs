use super::models::Event;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// "in 5 min", "in 1 h 20 min" or "Started"
pub fn countdown_text(event: &Event, now: DateTime<Utc>) -> String {
    let millis = (event.start - now).num_milliseconds();
    if millis <= 0 {
        return t!("countdown_started").to_string();
    }

    // Round partial minutes up so "in 0 min" never shows
    let minutes = (millis + 59_999) / 60_000;
    let hours = minutes / 60;
    let remaining = minutes % 60;

    if hours > 0 {
        t!("countdown_hours_minutes", hours = hours, minutes = remaining).to_string()
    } else {
        t!("countdown_minutes", minutes = minutes).to_string()
    }
}

/// Clock range like "9:00 AM - 10:30 AM", or "All day"
pub fn time_range_text(event: &Event, tz: Tz) -> String {
    time_range_in(event, tz, &rust_i18n::locale())
}

/// Date followed by the clock range
pub fn date_time_range_text(event: &Event, tz: Tz) -> String {
    date_time_range_in(event, tz, &rust_i18n::locale())
}

fn time_range_in(event: &Event, tz: Tz, locale: &str) -> String {
    if event.is_all_day {
        return t!("time_all_day", locale = locale).to_string();
    }

    let pattern = t!("format_time", locale = locale);
    let start = event.start.with_timezone(&tz).format(&pattern);
    let end = event.end.with_timezone(&tz).format(&pattern);
    format!("{} - {}", start, end)
}

fn date_time_range_in(event: &Event, tz: Tz, locale: &str) -> String {
    let pattern = t!("format_date", locale = locale);
    let date = event.start.with_timezone(&tz).format(&pattern);
    format!("{} · {}", date, time_range_in(event, tz, locale))
}
