use super::models::Event;
use super::source::EventSource;
use crate::error::PulseResult;
use crate::utils::time::{day_window, local_date, start_of_day, DateWindow};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::BTreeSet;

/// Earliest timed event starting after `now` within the next `hours`
pub async fn next_event(
    source: &dyn EventSource,
    now: DateTime<Utc>,
    hours: i64,
) -> PulseResult<Option<Event>> {
    let events = source
        .fetch_events(&DateWindow::hours_ahead(now, hours))
        .await?;
    Ok(events
        .into_iter()
        .filter(|e| !e.is_all_day && e.start > now)
        .min_by_key(|e| e.start))
}

/// Every event overlapping the local day `date`
pub async fn events_on(source: &dyn EventSource, date: NaiveDate, tz: Tz) -> PulseResult<Vec<Event>> {
    source.fetch_events(&day_window(date, tz)?).await
}

/// Events overlapping the next `days` days
pub async fn upcoming_events(
    source: &dyn EventSource,
    now: DateTime<Utc>,
    days: i64,
) -> PulseResult<Vec<Event>> {
    source
        .fetch_events(&DateWindow::new(now, now + Duration::days(days)))
        .await
}

/// Timed events from `lookback_hours` ago up to `hours` ahead; input for the visibility filter
pub async fn live_activity_events(
    source: &dyn EventSource,
    now: DateTime<Utc>,
    lookback_hours: i64,
    hours: i64,
) -> PulseResult<Vec<Event>> {
    let window = DateWindow::new(now - Duration::hours(lookback_hours), now + Duration::hours(hours));
    let events = source.fetch_events(&window).await?;
    Ok(events.into_iter().filter(|e| !e.is_all_day).collect())
}

/// Local days between `today - past_days` and `today + future_days` carrying at least one event start
pub async fn event_days(
    source: &dyn EventSource,
    today: NaiveDate,
    past_days: i64,
    future_days: i64,
    tz: Tz,
) -> PulseResult<BTreeSet<NaiveDate>> {
    let window = DateWindow::new(
        start_of_day(today - Duration::days(past_days), tz)?,
        start_of_day(today + Duration::days(future_days), tz)?,
    );
    let events = source.fetch_events(&window).await?;
    Ok(events.iter().map(|e| local_date(e.start, tz)).collect())
}
