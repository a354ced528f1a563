use crate::error::{other_error, PulseResult};
use chrono::{DateTime, Duration, LocalResult, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// A half-open `[start, end)` time range used to query the event source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window starting now and reaching `hours` ahead
    pub fn hours_ahead(now: DateTime<Utc>, hours: i64) -> Self {
        Self::new(now, now + Duration::hours(hours))
    }

    /// Whether `[start, end)` overlaps this window
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }
}

/// First instant of `date` in `tz`
///
/// When midnight falls into a DST gap the first valid instant after it is used.
pub fn start_of_day(date: NaiveDate, tz: Tz) -> PulseResult<DateTime<Utc>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| other_error("Failed to create datetime"))?;

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => {
            // Skipped hour, walk forward until the clock exists again
            for minutes in (15..=180).step_by(15) {
                if let LocalResult::Single(dt) =
                    tz.from_local_datetime(&(midnight + Duration::minutes(minutes)))
                {
                    return Ok(dt.with_timezone(&Utc));
                }
            }
            Err(other_error("Invalid local time"))
        }
    }
}

/// The local calendar day containing `instant`
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Window covering the whole local day `date`
pub fn day_window(date: NaiveDate, tz: Tz) -> PulseResult<DateWindow> {
    let next = date
        .succ_opt()
        .ok_or_else(|| other_error("Date out of range"))?;
    Ok(DateWindow::new(start_of_day(date, tz)?, start_of_day(next, tz)?))
}
