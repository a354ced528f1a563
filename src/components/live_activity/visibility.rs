use crate::components::calendar::Event;
use crate::config::Config;
use chrono::{DateTime, Duration, Utc};

/// How long before its start an event becomes live
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibilityWindow {
    pub important_lead: Duration,
    pub default_lead: Duration,
}

impl Default for VisibilityWindow {
    fn default() -> Self {
        Self {
            important_lead: Duration::hours(3),
            default_lead: Duration::hours(1),
        }
    }
}

impl VisibilityWindow {
    pub fn from_config(config: &Config) -> Self {
        Self {
            important_lead: Duration::minutes(config.important_lead_minutes),
            default_lead: Duration::minutes(config.default_lead_minutes),
        }
    }

    /// Timed events that have not ended and start within their lead time.
    /// An event exactly at its threshold is included.
    pub fn candidates<F>(&self, events: &[Event], now: DateTime<Utc>, is_important: F) -> Vec<Event>
    where
        F: Fn(&Event) -> bool,
    {
        events
            .iter()
            .filter(|event| {
                let lead = if is_important(event) {
                    self.important_lead
                } else {
                    self.default_lead
                };
                !event.is_all_day && !event.is_over(now) && event.start - now <= lead
            })
            .cloned()
            .collect()
    }
}

/// [`VisibilityWindow::candidates`] with the default 3h/1h leads
pub fn candidates<F>(events: &[Event], now: DateTime<Utc>, is_important: F) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    VisibilityWindow::default().candidates(events, now, is_important)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
    }

    fn event(id: &str, starts_in_secs: i64, all_day: bool) -> Event {
        let start = now() + Duration::seconds(starts_in_secs);
        Event {
            id: id.into(),
            title: id.into(),
            start,
            end: start + Duration::hours(1),
            calendar_id: "c".into(),
            calendar_name: "Cal".into(),
            is_all_day: all_day,
            notes: None,
        }
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn one_hour_boundary_depends_on_importance() {
        let events = vec![event("at-hour", 3600, false)];
        assert_eq!(ids(&candidates(&events, now(), |_| false)), vec!["at-hour"]);
        assert_eq!(ids(&candidates(&events, now(), |_| true)), vec!["at-hour"]);

        let events = vec![event("past-hour", 3601, false)];
        assert!(candidates(&events, now(), |_| false).is_empty());
        assert_eq!(ids(&candidates(&events, now(), |_| true)), vec!["past-hour"]);
    }

    #[test]
    fn three_hour_boundary_for_important_events() {
        let events = vec![event("at", 10_800, false), event("past", 10_801, false)];
        assert_eq!(ids(&candidates(&events, now(), |_| true)), vec!["at"]);
    }

    #[test]
    fn running_events_stay_until_their_end() {
        let running = event("running", -1800, false);
        let ended = event("ended", -3600, false);
        let result = candidates(&[running, ended], now(), |_| false);
        assert_eq!(ids(&result), vec!["running"]);
    }

    #[test]
    fn all_day_events_never_qualify() {
        let events = vec![event("holiday", 60, true)];
        assert!(candidates(&events, now(), |_| true).is_empty());
    }

    #[test]
    fn configured_leads_are_used() {
        let config = Config {
            important_lead_minutes: 30,
            default_lead_minutes: 10,
            ..Config::default()
        };
        let window = VisibilityWindow::from_config(&config);
        let events = vec![event("a", 20 * 60, false)];
        assert!(window.candidates(&events, now(), |_| false).is_empty());
        assert_eq!(ids(&window.candidates(&events, now(), |_| true)), vec!["a"]);
    }
}
