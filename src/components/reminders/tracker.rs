use crate::components::calendar::Event;
use chrono::{DateTime, Utc};

/// What the refresh should do with the reminder schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderPlan {
    /// The next event is new or moved; replace its reminder
    Schedule(Event),
    /// There is no next event any more; drop all event reminders
    Clear,
    /// Leave the schedule untouched
    Keep,
}

/// Remembers which next event the reminder schedule was last built for,
/// so periodic refreshes only touch the scheduler when something changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderTracker {
    last: Option<(String, DateTime<Utc>)>,
    primed: bool,
}

impl ReminderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plan(&self, next: Option<&Event>) -> ReminderPlan {
        match next {
            Some(event) => {
                let unchanged = self
                    .last
                    .as_ref()
                    .is_some_and(|(id, start)| *id == event.id && *start == event.start);
                if unchanged {
                    ReminderPlan::Keep
                } else {
                    ReminderPlan::Schedule(event.clone())
                }
            }
            // First pass clears whatever a previous run left behind
            None if self.last.is_some() || !self.primed => ReminderPlan::Clear,
            None => ReminderPlan::Keep,
        }
    }

    pub fn record_scheduled(&mut self, event: &Event) {
        self.last = Some((event.id.clone(), event.start));
        self.primed = true;
    }

    pub fn record_cleared(&mut self) {
        self.last = None;
        self.primed = true;
    }

    /// Identifier and start of the event the schedule was built for
    pub fn last_scheduled(&self) -> Option<(&str, DateTime<Utc>)> {
        self.last.as_ref().map(|(id, start)| (id.as_str(), *start))
    }
}
