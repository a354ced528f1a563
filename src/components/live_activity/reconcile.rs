//! Diff between the events that deserve a live activity and the activities
//! actually running.
//!
//! [`reconcile`] is pure: it only looks at its two inputs, so running it again
//! on the state produced by applying its actions yields nothing to do.

use super::models::{ActivityContent, ActivityId, RunningActivity};
use crate::components::calendar::Event;
use std::collections::HashMap;
use std::fmt;

/// Why an activity is being ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Another running activity already represents the same event
    Duplicate,
    /// The event left the candidate set
    Stale,
}

/// One operation against the live activity service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start(Event),
    Update {
        activity: ActivityId,
        event_id: String,
        content: ActivityContent,
    },
    End {
        activity: ActivityId,
        event_id: String,
        reason: EndReason,
    },
}

impl Action {
    pub fn event_id(&self) -> &str {
        match self {
            Action::Start(event) => &event.id,
            Action::Update { event_id, .. } | Action::End { event_id, .. } => event_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Action::Start(_) => "start",
            Action::Update { .. } => "update",
            Action::End { .. } => "end",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Start(event) => write!(f, "start activity for {}", event.id),
            Action::Update { activity, event_id, .. } => {
                write!(f, "update activity {} ({})", activity, event_id)
            }
            Action::End { activity, event_id, reason } => {
                write!(f, "end {:?} activity {} ({})", reason, activity, event_id)
            }
        }
    }
}

/// Compute the actions that leave exactly one up-to-date activity per candidate event.
///
/// Duplicate candidates collapse to the last one seen. Among running activities
/// sharing an event id the first enumerated one is kept; the service does not
/// promise a stable enumeration order, so which duplicate survives is arbitrary.
///
/// Actions come out as every `End`, then every `Update`, then every `Start`, so
/// duplicates and stale activities are gone before new ones are requested.
pub fn reconcile(candidates: &[Event], running: &[RunningActivity]) -> Vec<Action> {
    // Last-seen wins, first-seen position keeps the output stable
    let mut unique: Vec<&Event> = Vec::new();
    let mut candidate_index: HashMap<&str, usize> = HashMap::new();
    for event in candidates {
        match candidate_index.get(event.id.as_str()) {
            Some(&i) => unique[i] = event,
            None => {
                candidate_index.insert(&event.id, unique.len());
                unique.push(event);
            }
        }
    }

    let mut ends = Vec::new();
    let mut kept: HashMap<&str, &RunningActivity> = HashMap::new();
    let mut kept_order: Vec<&RunningActivity> = Vec::new();
    for activity in running {
        if kept.contains_key(activity.event_id()) {
            ends.push(Action::End {
                activity: activity.id.clone(),
                event_id: activity.event_id().to_string(),
                reason: EndReason::Duplicate,
            });
        } else {
            kept.insert(activity.event_id(), activity);
            kept_order.push(activity);
        }
    }

    for activity in kept_order {
        if !candidate_index.contains_key(activity.event_id()) {
            ends.push(Action::End {
                activity: activity.id.clone(),
                event_id: activity.event_id().to_string(),
                reason: EndReason::Stale,
            });
        }
    }

    let mut updates = Vec::new();
    let mut starts = Vec::new();
    for event in unique {
        let content = ActivityContent::from(event);
        match kept.get(event.id.as_str()) {
            Some(existing) if existing.content == content => {}
            Some(existing) => updates.push(Action::Update {
                activity: existing.id.clone(),
                event_id: event.id.clone(),
                content,
            }),
            None => starts.push(Action::Start(event.clone())),
        }
    }

    ends.extend(updates);
    ends.extend(starts);
    ends
}

#[cfg(test)]
mod tests {
    use super::super::models::ActivityAttributes;
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
    }

    fn event(id: &str, minutes: i64) -> Event {
        let start = now() + Duration::minutes(minutes);
        Event {
            id: id.into(),
            title: format!("Event {}", id),
            start,
            end: start + Duration::hours(1),
            calendar_id: "c".into(),
            calendar_name: "Work".into(),
            is_all_day: false,
            notes: None,
        }
    }

    fn running(handle: &str, event: &Event) -> RunningActivity {
        RunningActivity {
            id: ActivityId(handle.into()),
            attributes: ActivityAttributes { event_id: event.id.clone() },
            content: ActivityContent::from(event),
        }
    }

    #[test]
    fn new_candidate_is_started() {
        let a = event("A", 30);
        assert_eq!(reconcile(&[a.clone()], &[]), vec![Action::Start(a)]);
    }

    #[test]
    fn matching_activity_needs_nothing() {
        let a = event("A", 30);
        assert!(reconcile(&[a.clone()], &[running("h1", &a)]).is_empty());
    }

    #[test]
    fn empty_candidates_end_everything() {
        let a = event("A", 30);
        let b = event("B", 40);
        let actions = reconcile(&[], &[running("h1", &a), running("h2", &b)]);

        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| matches!(a, Action::End { reason: EndReason::Stale, .. })));
        let mut ended: Vec<_> = actions.iter().map(|a| a.event_id()).collect();
        ended.sort();
        assert_eq!(ended, vec!["A", "B"]);
    }

    #[test]
    fn changed_content_is_updated() {
        let a = event("A", 30);
        let mut renamed = a.clone();
        renamed.title = "Renamed".into();

        let actions = reconcile(&[renamed.clone()], &[running("h1", &a)]);
        assert_eq!(
            actions,
            vec![Action::Update {
                activity: ActivityId("h1".into()),
                event_id: "A".into(),
                content: ActivityContent::from(&renamed),
            }]
        );
    }

    #[test]
    fn fields_outside_the_snapshot_do_not_update() {
        let a = event("A", 30);
        let mut with_notes = a.clone();
        with_notes.notes = Some("agenda".into());
        with_notes.end = a.end + Duration::minutes(30);

        assert!(reconcile(&[with_notes], &[running("h1", &a)]).is_empty());
    }

    #[test]
    fn duplicate_activity_is_ended_before_any_start() {
        let a = event("A", 30);
        let b = event("B", 45);
        let actions = reconcile(&[a.clone(), b.clone()], &[running("h1", &a), running("h2", &a)]);

        assert_eq!(
            actions,
            vec![
                Action::End {
                    activity: ActivityId("h2".into()),
                    event_id: "A".into(),
                    reason: EndReason::Duplicate,
                },
                Action::Start(b),
            ]
        );
    }

    #[test]
    fn duplicate_of_stale_event_ends_both() {
        let a = event("A", 30);
        let actions = reconcile(&[], &[running("h1", &a), running("h2", &a)]);
        let ended: Vec<_> = actions
            .iter()
            .map(|action| match action {
                Action::End { activity, reason, .. } => (activity.0.as_str(), *reason),
                other => panic!("unexpected {}", other),
            })
            .collect();
        assert_eq!(ended, vec![("h2", EndReason::Duplicate), ("h1", EndReason::Stale)]);
    }

    #[test]
    fn duplicate_candidates_keep_last_seen() {
        let first = event("A", 30);
        let mut second = first.clone();
        second.title = "Second".into();

        assert_eq!(reconcile(&[first, second.clone()], &[]), vec![Action::Start(second)]);
    }
}
