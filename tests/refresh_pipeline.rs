mod common;

use calendar_pulse::components::calendar::{Event, EventDraft, EventSource};
use calendar_pulse::components::live_activity::{ActivityContent, ActivityService};
use calendar_pulse::components::pulse::{refresh_next_event, RefreshSettings};
use calendar_pulse::components::reminders::{ReminderPlan, ReminderTracker};
use calendar_pulse::config::Config;
use chrono::{DateTime, Duration, TimeZone, Utc};
use common::{timed, Fixture, ReminderCall};
use std::collections::HashSet;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

fn ids(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.id.as_str()).collect()
}

#[tokio::test]
async fn unchanged_next_event_schedules_the_reminder_once() {
    let fixture = Fixture::new(vec![timed("a", "Standup", now(), 30)]);
    let services = fixture.services();
    let settings = RefreshSettings::default();
    let mut tracker = ReminderTracker::new();

    let first = refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), now())
        .await
        .unwrap();
    assert_eq!(first.next.as_ref().map(|e| e.id.as_str()), Some("a"));
    assert!(matches!(first.reminder, ReminderPlan::Schedule(_)));

    let later = now() + Duration::minutes(3);
    let second = refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), later)
        .await
        .unwrap();
    assert_eq!(second.reminder, ReminderPlan::Keep);

    assert_eq!(
        fixture.reminders.calls(),
        vec![ReminderCall::Schedule {
            event_id: "a".to_string(),
            minutes_before: 120,
        }]
    );
}

#[tokio::test]
async fn moved_event_is_rescheduled() {
    let fixture = Fixture::new(vec![timed("a", "Standup", now(), 30)]);
    let services = fixture.services();
    let settings = RefreshSettings::default();
    let mut tracker = ReminderTracker::new();

    refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), now())
        .await
        .unwrap();

    let start = now() + Duration::minutes(45);
    let draft = EventDraft {
        title: "Standup".to_string(),
        start,
        end: start + Duration::hours(1),
        is_all_day: false,
        calendar_id: None,
        notes: None,
    };
    fixture.events.update_event("a", draft).await.unwrap();

    refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), now())
        .await
        .unwrap();
    assert_eq!(fixture.reminders.calls().len(), 2);
}

#[tokio::test]
async fn reminders_are_cleared_only_when_the_next_event_goes_away() {
    let fixture = Fixture::new(Vec::new());
    let services = fixture.services();
    let settings = RefreshSettings::default();
    let mut tracker = ReminderTracker::new();
    let important = HashSet::new();

    refresh_next_event(&services, &settings, &mut tracker, &important, now()).await.unwrap();
    refresh_next_event(&services, &settings, &mut tracker, &important, now()).await.unwrap();
    assert_eq!(fixture.reminders.calls(), vec![ReminderCall::ClearAll]);

    fixture.events.insert_raw(timed("a", "Standup", now(), 30)).await;
    refresh_next_event(&services, &settings, &mut tracker, &important, now()).await.unwrap();

    // After it started, nothing is upcoming any more
    let after_start = now() + Duration::minutes(31);
    refresh_next_event(&services, &settings, &mut tracker, &important, after_start)
        .await
        .unwrap();
    assert_eq!(
        fixture.reminders.calls(),
        vec![
            ReminderCall::ClearAll,
            ReminderCall::Schedule {
                event_id: "a".to_string(),
                minutes_before: 120,
            },
            ReminderCall::ClearAll,
        ]
    );
}

#[tokio::test]
async fn failed_reminder_is_retried_on_the_next_refresh() {
    let fixture = Fixture::new(vec![timed("a", "Standup", now(), 30)]);
    let services = fixture.services();
    let settings = RefreshSettings::default();
    let mut tracker = ReminderTracker::new();

    fixture.reminders.set_failing(true);
    refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), now())
        .await
        .unwrap();
    assert!(fixture.reminders.calls().is_empty());

    fixture.reminders.set_failing(false);
    refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), now())
        .await
        .unwrap();
    assert_eq!(fixture.reminders.calls().len(), 1);
}

#[tokio::test]
async fn importance_widens_the_live_window() {
    let fixture = Fixture::new(vec![
        timed("soon", "Standup", now(), 30),
        timed("later", "Review", now(), 150),
        timed("running", "Workshop", now(), -20),
    ]);
    let services = fixture.services();
    let settings = RefreshSettings::default();
    let mut tracker = ReminderTracker::new();

    let outcome = refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), now())
        .await
        .unwrap();
    assert_eq!(ids(&outcome.candidates), vec!["running", "soon"]);
    assert_eq!(outcome.activities.started, 2);
    // The running workshop is not "next"
    assert_eq!(outcome.next.map(|e| e.id), Some("soon".to_string()));

    let important: HashSet<String> = ["later".to_string()].into_iter().collect();
    let outcome = refresh_next_event(&services, &settings, &mut tracker, &important, now())
        .await
        .unwrap();
    assert_eq!(ids(&outcome.candidates), vec!["running", "soon", "later"]);
    assert_eq!(outcome.activities.started, 1);
    assert_eq!(fixture.activities.running().await.unwrap().len(), 3);
}

#[tokio::test]
async fn no_candidates_end_every_activity() {
    let fixture = Fixture::new(vec![timed("far", "Offsite", now(), 600)]);
    let stale = Event {
        id: "gone".to_string(),
        title: "Gone".to_string(),
        start: now(),
        end: now() + Duration::hours(1),
        calendar_id: "work".to_string(),
        calendar_name: "Work".to_string(),
        is_all_day: false,
        notes: None,
    };
    fixture
        .activities
        .insert_running("gone", ActivityContent::from(&stale))
        .await;
    fixture
        .activities
        .insert_running("gone", ActivityContent::from(&stale))
        .await;

    let outcome = refresh_next_event(
        &fixture.services(),
        &RefreshSettings::default(),
        &mut ReminderTracker::new(),
        &HashSet::new(),
        now(),
    )
    .await
    .unwrap();

    assert!(outcome.candidates.is_empty());
    assert_eq!(outcome.activities.ended, 2);
    assert!(fixture.activities.running().await.unwrap().is_empty());
}

#[tokio::test]
async fn renamed_event_updates_its_activity_in_place() {
    let fixture = Fixture::new(vec![timed("a", "Standup", now(), 30)]);
    let services = fixture.services();
    let settings = RefreshSettings::default();
    let mut tracker = ReminderTracker::new();

    refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), now())
        .await
        .unwrap();
    let before = fixture.activities.running().await.unwrap();

    let draft = EventDraft {
        title: "Standup (moved room)".to_string(),
        start: before[0].content.start,
        end: before[0].content.start + Duration::hours(1),
        is_all_day: false,
        calendar_id: None,
        notes: None,
    };
    fixture.events.update_event("a", draft).await.unwrap();

    let outcome = refresh_next_event(&services, &settings, &mut tracker, &HashSet::new(), now())
        .await
        .unwrap();
    assert_eq!((outcome.activities.updated, outcome.activities.started), (1, 0));

    let after = fixture.activities.running().await.unwrap();
    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].content.title, "Standup (moved room)");
}

#[tokio::test]
async fn widest_accepted_windows_refresh_without_overflow() {
    let config = Config::from_toml_str(
        r#"
        next_event_window_hours = 8784
        live_activity_lookback_hours = 8784
        important_lead_minutes = 10080
        default_lead_minutes = 10080
        reminder_minutes_before = 10080
        "#,
    )
    .unwrap();
    let settings = RefreshSettings::from_config(&config).unwrap();
    let fixture = Fixture::new(vec![timed("a", "Standup", now(), 30)]);

    let outcome = refresh_next_event(
        &fixture.services(),
        &settings,
        &mut ReminderTracker::new(),
        &HashSet::new(),
        now(),
    )
    .await
    .unwrap();
    assert_eq!(outcome.next.map(|e| e.id), Some("a".to_string()));
    assert_eq!(outcome.activities.started, 1);
}
