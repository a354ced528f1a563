use super::state::RefreshSettings;
use crate::components::calendar::{queries, Event, EventSource};
use crate::components::important::FlagStore;
use crate::components::live_activity::{end_all_activities, sync_activities, ActivityService, SyncReport};
use crate::components::reminders::{ReminderPlan, ReminderScheduler, ReminderTracker};
use crate::error::PulseResult;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// The services the orchestrator drives
#[derive(Clone)]
pub struct PulseServices {
    pub events: Arc<dyn EventSource>,
    pub flags: Arc<dyn FlagStore>,
    pub activities: Arc<dyn ActivityService>,
    pub reminders: Arc<dyn ReminderScheduler>,
}

/// Result of one next-event refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshOutcome {
    pub next: Option<Event>,
    /// Events that deserve a live activity right now
    pub candidates: Vec<Event>,
    pub activities: SyncReport,
    pub reminder: ReminderPlan,
}

/// Find the next event, reconcile live activities and keep the reminder in step.
///
/// Only event source failures are returned; activity and reminder failures are
/// logged and picked up again by the next refresh.
pub async fn refresh_next_event(
    services: &PulseServices,
    settings: &RefreshSettings,
    tracker: &mut ReminderTracker,
    important_ids: &HashSet<String>,
    now: DateTime<Utc>,
) -> PulseResult<RefreshOutcome> {
    let events = services.events.as_ref();
    let next = queries::next_event(events, now, settings.next_event_window_hours).await?;

    let window_events = queries::live_activity_events(
        events,
        now,
        settings.live_activity_lookback_hours,
        settings.next_event_window_hours,
    )
    .await?;
    let candidates = settings
        .visibility
        .candidates(&window_events, now, |e| important_ids.contains(&e.id));

    let activities = if candidates.is_empty() {
        end_all_activities(services.activities.as_ref()).await
    } else {
        sync_activities(services.activities.as_ref(), &candidates).await
    };
    debug!(
        "{} live activity candidates: {} started, {} updated, {} ended",
        candidates.len(),
        activities.started,
        activities.updated,
        activities.ended
    );

    let reminder = tracker.plan(next.as_ref());
    match &reminder {
        ReminderPlan::Schedule(event) => {
            match services
                .reminders
                .schedule_reminders(event, settings.reminder_minutes_before)
                .await
            {
                Ok(()) => tracker.record_scheduled(event),
                Err(e) => warn!("Failed to schedule reminder for {}: {}", event.id, e),
            }
        }
        ReminderPlan::Clear => match services.reminders.clear_all_event_reminders().await {
            Ok(()) => tracker.record_cleared(),
            Err(e) => warn!("Failed to clear event reminders: {}", e),
        },
        ReminderPlan::Keep => {}
    }

    Ok(RefreshOutcome {
        next,
        candidates,
        activities,
        reminder,
    })
}
