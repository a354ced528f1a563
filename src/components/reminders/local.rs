use super::identifiers::{before_identifier, is_event_reminder, start_identifier};
use super::scheduler::ReminderScheduler;
use crate::components::calendar::Event;
use crate::error::{reminder_error, PulseResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// A reminder that reached its fire time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredReminder {
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Utc>,
}

struct PendingReminder {
    fire_at: DateTime<Utc>,
    task: JoinHandle<()>,
}

type PendingMap = Arc<Mutex<HashMap<String, PendingReminder>>>;

/// Schedules one-shot reminders on tokio timers.
///
/// Each pending reminder is a sleeping task; removing it aborts the task.
/// Delivered reminders are logged and, when a channel is attached, forwarded.
#[derive(Clone, Default)]
pub struct LocalReminderScheduler {
    pending: PendingMap,
    delivered_tx: Option<mpsc::UnboundedSender<DeliveredReminder>>,
}

impl LocalReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler forwarding every delivered reminder to the returned receiver
    pub fn with_channel() -> (Self, mpsc::UnboundedReceiver<DeliveredReminder>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            pending: PendingMap::default(),
            delivered_tx: Some(tx),
        };
        (scheduler, rx)
    }

    /// Identifiers still waiting to fire, sorted
    pub async fn pending_identifiers(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.pending.lock().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Fire time of a pending reminder
    pub async fn fire_time(&self, identifier: &str) -> Option<DateTime<Utc>> {
        self.pending.lock().await.get(identifier).map(|p| p.fire_at)
    }

    async fn remove_pending(&self, identifiers: &[String]) {
        let mut pending = self.pending.lock().await;
        for id in identifiers {
            if let Some(reminder) = pending.remove(id) {
                reminder.task.abort();
                debug!("Removed pending reminder {}", id);
            }
        }
    }

    async fn add_request(&self, reminder: DeliveredReminder) -> PulseResult<()> {
        let delay = (reminder.fire_at - Utc::now())
            .to_std()
            .map_err(|_| reminder_error("Reminder fire time is in the past"))?;

        let identifier = reminder.identifier.clone();
        let fire_at = reminder.fire_at;
        let shared = Arc::clone(&self.pending);
        let delivered_tx = self.delivered_tx.clone();

        // Hold the lock until the entry is in place so the task cannot fire first
        let mut pending = self.pending.lock().await;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            shared.lock().await.remove(&reminder.identifier);
            info!("Reminder {}: {}", reminder.identifier, reminder.body);
            if let Some(tx) = delivered_tx {
                let _ = tx.send(reminder);
            }
        });

        if let Some(previous) = pending.insert(identifier.clone(), PendingReminder { fire_at, task }) {
            previous.task.abort();
        }
        debug!("Scheduled reminder {} for {}", identifier, fire_at);
        Ok(())
    }

    /// Abort every pending reminder
    pub async fn shutdown(&self) {
        let mut pending = self.pending.lock().await;
        for (_, reminder) in pending.drain() {
            reminder.task.abort();
        }
    }
}

#[async_trait]
impl ReminderScheduler for LocalReminderScheduler {
    async fn request_access(&self) -> PulseResult<bool> {
        Ok(true)
    }

    async fn schedule_reminders(&self, event: &Event, minutes_before: i64) -> PulseResult<()> {
        let before_id = before_identifier(&event.id);
        let start_id = start_identifier(&event.id);
        self.remove_pending(&[before_id.clone(), start_id]).await;

        let fire_at = event.start - Duration::minutes(minutes_before);
        if fire_at <= Utc::now() {
            debug!("Reminder for {} would fire in the past, skipping", event.id);
            return Ok(());
        }

        self.add_request(DeliveredReminder {
            identifier: before_id,
            title: t!("reminder_title").to_string(),
            body: t!("reminder_body", title = event.title.as_str(), minutes = minutes_before).to_string(),
            fire_at,
        })
        .await
    }

    async fn clear_all_event_reminders(&self) -> PulseResult<()> {
        let ids: Vec<String> = self
            .pending
            .lock()
            .await
            .keys()
            .filter(|id| is_event_reminder(id))
            .cloned()
            .collect();
        self.remove_pending(&ids).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, start: DateTime<Utc>) -> Event {
        Event {
            id: id.into(),
            title: "Planning".into(),
            start,
            end: start + Duration::hours(1),
            calendar_id: "c".into(),
            calendar_name: "Cal".into(),
            is_all_day: false,
            notes: None,
        }
    }

    #[tokio::test]
    async fn schedules_before_reminder_only() {
        let scheduler = LocalReminderScheduler::new();
        let start = Utc::now() + Duration::hours(3);
        scheduler.schedule_reminders(&event("ev:1", start), 120).await.unwrap();

        assert_eq!(
            scheduler.pending_identifiers().await,
            vec!["calendarpulse.event.ev_1.before".to_string()]
        );
        assert_eq!(
            scheduler.fire_time("calendarpulse.event.ev_1.before").await,
            Some(start - Duration::minutes(120))
        );
    }

    #[tokio::test]
    async fn past_fire_time_is_skipped() {
        let scheduler = LocalReminderScheduler::new();
        let start = Utc::now() + Duration::minutes(30);
        scheduler.schedule_reminders(&event("ev", start), 120).await.unwrap();
        assert!(scheduler.pending_identifiers().await.is_empty());
    }

    #[tokio::test]
    async fn rescheduling_replaces_the_pending_reminder() {
        let scheduler = LocalReminderScheduler::new();
        let start = Utc::now() + Duration::hours(5);
        scheduler.schedule_reminders(&event("ev", start), 120).await.unwrap();
        scheduler
            .schedule_reminders(&event("ev", start + Duration::hours(1)), 120)
            .await
            .unwrap();

        assert_eq!(scheduler.pending_identifiers().await.len(), 1);
        assert_eq!(
            scheduler.fire_time("calendarpulse.event.ev.before").await,
            Some(start + Duration::hours(1) - Duration::minutes(120))
        );
    }

    #[tokio::test]
    async fn clear_removes_every_event_reminder() {
        let scheduler = LocalReminderScheduler::new();
        let start = Utc::now() + Duration::hours(5);
        scheduler.schedule_reminders(&event("a", start), 120).await.unwrap();
        scheduler.schedule_reminders(&event("b", start), 120).await.unwrap();

        scheduler.clear_all_event_reminders().await.unwrap();
        assert!(scheduler.pending_identifiers().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn due_reminder_is_delivered() {
        rust_i18n::set_locale("en");
        let (scheduler, mut delivered) = LocalReminderScheduler::with_channel();
        let start = Utc::now() + Duration::minutes(10) + Duration::seconds(5);
        scheduler.schedule_reminders(&event("ev", start), 10).await.unwrap();

        let reminder = delivered.recv().await.unwrap();
        assert_eq!(reminder.identifier, "calendarpulse.event.ev.before");
        assert_eq!(reminder.body, "Planning starts in 10 minutes.");
        assert!(scheduler.pending_identifiers().await.is_empty());
    }
}
