use crate::components::calendar::Event;
use crate::error::PulseResult;
use async_trait::async_trait;

/// The local notification scheduler
#[async_trait]
pub trait ReminderScheduler: Send + Sync {
    /// Ask for permission to show notifications
    async fn request_access(&self) -> PulseResult<bool>;

    /// Replace the pending reminders of `event` with one firing `minutes_before` its start.
    /// Nothing is added when that moment has already passed.
    async fn schedule_reminders(&self, event: &Event, minutes_before: i64) -> PulseResult<()>;

    /// Drop every pending reminder in the event namespace
    async fn clear_all_event_reminders(&self) -> PulseResult<()>;
}
