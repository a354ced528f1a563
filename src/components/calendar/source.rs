use super::models::{CalendarListItem, Event, EventDraft};
use crate::error::PulseResult;
use crate::utils::time::DateWindow;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// The system calendar store.
///
/// Implementations return events overlapping the window, ordered by start time,
/// with at most one entry per identifier. Titles and identifiers are already
/// normalized (see [`display_title`](super::models::display_title)).
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Whether read access to events has been granted
    fn has_read_access(&self) -> bool;

    /// Ask for access; resolves to whether it was granted
    async fn request_access(&self) -> PulseResult<bool>;

    /// Events overlapping `window`
    async fn fetch_events(&self, window: &DateWindow) -> PulseResult<Vec<Event>>;

    /// Calendars that accept new events, sorted by title
    async fn fetch_writable_calendars(&self) -> PulseResult<Vec<CalendarListItem>>;

    async fn create_event(&self, draft: EventDraft) -> PulseResult<Event>;

    /// Fails with `NotFound` when `id` no longer exists
    async fn update_event(&self, id: &str, draft: EventDraft) -> PulseResult<Event>;

    /// Fails with `NotFound` when `id` no longer exists
    async fn delete_event(&self, id: &str) -> PulseResult<()>;

    /// Receives a message every time the store changes
    fn subscribe_changes(&self) -> broadcast::Receiver<()>;
}
