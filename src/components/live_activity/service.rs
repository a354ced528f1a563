use super::models::{ActivityAttributes, ActivityContent, ActivityId, RunningActivity};
use crate::error::PulseResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The platform service presenting live activities
///
/// Implementations do not have to enforce one activity per event; the
/// reconciler takes care of that.
#[async_trait]
pub trait ActivityService: Send + Sync {
    /// Whether the user allows live activities at all
    fn activities_enabled(&self) -> bool;

    /// Every activity currently running, in the service's enumeration order
    async fn running(&self) -> PulseResult<Vec<RunningActivity>>;

    /// Start a new activity; `stale_date` tells the platform when the content becomes outdated
    async fn start(
        &self,
        attributes: ActivityAttributes,
        content: ActivityContent,
        stale_date: Option<DateTime<Utc>>,
    ) -> PulseResult<ActivityId>;

    async fn update(&self, activity: &ActivityId, content: ActivityContent) -> PulseResult<()>;

    /// End an activity and dismiss it immediately
    async fn end(&self, activity: &ActivityId) -> PulseResult<()>;
}
