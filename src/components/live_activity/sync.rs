//! Applying reconciler output to an [`ActivityService`]

use super::models::{ActivityAttributes, ActivityContent};
use super::reconcile::{reconcile, Action};
use super::service::ActivityService;
use crate::components::calendar::Event;
use std::fmt;
use tracing::{debug, warn};

/// One operation the service refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionFailure {
    /// `start`, `update`, `end` or `list`
    pub kind: &'static str,
    pub event_id: Option<String>,
    pub message: String,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.event_id {
            Some(id) => write!(f, "{} for {} failed: {}", self.kind, id, self.message),
            None => write!(f, "{} failed: {}", self.kind, self.message),
        }
    }
}

/// What one synchronization pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub started: usize,
    pub updated: usize,
    pub ended: usize,
    pub failures: Vec<ActionFailure>,
    /// Live activities are disabled, nothing was attempted
    pub skipped: bool,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of operations the service accepted
    pub fn applied(&self) -> usize {
        self.started + self.updated + self.ended
    }

    fn fail(&mut self, kind: &'static str, event_id: Option<&str>, message: String) {
        let failure = ActionFailure {
            kind,
            event_id: event_id.map(str::to_string),
            message,
        };
        warn!("Live activity {}", failure);
        self.failures.push(failure);
    }
}

/// Apply `actions` in order. A refused action is recorded and the rest still run;
/// the next pass retries whatever did not go through.
pub async fn apply_actions(service: &dyn ActivityService, actions: Vec<Action>) -> SyncReport {
    let mut report = SyncReport::default();

    for action in actions {
        debug!("Applying {}", action);
        match action {
            Action::Start(event) => {
                let attributes = ActivityAttributes {
                    event_id: event.id.clone(),
                };
                let content = ActivityContent::from(&event);
                match service.start(attributes, content, Some(event.end)).await {
                    Ok(_) => report.started += 1,
                    Err(e) => report.fail("start", Some(&event.id), e.to_string()),
                }
            }
            Action::Update {
                activity,
                event_id,
                content,
            } => match service.update(&activity, content).await {
                Ok(()) => report.updated += 1,
                Err(e) => report.fail("update", Some(&event_id), e.to_string()),
            },
            Action::End {
                activity, event_id, ..
            } => match service.end(&activity).await {
                Ok(()) => report.ended += 1,
                Err(e) => report.fail("end", Some(&event_id), e.to_string()),
            },
        }
    }

    report
}

/// Bring the running activities in line with `candidates`
pub async fn sync_activities(service: &dyn ActivityService, candidates: &[Event]) -> SyncReport {
    if !service.activities_enabled() {
        debug!("Live activities are disabled, skipping sync");
        return SyncReport {
            skipped: true,
            ..SyncReport::default()
        };
    }

    let running = match service.running().await {
        Ok(running) => running,
        Err(e) => {
            let mut report = SyncReport::default();
            report.fail("list", None, e.to_string());
            return report;
        }
    };

    let actions = reconcile(candidates, &running);
    if actions.is_empty() {
        debug!("{} live activities already in sync", running.len());
        return SyncReport::default();
    }
    apply_actions(service, actions).await
}

/// End every running activity, whether or not activities are enabled
pub async fn end_all_activities(service: &dyn ActivityService) -> SyncReport {
    let mut report = SyncReport::default();
    let running = match service.running().await {
        Ok(running) => running,
        Err(e) => {
            report.fail("list", None, e.to_string());
            return report;
        }
    };

    for activity in running {
        match service.end(&activity.id).await {
            Ok(()) => report.ended += 1,
            Err(e) => report.fail("end", Some(activity.event_id()), e.to_string()),
        }
    }
    report
}
