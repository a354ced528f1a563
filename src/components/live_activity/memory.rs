use super::behaviour::ActivityBehaviour;
use super::models::{ActivityAttributes, ActivityContent, ActivityId, RunningActivity};
use super::service::ActivityService;
use crate::error::{activity_error, not_found, PulseResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::info;

/// An operation the board performed, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardOp {
    Started { activity: ActivityId, event_id: String },
    Updated { activity: ActivityId, event_id: String },
    Ended { activity: ActivityId, event_id: String },
}

#[derive(Debug, Clone)]
struct BoardEntry {
    activity: RunningActivity,
    stale_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct Board {
    entries: Vec<BoardEntry>,
    behaviour: ActivityBehaviour,
    history: Vec<BoardOp>,
}

/// Live activity board kept in memory, logging every change.
///
/// Activities are enumerated in the order they were started. Like the platform
/// service it does not stop two activities from sharing an event id.
#[derive(Debug)]
pub struct MemoryActivityService {
    board: Mutex<Board>,
    enabled: AtomicBool,
    max_concurrent: usize,
}

impl Default for MemoryActivityService {
    fn default() -> Self {
        Self::new(5)
    }
}

impl MemoryActivityService {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            board: Mutex::new(Board::default()),
            enabled: AtomicBool::new(true),
            max_concurrent,
        }
    }

    pub fn with_behaviour(max_concurrent: usize, behaviour: ActivityBehaviour) -> Self {
        Self {
            board: Mutex::new(Board {
                behaviour,
                ..Board::default()
            }),
            enabled: AtomicBool::new(true),
            max_concurrent,
        }
    }

    pub async fn set_behaviour(&self, behaviour: ActivityBehaviour) {
        self.board.lock().await.behaviour = behaviour;
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Put an activity on the board without going through `start`,
    /// the way a previous process run or a platform glitch leaves them behind
    pub async fn insert_running(&self, event_id: &str, content: ActivityContent) -> ActivityId {
        let id = ActivityId::random();
        self.board.lock().await.entries.push(BoardEntry {
            activity: RunningActivity {
                id: id.clone(),
                attributes: ActivityAttributes {
                    event_id: event_id.to_string(),
                },
                content,
            },
            stale_date: None,
        });
        id
    }

    /// Snapshot of the running activities
    pub async fn activities(&self) -> Vec<RunningActivity> {
        self.board
            .lock()
            .await
            .entries
            .iter()
            .map(|entry| entry.activity.clone())
            .collect()
    }

    pub async fn stale_date(&self, activity: &ActivityId) -> Option<DateTime<Utc>> {
        self.board
            .lock()
            .await
            .entries
            .iter()
            .find(|entry| &entry.activity.id == activity)
            .and_then(|entry| entry.stale_date)
    }

    /// Every operation performed so far
    pub async fn history(&self) -> Vec<BoardOp> {
        self.board.lock().await.history.clone()
    }
}

#[async_trait]
impl ActivityService for MemoryActivityService {
    fn activities_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    async fn running(&self) -> PulseResult<Vec<RunningActivity>> {
        let mut board = self.board.lock().await;
        board.behaviour.can_list()?;
        Ok(board.entries.iter().map(|entry| entry.activity.clone()).collect())
    }

    async fn start(
        &self,
        attributes: ActivityAttributes,
        content: ActivityContent,
        stale_date: Option<DateTime<Utc>>,
    ) -> PulseResult<ActivityId> {
        if !self.activities_enabled() {
            return Err(activity_error("Live activities are disabled"));
        }
        let mut board = self.board.lock().await;
        board.behaviour.can_start()?;
        if board.entries.len() >= self.max_concurrent {
            return Err(activity_error(&format!(
                "Too many live activities ({} running)",
                board.entries.len()
            )));
        }

        let id = ActivityId::random();
        info!(
            "Live activity {} started for {}: {} at {}",
            id, attributes.event_id, content.title, content.start
        );
        board.history.push(BoardOp::Started {
            activity: id.clone(),
            event_id: attributes.event_id.clone(),
        });
        board.entries.push(BoardEntry {
            activity: RunningActivity {
                id: id.clone(),
                attributes,
                content,
            },
            stale_date,
        });
        Ok(id)
    }

    async fn update(&self, activity: &ActivityId, content: ActivityContent) -> PulseResult<()> {
        let mut board = self.board.lock().await;
        board.behaviour.can_update()?;
        let entry = board
            .entries
            .iter_mut()
            .find(|entry| &entry.activity.id == activity)
            .ok_or_else(|| not_found(&format!("live activity {}", activity)))?;

        info!("Live activity {} updated: {} at {}", activity, content.title, content.start);
        entry.activity.content = content;
        let event_id = entry.activity.event_id().to_string();
        board.history.push(BoardOp::Updated {
            activity: activity.clone(),
            event_id,
        });
        Ok(())
    }

    async fn end(&self, activity: &ActivityId) -> PulseResult<()> {
        let mut board = self.board.lock().await;
        board.behaviour.can_end()?;
        let position = board
            .entries
            .iter()
            .position(|entry| &entry.activity.id == activity)
            .ok_or_else(|| not_found(&format!("live activity {}", activity)))?;

        let entry = board.entries.remove(position);
        info!("Live activity {} ended ({})", activity, entry.activity.event_id());
        board.history.push(BoardOp::Ended {
            activity: activity.clone(),
            event_id: entry.activity.event_id().to_string(),
        });
        Ok(())
    }
}
