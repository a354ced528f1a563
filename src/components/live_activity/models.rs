use crate::components::calendar::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle of one running live activity, assigned by the service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityId(pub String);

impl ActivityId {
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed attributes an activity is started with
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityAttributes {
    pub event_id: String,
}

/// The snapshot an activity displays; compared structurally to decide on updates
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityContent {
    pub title: String,
    pub start: DateTime<Utc>,
    pub calendar_name: String,
}

impl From<&Event> for ActivityContent {
    fn from(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            start: event.start,
            calendar_name: event.calendar_name.clone(),
        }
    }
}

/// A live activity as enumerated by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningActivity {
    pub id: ActivityId,
    pub attributes: ActivityAttributes,
    pub content: ActivityContent,
}

impl RunningActivity {
    pub fn event_id(&self) -> &str {
        &self.attributes.event_id
    }
}
