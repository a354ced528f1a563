pub mod behaviour;
pub mod memory;
pub mod models;
pub mod reconcile;
mod service;
pub mod sync;
pub mod visibility;

pub use behaviour::ActivityBehaviour;
pub use memory::MemoryActivityService;
pub use models::{ActivityAttributes, ActivityContent, ActivityId, RunningActivity};
pub use reconcile::{reconcile, Action, EndReason};
pub use service::ActivityService;
pub use sync::{end_all_activities, sync_activities, SyncReport};
pub use visibility::{candidates, VisibilityWindow};
