pub mod identifiers;
pub mod local;
mod scheduler;
pub mod tracker;

pub use local::LocalReminderScheduler;
pub use scheduler::ReminderScheduler;
pub use tracker::{ReminderPlan, ReminderTracker};
