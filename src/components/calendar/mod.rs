pub mod format;
pub mod memory;
pub mod models;
pub mod queries;
mod source;

pub use memory::MemoryEventStore;
pub use models::{CalendarListItem, Event, EventDraft};
pub use source::EventSource;
