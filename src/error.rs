use miette::{Diagnostic, Result};
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Event not found: {0}")]
    #[diagnostic(code(calendar_pulse::not_found))]
    NotFound(String),

    #[error("Calendar access was denied")]
    #[diagnostic(
        code(calendar_pulse::permission_denied),
        help("grant calendar access and try again")
    )]
    PermissionDenied,

    #[error("Calendar access has not been granted yet")]
    #[diagnostic(code(calendar_pulse::permission_unknown))]
    PermissionUnknown,

    #[error("Event store error: {0}")]
    #[diagnostic(code(calendar_pulse::event_store))]
    EventStore(String),

    #[error("Live activity service error: {0}")]
    #[diagnostic(code(calendar_pulse::activity_service))]
    ActivityService(String),

    #[error("Reminder error: {0}")]
    #[diagnostic(code(calendar_pulse::reminder))]
    Reminder(String),

    #[error("Environment error: {0}")]
    #[diagnostic(code(calendar_pulse::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(calendar_pulse::config))]
    Config(String),

    #[error("Component error: {0}")]
    #[diagnostic(code(calendar_pulse::component))]
    Component(String),

    #[error(transparent)]
    #[diagnostic(code(calendar_pulse::io))]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(calendar_pulse::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(calendar_pulse::other))]
    Other(String),
}

impl Error {
    /// Whether the failure is expected to clear up on a later pass
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::ActivityService(_) | Error::Reminder(_))
    }
}

// Implement From for TOML deserialization errors
impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type PulseResult<T> = Result<T, Error>;

/// Helper to create not-found errors
pub fn not_found(message: &str) -> Error {
    Error::NotFound(message.to_string())
}

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Invalid environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create component errors
pub fn component_error(message: &str) -> Error {
    Error::Component(message.to_string())
}

/// Helper to create event store errors
pub fn event_store_error(message: &str) -> Error {
    Error::EventStore(message.to_string())
}

/// Helper to create live activity service errors
pub fn activity_error(message: &str) -> Error {
    Error::ActivityService(message.to_string())
}

/// Helper to create reminder errors
pub fn reminder_error(message: &str) -> Error {
    Error::Reminder(message.to_string())
}

/// Helper to create other errors
pub fn other_error(message: &str) -> Error {
    Error::Other(message.to_string())
}
