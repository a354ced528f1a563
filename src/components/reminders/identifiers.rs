/// Namespace shared by every reminder this crate schedules
pub const IDENTIFIER_PREFIX: &str = "calendarpulse.event.";

/// Replace everything but letters and digits, which the scheduler rejects in identifiers
pub fn sanitized_identifier(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Identifier of the reminder fired ahead of the event
pub fn before_identifier(event_id: &str) -> String {
    format!("{}{}.before", IDENTIFIER_PREFIX, sanitized_identifier(event_id))
}

/// Identifier of the reminder fired at the event start
pub fn start_identifier(event_id: &str) -> String {
    format!("{}{}.start", IDENTIFIER_PREFIX, sanitized_identifier(event_id))
}

pub fn is_event_reminder(identifier: &str) -> bool {
    identifier.starts_with(IDENTIFIER_PREFIX)
}
