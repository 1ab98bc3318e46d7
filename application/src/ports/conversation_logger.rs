//! Port for structured conversation logging.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures the meeting
//! transcript and lifecycle moments in a machine-readable format (JSONL).

use serde_json::Value;

/// A structured log record.
///
/// Each record has a type string and a JSON payload with record-specific
/// fields; the adapter stamps the timestamp on write.
pub struct LogEvent {
    /// Record type identifier (e.g., "message_persisted", "round_started").
    pub event_type: &'static str,
    /// JSON payload with record-specific data.
    pub payload: Value,
}

impl LogEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging conversation records to a structured log.
///
/// The `log` method is intentionally synchronous and non-fallible to avoid
/// disrupting the conversation loop — logging failures are silently ignored.
pub trait ConversationLogger: Send + Sync {
    fn log(&self, event: LogEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: LogEvent) {}
}
