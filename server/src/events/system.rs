//! System Events
//!
//! Structured events published on the bus by other internal services.
//!
//! Expected shape: `{"type": "disk_warning", "message": "90% full"}`. Extra
//! fields are ignored.

use serde_json::Value;

use super::field_text;

/// A bus event, alive only until it has been rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubSubEvent {
    pub event_type: String,
    pub message: String,
}

impl PubSubEvent {
    /// Build an event from a decoded JSON object.
    ///
    /// Returns `None` when the value is not an object.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        Some(Self {
            event_type: field_text(object.get("type")).unwrap_or_else(|| "unknown".to_string()),
            message: field_text(object.get("message"))
                .unwrap_or_else(|| "No details provided".to_string()),
        })
    }

    /// Render the chat message for this event.
    pub fn render(&self) -> String {
        format!("**System Event ({})**: {}", self.event_type, self.message)
    }
}
