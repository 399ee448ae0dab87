//! Event Model
//!
//! Inbound events from both sources and the notification handed to the
//! dispatcher.

pub mod github;
pub mod system;

pub use github::{GithubEventKind, InboundWebhookEvent};
pub use system::PubSubEvent;

use serde_json::Value;

/// A rendered message bound for a single chat channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedNotification {
    pub destination_channel_id: u64,
    pub text: String,
}

impl FormattedNotification {
    pub fn new(destination_channel_id: u64, text: impl Into<String>) -> Self {
        Self {
            destination_channel_id,
            text: text.into(),
        }
    }
}

/// Upper-case the first character and lower-case the rest.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Text of an optional JSON field.
///
/// Strings are used verbatim, other values as JSON text, `null` as absent.
pub(crate) fn field_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{capitalize, field_text};

    #[test]
    fn capitalize_lowers_the_tail() {
        assert_eq!(capitalize("opened"), "Opened");
        assert_eq!(capitalize("CLOSED"), "Closed");
        assert_eq!(capitalize("ready_for_review"), "Ready_for_review");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn field_text_renders_non_strings_as_json() {
        assert_eq!(field_text(Some(&json!("main"))).as_deref(), Some("main"));
        assert_eq!(field_text(Some(&json!(42))).as_deref(), Some("42"));
        assert_eq!(field_text(Some(&json!(false))).as_deref(), Some("false"));
        assert_eq!(field_text(Some(&json!(null))), None);
        assert_eq!(field_text(None), None);
    }
}
