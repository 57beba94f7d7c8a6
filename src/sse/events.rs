//! Domain event types
//!
//! Contains the closed set of events the decoder can surface to the UI layer,
//! plus the raw line and frame shapes produced while reading the wire format.

use serde::Serialize;
use serde_json::{Map, Value};

/// Free-form string → value mapping carried by `Done` and `Error` events.
pub type Metadata = Map<String, Value>;

/// Events reported to the UI collaborator.
///
/// Exactly one of these (or none) is produced per frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DomainEvent {
    /// Incremental output text
    Token(String),
    /// Stream finished; carries the server's `meta` object (possibly empty)
    Done(Metadata),
    /// Stream failed; descriptor always contains a `message` field
    Error(Metadata),
}

impl DomainEvent {
    /// Returns the event name as used on the wire and in logs.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            DomainEvent::Token(_) => "token",
            DomainEvent::Done(_) => "done",
            DomainEvent::Error(_) => "error",
        }
    }

    /// `Done` and `Error` end the session once observed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DomainEvent::Done(_) | DomainEvent::Error(_))
    }

    /// Build an error event carrying only a `message` kind.
    pub fn error(message: impl Into<String>) -> Self {
        Self::error_with(message, Metadata::new())
    }

    /// Build an error event from a `message` kind plus extra descriptor fields.
    pub fn error_with(message: impl Into<String>, extra: Metadata) -> Self {
        let mut descriptor = Metadata::new();
        descriptor.insert("message".to_string(), Value::String(message.into()));
        descriptor.extend(extra);
        DomainEvent::Error(descriptor)
    }

    /// The `message` field of an error descriptor, if this is an error.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            DomainEvent::Error(descriptor) => descriptor.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// A frame pulled off the wire: optional event name plus joined data lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Frame {
    /// Value of the `event:` line, if the frame had one
    pub event: Option<String>,
    /// `data:` lines joined with `\n`; `None` when the frame had no data lines
    pub data: Option<String>,
}

impl Frame {
    /// Data payload with the "no data lines" case folded to an empty string.
    pub fn data_or_empty(&self) -> &str {
        self.data.as_deref().unwrap_or("")
    }
}

/// Represents a parsed SSE line
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: token")
    Event(String),
    /// Data payload (e.g., "data: {\"token\": \"hi\"}")
    Data(String),
    /// Empty line
    Empty,
    /// Comment line (starts with ':') or a field this client ignores
    Comment(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_type_name() {
        assert_eq!(DomainEvent::Token("a".to_string()).event_type_name(), "token");
        assert_eq!(DomainEvent::Done(Metadata::new()).event_type_name(), "done");
        assert_eq!(
            DomainEvent::error("http_error").event_type_name(),
            "error"
        );
    }

    #[test]
    fn test_terminal_events() {
        assert!(!DomainEvent::Token("a".to_string()).is_terminal());
        assert!(DomainEvent::Done(Metadata::new()).is_terminal());
        assert!(DomainEvent::error("x").is_terminal());
    }

    #[test]
    fn test_error_builder_includes_message_and_extra() {
        let mut extra = Metadata::new();
        extra.insert("status".to_string(), json!(502));
        let event = DomainEvent::error_with("http_error", extra);
        assert_eq!(event.error_message(), Some("http_error"));
        match event {
            DomainEvent::Error(descriptor) => assert_eq!(descriptor["status"], json!(502)),
            _ => panic!("Expected Error event"),
        }
    }

    #[test]
    fn test_serialize_shape() {
        let value = serde_json::to_value(DomainEvent::Token("hi".to_string())).unwrap();
        assert_eq!(value, json!({"type": "token", "payload": "hi"}));
    }

    #[test]
    fn test_frame_data_or_empty() {
        let frame = Frame {
            event: Some("done".to_string()),
            data: None,
        };
        assert_eq!(frame.data_or_empty(), "");
    }
}
