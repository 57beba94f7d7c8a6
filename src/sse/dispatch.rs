//! Frame → domain event interpretation
//!
//! Maps a parsed frame onto `Token`, `Done` or `Error`. Named events are
//! handled directly; frames without an `event:` line are either inferred
//! from the payload's fields or dropped, depending on configuration.

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::{DecoderConfig, TokenParseFailure};
use crate::error::{kind, StreamError};
use crate::sse::events::{DomainEvent, Frame, Metadata};

/// Payload some providers send instead of a named `done` event.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One event produced from a frame, and whether it ends the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatched {
    pub event: DomainEvent,
    pub terminal: bool,
}

impl Dispatched {
    fn new(event: DomainEvent) -> Self {
        let terminal = event.is_terminal();
        Self { event, terminal }
    }
}

/// Interprets frames into domain events.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    infer_event_name: bool,
    token_parse_failure: TokenParseFailure,
}

impl EventDispatcher {
    /// Create a dispatcher using the inference and parse-failure settings of `config`.
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            infer_event_name: config.infer_event_name,
            token_parse_failure: config.token_parse_failure,
        }
    }

    /// Produce zero or one event for `frame`.
    pub fn dispatch(&self, frame: &Frame) -> Option<Dispatched> {
        let data = frame.data_or_empty();

        if data == DONE_SENTINEL {
            return Some(Dispatched::new(DomainEvent::Done(Metadata::new())));
        }

        match frame.event.as_deref() {
            Some("token") => self.dispatch_token(data),
            Some("done") => Some(dispatch_done(data)),
            Some("error") => Some(dispatch_error(data)),
            Some(other) => {
                debug!(event = other, "Ignoring unrecognized event");
                None
            }
            None if self.infer_event_name => infer_from_payload(data),
            None => {
                debug!("Ignoring frame without event name");
                None
            }
        }
    }

    fn dispatch_token(&self, data: &str) -> Option<Dispatched> {
        match parse_payload(data) {
            Ok(payload) => {
                let event = token_event(&payload);
                if event.is_none() {
                    warn!("Token frame has no token field, dropping");
                }
                event.map(Dispatched::new)
            }
            Err(e) => {
                warn!(error = %e, "Failed to parse token frame");
                let event = StreamError::TokenParse {
                    detail: e.to_string(),
                }
                .into_event();
                Some(Dispatched {
                    event,
                    terminal: self.token_parse_failure == TokenParseFailure::Terminate,
                })
            }
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(&DecoderConfig::default())
    }
}

fn dispatch_done(data: &str) -> Dispatched {
    match parse_payload(data) {
        Ok(payload) => Dispatched::new(done_event(&payload)),
        Err(e) => {
            warn!(error = %e, "Failed to parse done frame");
            Dispatched::new(
                StreamError::DoneParse {
                    detail: e.to_string(),
                }
                .into_event(),
            )
        }
    }
}

fn dispatch_error(data: &str) -> Dispatched {
    match parse_payload(data) {
        Ok(payload) => Dispatched::new(error_event(&payload)),
        Err(e) => {
            warn!(error = %e, "Failed to parse server error frame");
            Dispatched::new(
                StreamError::ErrorFrameParse {
                    detail: e.to_string(),
                }
                .into_event(),
            )
        }
    }
}

/// Pick the event from the payload's fields: `token`, then `meta`, then `error`.
fn infer_from_payload(data: &str) -> Option<Dispatched> {
    let payload = match serde_json::from_str::<Value>(data) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "Dropping unnamed frame with unparsable data");
            return None;
        }
    };

    let event = if payload.get("token").is_some() {
        token_event(&payload)
    } else if payload.get("meta").is_some() {
        Some(done_event(&payload))
    } else if payload.get("error").is_some() {
        Some(error_event(&payload))
    } else {
        debug!("Dropping unnamed frame with unrecognized shape");
        None
    };

    event.map(Dispatched::new)
}

/// Empty data is read as an empty object.
fn parse_payload(data: &str) -> Result<Value, serde_json::Error> {
    if data.trim().is_empty() {
        return Ok(Value::Object(Metadata::new()));
    }
    serde_json::from_str(data)
}

fn token_event(payload: &Value) -> Option<DomainEvent> {
    match payload.get("token")? {
        Value::Null => None,
        Value::String(text) => Some(DomainEvent::Token(text.clone())),
        other => Some(DomainEvent::Token(other.to_string())),
    }
}

fn done_event(payload: &Value) -> DomainEvent {
    let meta = payload
        .get("meta")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    DomainEvent::Done(meta)
}

fn error_event(payload: &Value) -> DomainEvent {
    let descriptor = match payload.get("error") {
        Some(Value::Object(fields)) => {
            let mut descriptor = fields.clone();
            descriptor
                .entry("message")
                .or_insert_with(|| Value::from(kind::UNKNOWN_ERROR));
            descriptor
        }
        Some(Value::String(message)) => {
            let mut descriptor = Metadata::new();
            descriptor.insert("message".to_string(), Value::from(message.as_str()));
            descriptor
        }
        Some(Value::Null) | None => unknown_error(),
        Some(other) => {
            let mut descriptor = unknown_error();
            descriptor.insert("detail".to_string(), other.clone());
            descriptor
        }
    };
    DomainEvent::Error(descriptor)
}

fn unknown_error() -> Metadata {
    let mut descriptor = Metadata::new();
    descriptor.insert("message".to_string(), Value::from(kind::UNKNOWN_ERROR));
    descriptor
}
