//! Session snapshots and lifecycle states.
//!
//! A `StreamSession` is never mutated in place: each transition builds a new
//! value, which the controller publishes on its watch channel.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::sse::{DomainEvent, Metadata};

/// Lifecycle state of a session.
///
/// `Completed`, `Errored` and `Aborted` are resting states: the controller is
/// idle again until the next `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    /// No session has been started
    Idle,
    /// Request issued, waiting for the response head
    Starting,
    /// Reading the response body
    Streaming,
    /// A `done` event was received
    Completed,
    /// An error was reported
    Errored,
    /// Cancelled by `stop` or a newer `start`
    Aborted,
}

impl StreamState {
    /// True while a request is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, StreamState::Starting | StreamState::Streaming)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamState::Idle => "idle",
            StreamState::Starting => "starting",
            StreamState::Streaming => "streaming",
            StreamState::Completed => "completed",
            StreamState::Errored => "errored",
            StreamState::Aborted => "aborted",
        }
    }
}

impl std::fmt::Display for StreamState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "payload", rename_all = "snake_case")]
pub enum SessionOutcome {
    /// `done` received, with its metadata
    Done(Metadata),
    /// Error reported, with its descriptor
    Error(Metadata),
    /// Cancelled; nothing was reported for the cancellation
    Aborted,
}

impl SessionOutcome {
    /// Outcome implied by a terminal event. `Token` is never terminal.
    pub fn from_terminal(event: &DomainEvent) -> Option<Self> {
        match event {
            DomainEvent::Done(meta) => Some(SessionOutcome::Done(meta.clone())),
            DomainEvent::Error(descriptor) => Some(SessionOutcome::Error(descriptor.clone())),
            DomainEvent::Token(_) => None,
        }
    }

    /// The resting state this outcome leaves the controller in.
    pub fn state(&self) -> StreamState {
        match self {
            SessionOutcome::Done(_) => StreamState::Completed,
            SessionOutcome::Error(_) => StreamState::Errored,
            SessionOutcome::Aborted => StreamState::Aborted,
        }
    }

    /// Error descriptor `message`, if this is an error outcome.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionOutcome::Error(descriptor) => descriptor.get("message").and_then(Value::as_str),
            _ => None,
        }
    }
}

/// Immutable snapshot of one streaming request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamSession {
    pub id: Uuid,
    pub address: String,
    pub payload: Value,
    pub state: StreamState,
    /// Set once a `done` event has been observed
    pub done_received: bool,
    pub outcome: Option<SessionOutcome>,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StreamSession {
    /// Create a session in the `Starting` state.
    pub fn new(address: impl Into<String>, payload: Value) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            address: address.into(),
            payload,
            state: StreamState::Starting,
            done_received: false,
            outcome: None,
            started_at: now,
            updated_at: now,
        }
    }

    /// Snapshot after the response head was accepted.
    pub fn streaming(&self) -> Self {
        Self {
            state: StreamState::Streaming,
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    /// Snapshot after the session ended with `outcome`.
    pub fn finished(&self, outcome: SessionOutcome) -> Self {
        Self {
            state: outcome.state(),
            done_received: matches!(outcome, SessionOutcome::Done(_)),
            outcome: Some(outcome),
            updated_at: Utc::now(),
            ..self.clone()
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Milliseconds between start and the latest transition.
    pub fn elapsed_ms(&self) -> i64 {
        (self.updated_at - self.started_at).num_milliseconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_session_is_starting() {
        let session = StreamSession::new("http://test/chat", json!({"q": "hi"}));
        assert_eq!(session.state, StreamState::Starting);
        assert!(session.is_active());
        assert!(!session.done_received);
        assert!(session.outcome.is_none());
    }

    #[test]
    fn test_transitions_build_new_values() {
        let session = StreamSession::new("http://test/chat", Value::Null);
        let streaming = session.streaming();
        assert_eq!(session.state, StreamState::Starting);
        assert_eq!(streaming.state, StreamState::Streaming);
        assert_eq!(streaming.id, session.id);

        let done = streaming.finished(SessionOutcome::Done(Metadata::new()));
        assert_eq!(done.state, StreamState::Completed);
        assert!(done.done_received);
        assert!(!done.is_active());
        assert!(done.elapsed_ms() >= 0);
    }

    #[test]
    fn test_error_outcome() {
        let session = StreamSession::new("http://test/chat", Value::Null)
            .finished(SessionOutcome::from_terminal(&DomainEvent::error("http_error")).unwrap());
        assert_eq!(session.state, StreamState::Errored);
        assert!(!session.done_received);
        assert_eq!(
            session.outcome.as_ref().and_then(|o| o.error_message()),
            Some("http_error")
        );
    }

    #[test]
    fn test_token_is_not_an_outcome() {
        assert!(SessionOutcome::from_terminal(&DomainEvent::Token("x".to_string())).is_none());
    }

    #[test]
    fn test_state_activity() {
        assert!(!StreamState::Idle.is_active());
        assert!(StreamState::Starting.is_active());
        assert!(StreamState::Streaming.is_active());
        assert!(!StreamState::Completed.is_active());
        assert!(!StreamState::Errored.is_active());
        assert!(!StreamState::Aborted.is_active());
        assert_eq!(StreamState::Aborted.to_string(), "aborted");
    }
}
