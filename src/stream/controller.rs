//! Streaming session lifecycle.
//!
//! `StreamController` runs at most one session at a time. Each session is a
//! spawned task that issues the request, reads the body through a
//! `StreamDecoder` and reports events to the sink. Cancellation is checked at
//! both suspension points: while waiting for the response and while waiting
//! for the next chunk.

use std::sync::Arc;

use bytes::BytesMut;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::session::{SessionOutcome, StreamSession, StreamState};
use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::sse::{Dispatched, StreamDecoder};
use crate::traits::{ByteStream, EventSink, Headers, HttpClient};

/// Request content type.
pub const CONTENT_TYPE_JSON: &str = "application/json";
/// Accepted response type.
pub const ACCEPT_EVENT_STREAM: &str = "text/event-stream";

type SessionWatch = watch::Sender<Option<StreamSession>>;

/// Handle to the running session task.
struct ActiveSession {
    id: Uuid,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl ActiveSession {
    /// Cancel and wait for the task to exit. Returns true if it was still running.
    async fn abort(self) -> bool {
        let was_running = !self.handle.is_finished();
        self.token.cancel();
        if let Err(e) = self.handle.await {
            warn!(session_id = %self.id, error = %e, "Session task failed");
        }
        was_running
    }
}

/// Owns the lifecycle of one streaming request at a time.
///
/// # Example
///
/// ```ignore
/// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
/// let controller = StreamController::new(ReqwestHttpClient::new(), tx, StreamConfig::default());
/// controller.start("https://api.example.com/chat", json!({"prompt": "hi"})).await;
/// while let Some(event) = rx.recv().await { /* render */ }
/// ```
pub struct StreamController<C, S> {
    client: Arc<C>,
    sink: Arc<S>,
    config: Arc<StreamConfig>,
    active: Mutex<Option<ActiveSession>>,
    state_tx: Arc<SessionWatch>,
}

impl<C, S> StreamController<C, S>
where
    C: HttpClient + 'static,
    S: EventSink + 'static,
{
    /// Create a controller reporting to `sink`.
    pub fn new(client: C, sink: S, config: StreamConfig) -> Self {
        let (state_tx, _) = watch::channel(None);
        Self {
            client: Arc::new(client),
            sink: Arc::new(sink),
            config: Arc::new(config),
            active: Mutex::new(None),
            state_tx: Arc::new(state_tx),
        }
    }

    /// Start a session, aborting the current one first.
    ///
    /// The previous task has exited before the new request is issued, so no
    /// event from it can follow an event from the new session.
    pub async fn start(&self, address: impl Into<String>, payload: Value) -> Uuid {
        let mut active = self.active.lock().await;

        if let Some(previous) = active.take() {
            let previous_id = previous.id;
            if previous.abort().await {
                info!(session_id = %previous_id, "Aborted previous session");
            }
        }

        let session = StreamSession::new(address, payload);
        let id = session.id;
        let token = CancellationToken::new();
        self.state_tx.send_replace(Some(session.clone()));

        let task = SessionTask {
            client: Arc::clone(&self.client),
            sink: Arc::clone(&self.sink),
            config: Arc::clone(&self.config),
            state_tx: Arc::clone(&self.state_tx),
            token: token.clone(),
        };
        let span = info_span!("session", session_id = %id);
        let handle = tokio::spawn(task.run(session).instrument(span));

        *active = Some(ActiveSession { id, token, handle });
        id
    }

    /// Cancel the active session, if any, and wait for its task to exit.
    ///
    /// Nothing is reported for the cancellation. Returns true if a session
    /// was actually running.
    pub async fn stop(&self) -> bool {
        let previous = self.active.lock().await.take();
        match previous {
            Some(session) => {
                let id = session.id;
                let stopped = session.abort().await;
                if stopped {
                    info!(session_id = %id, "Session stopped");
                }
                stopped
            }
            None => false,
        }
    }

    /// Wait until the current session ends and return how it ended.
    ///
    /// Returns `None` if no session was ever started.
    pub async fn wait(&self) -> Option<SessionOutcome> {
        let mut rx = self.state_tx.subscribe();
        let snapshot = rx
            .wait_for(|s| s.as_ref().map_or(true, |s| !s.is_active()))
            .await
            .ok()?;
        snapshot.as_ref().and_then(|s| s.outcome.clone())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        self.state_tx
            .borrow()
            .as_ref()
            .map_or(StreamState::Idle, |s| s.state)
    }

    /// Latest session snapshot.
    pub fn session(&self) -> Option<StreamSession> {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to session snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Option<StreamSession>> {
        self.state_tx.subscribe()
    }

    /// True when no session is in flight, including after a session ended.
    pub fn is_idle(&self) -> bool {
        !self.state().is_active()
    }
}

impl<C, S> Drop for StreamController<C, S> {
    fn drop(&mut self) {
        if let Some(active) = self.active.get_mut().take() {
            active.token.cancel();
        }
    }
}

/// Everything a session task needs, detached from the controller.
struct SessionTask<C, S> {
    client: Arc<C>,
    sink: Arc<S>,
    config: Arc<StreamConfig>,
    state_tx: Arc<SessionWatch>,
    token: CancellationToken,
}

impl<C, S> SessionTask<C, S>
where
    C: HttpClient,
    S: EventSink,
{
    async fn run(self, session: StreamSession) {
        info!(address = %session.address, "Starting stream");
        let outcome = self.drive(&session).await;
        let finished = session.finished(outcome);

        match &finished.outcome {
            Some(SessionOutcome::Done(_)) => {
                info!(elapsed_ms = finished.elapsed_ms(), "Stream completed")
            }
            Some(SessionOutcome::Aborted) => info!("Stream aborted"),
            Some(outcome @ SessionOutcome::Error(_)) => warn!(
                error = outcome.error_message().unwrap_or_default(),
                "Stream ended with error"
            ),
            None => {}
        }

        self.state_tx.send_replace(Some(finished));
    }

    async fn drive(&self, session: &StreamSession) -> SessionOutcome {
        let body = match request_body(&session.payload) {
            Ok(body) => body,
            Err(e) => {
                return self.fail(StreamError::StartFailed {
                    detail: e.to_string(),
                })
            }
        };
        let headers = self.request_headers();

        let response = tokio::select! {
            biased;
            _ = self.token.cancelled() => return SessionOutcome::Aborted,
            result = self.client.post_stream(&session.address, &body, &headers) => result,
        };

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return self.fail(StreamError::StartFailed {
                    detail: e.to_string(),
                })
            }
        };

        if !response.is_success() {
            let status = response.status;
            let Some(body) = self.read_error_body(response.body).await else {
                return SessionOutcome::Aborted;
            };
            return self.fail(StreamError::HttpStatus { status, body });
        }

        let Some(body) = response.body else {
            return self.fail(StreamError::NoResponseBody);
        };

        self.state_tx.send_replace(Some(session.streaming()));
        self.read(body).await
    }

    async fn read(&self, mut body: ByteStream) -> SessionOutcome {
        let mut decoder = StreamDecoder::new(&self.config.decoder);
        let mut read_error = None;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return SessionOutcome::Aborted,
                next = body.next() => next,
            };

            match next {
                Some(Ok(chunk)) => {
                    debug!(bytes = chunk.len(), "Received chunk");
                    if let Some(outcome) = self.report(decoder.feed(&chunk)) {
                        return outcome;
                    }
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Stream read failed");
                    read_error = Some(e);
                    break;
                }
                None => {
                    debug!("Stream source completed");
                    break;
                }
            }
        }

        // Drop the connection before flushing
        drop(body);

        if let Some(outcome) = self.report(decoder.finish()) {
            return outcome;
        }

        match read_error {
            Some(e) => self.fail(StreamError::ReadFailed {
                detail: e.to_string(),
            }),
            None => self.fail(StreamError::ClosedBeforeDone),
        }
    }

    /// Emit dispatched events in order. Returns the outcome if one was terminal.
    fn report(&self, dispatched: Vec<Dispatched>) -> Option<SessionOutcome> {
        for result in dispatched {
            if self.token.is_cancelled() {
                return Some(SessionOutcome::Aborted);
            }
            let outcome = if result.terminal {
                SessionOutcome::from_terminal(&result.event)
            } else {
                None
            };
            self.sink.emit(result.event);
            if outcome.is_some() {
                return outcome;
            }
        }
        None
    }

    /// Report a client-side failure, unless the session was cancelled.
    fn fail(&self, error: StreamError) -> SessionOutcome {
        if self.token.is_cancelled() {
            return SessionOutcome::Aborted;
        }
        let category = error.category();
        warn!(
            kind = error.kind(),
            %category,
            fatal = category.is_fatal(),
            "{}",
            error
        );
        let descriptor = error.to_descriptor();
        self.sink.emit(error.into_event());
        SessionOutcome::Error(descriptor)
    }

    /// Read a non-2xx body to the end. `None` if cancelled meanwhile.
    async fn read_error_body(&self, body: Option<ByteStream>) -> Option<String> {
        let Some(mut body) = body else {
            return Some(String::new());
        };

        let mut buf = BytesMut::new();
        loop {
            let next = tokio::select! {
                biased;
                _ = self.token.cancelled() => return None,
                next = body.next() => next,
            };
            match next {
                Some(Ok(chunk)) => buf.extend_from_slice(&chunk),
                Some(Err(e)) => {
                    debug!(error = %e, "Error body read failed, using partial body");
                    break;
                }
                None => break,
            }
        }

        Some(String::from_utf8_lossy(&buf).into_owned())
    }

    fn request_headers(&self) -> Headers {
        let mut headers = self.config.headers.clone();
        headers.insert("content-type".to_string(), CONTENT_TYPE_JSON.to_string());
        headers.insert("accept".to_string(), ACCEPT_EVENT_STREAM.to_string());
        headers
    }
}

/// Serialize the request payload. A null payload is sent as `{}`.
fn request_body(payload: &Value) -> serde_json::Result<String> {
    match payload {
        Value::Null => Ok("{}".to_string()),
        payload => serde_json::to_string(payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockChunk, MockHttpClient, MockResponse, RecordingSink};
    use crate::sse::DomainEvent;
    use serde_json::json;

    fn controller(client: &MockHttpClient, sink: &RecordingSink) -> StreamController<MockHttpClient, RecordingSink> {
        StreamController::new(client.clone(), sink.clone(), StreamConfig::default())
    }

    #[tokio::test]
    async fn test_idle_before_start() {
        let client = MockHttpClient::new();
        let sink = RecordingSink::new();
        let controller = controller(&client, &sink);
        assert_eq!(controller.state(), StreamState::Idle);
        assert!(controller.is_idle());
        assert!(controller.wait().await.is_none());
        assert!(!controller.stop().await);
    }

    #[tokio::test]
    async fn test_token_and_done() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::chunks([
            "event: token\ndata: {\"token\":\"hi\"}\n\n",
            "event: done\ndata: {\"meta\":{}}\n\n",
        ]));
        let sink = RecordingSink::new();
        let controller = controller(&client, &sink);

        controller.start("http://test/chat", json!({"q": 1})).await;
        let outcome = controller.wait().await;

        assert!(matches!(outcome, Some(SessionOutcome::Done(_))));
        assert_eq!(controller.state(), StreamState::Completed);
        assert!(controller.is_idle());
        assert_eq!(
            sink.events(),
            vec![
                DomainEvent::Token("hi".to_string()),
                DomainEvent::Done(Default::default()),
            ]
        );
    }

    #[tokio::test]
    async fn test_request_shape() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::chunks(["data: [DONE]\n\n"]));
        let sink = RecordingSink::new();
        let controller = StreamController::new(
            client.clone(),
            sink.clone(),
            StreamConfig::default().with_header("x-csrf-token", "abc"),
        );

        controller.start("http://test/chat", json!({"prompt": "hi"})).await;
        controller.wait().await;

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.url, "http://test/chat");
        assert_eq!(request.body, r#"{"prompt":"hi"}"#);
        assert_eq!(request.headers.get("content-type").map(String::as_str), Some("application/json"));
        assert_eq!(request.headers.get("accept").map(String::as_str), Some("text/event-stream"));
        assert_eq!(request.headers.get("x-csrf-token").map(String::as_str), Some("abc"));
    }

    #[tokio::test]
    async fn test_null_payload_sent_as_empty_object() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::chunks(["data: [DONE]\n\n"]));
        let sink = RecordingSink::new();
        let controller = controller(&client, &sink);

        controller.start("http://test/chat", Value::Null).await;
        controller.wait().await;

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].body, "{}");
    }

    #[test]
    fn test_request_body() {
        assert_eq!(request_body(&Value::Null).unwrap(), "{}");
        assert_eq!(request_body(&json!([])).unwrap(), "[]");
        assert_eq!(request_body(&json!({"a": 1})).unwrap(), r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_stop_is_silent() {
        let client = MockHttpClient::new();
        client.set_default_response(MockResponse::script(vec![
            MockChunk::data("event: token\ndata: {\"token\":\"a\"}\n\n"),
            MockChunk::Stall,
        ]));
        let sink = RecordingSink::new();
        let controller = controller(&client, &sink);

        controller.start("http://test/chat", Value::Null).await;
        let mut rx = controller.subscribe();
        rx.wait_for(|s| s.as_ref().is_some_and(|s| s.state == StreamState::Streaming))
            .await
            .unwrap();

        assert!(!controller.is_idle());
        assert!(controller.stop().await);
        assert_eq!(controller.state(), StreamState::Aborted);
        assert!(controller.is_idle());
        assert_eq!(controller.wait().await, Some(SessionOutcome::Aborted));
        assert!(sink.error_messages().is_empty());
        assert!(!controller.stop().await);
    }
}
