//! Common test utilities for integration tests.
//!
//! Reusable stream fixtures and controller setup helpers.
//!
//! # Example
//!
//! ```ignore
//! let client = MockHttpConfig::new().with_default_chunks([token_frame("hi"), DONE_FRAME.into()]).build();
//! let (controller, sink) = test_controller(&client);
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use serde_json::Value;
use tokenwire::config::StreamConfig;
use tokenwire::sse::Metadata;
use tokenwire::stream::StreamController;

/// Address used by controller tests.
pub const TEST_URL: &str = "http://tokenwire.test/v1/stream";

/// `[DONE]` sentinel frame.
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Controller type used throughout the tests.
pub type TestController = StreamController<MockHttpClient, RecordingSink>;

/// Named token frame.
pub fn token_frame(text: &str) -> String {
    format!(
        "event: token\ndata: {}\n\n",
        serde_json::json!({ "token": text })
    )
}

/// Named done frame carrying `meta`.
pub fn done_frame(meta: Value) -> String {
    format!("event: done\ndata: {}\n\n", serde_json::json!({ "meta": meta }))
}

/// Named server error frame.
pub fn error_frame(message: &str) -> String {
    format!(
        "event: error\ndata: {}\n\n",
        serde_json::json!({ "error": { "message": message } })
    )
}

/// JSON object literal as metadata.
pub fn meta(value: Value) -> Metadata {
    value.as_object().cloned().unwrap_or_default()
}

/// A well-formed stream mixing CRLF, multi-byte text, inference and comments.
pub fn sample_stream() -> Vec<u8> {
    [
        ": keep-alive\r\n\r\n",
        "event: token\r\ndata: {\"token\":\"héllo \"}\r\n\r\n",
        "data: {\"token\":\"👋 wörld\"}\r\n\r\n",
        "event: token\ndata: {\"token\":\ndata: \"€\"}\n\n",
        "id: 7\nevent: done\ndata: {\"meta\":{\"finish_reason\":\"stop\"}}\n\n",
    ]
    .concat()
    .into_bytes()
}

/// Controller over `client` reporting into a fresh sink.
pub fn test_controller(client: &MockHttpClient) -> (TestController, RecordingSink) {
    test_controller_with(client, StreamConfig::default())
}

/// Same as `test_controller` with a custom config.
pub fn test_controller_with(
    client: &MockHttpClient,
    config: StreamConfig,
) -> (TestController, RecordingSink) {
    let sink = RecordingSink::new();
    let controller = StreamController::new(client.clone(), sink.clone(), config);
    (controller, sink)
}
