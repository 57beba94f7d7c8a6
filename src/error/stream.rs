//! Streaming-related error types.
//!
//! Every client-side failure a session can report. Each variant maps to the
//! `message` kind that appears in the error descriptor sent to the UI.

use std::fmt;

use serde_json::Value;

use super::ErrorCategory;
use crate::sse::{DomainEvent, Metadata};

/// Wire `message` kinds for client-side failures.
pub mod kind {
    pub const HTTP_ERROR: &str = "http_error";
    pub const NO_RESPONSE_BODY: &str = "no_response_body";
    pub const STREAM_CLOSED_BEFORE_DONE: &str = "stream_closed_before_done";
    pub const TOKEN_PARSE_FAILED: &str = "token_parse_failed";
    pub const DONE_PARSE_FAILED: &str = "done_parse_failed";
    pub const SERVER_ERROR_FRAME_PARSE_FAILED: &str = "server_error_frame_parse_failed";
    pub const CLIENT_STREAM_START_FAILED: &str = "client_stream_start_failed";
    pub const FETCH_STREAM_ERROR: &str = "fetch_stream_error";
    /// Used when a server `error` frame has no usable message
    pub const UNKNOWN_ERROR: &str = "unknown_error";
}

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Server answered with a non-2xx status.
    HttpStatus { status: u16, body: String },

    /// Response carried no readable body.
    NoResponseBody,

    /// Source completed without a `done` or `error` event.
    ClosedBeforeDone,

    /// A `token` frame's data was not valid JSON.
    TokenParse { detail: String },

    /// A `done` frame's data was not valid JSON.
    DoneParse { detail: String },

    /// An `error` frame's data was not valid JSON.
    ErrorFrameParse { detail: String },

    /// The request could not be issued.
    StartFailed { detail: String },

    /// Reading the response body failed mid-stream.
    ReadFailed { detail: String },
}

impl StreamError {
    /// The `message` value reported in the error descriptor.
    pub fn kind(&self) -> &'static str {
        match self {
            StreamError::HttpStatus { .. } => kind::HTTP_ERROR,
            StreamError::NoResponseBody => kind::NO_RESPONSE_BODY,
            StreamError::ClosedBeforeDone => kind::STREAM_CLOSED_BEFORE_DONE,
            StreamError::TokenParse { .. } => kind::TOKEN_PARSE_FAILED,
            StreamError::DoneParse { .. } => kind::DONE_PARSE_FAILED,
            StreamError::ErrorFrameParse { .. } => kind::SERVER_ERROR_FRAME_PARSE_FAILED,
            StreamError::StartFailed { .. } => kind::CLIENT_STREAM_START_FAILED,
            StreamError::ReadFailed { .. } => kind::FETCH_STREAM_ERROR,
        }
    }

    /// High-level category for handling decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::HttpStatus { .. }
            | StreamError::NoResponseBody
            | StreamError::StartFailed { .. }
            | StreamError::ReadFailed { .. } => ErrorCategory::Transport,
            StreamError::ClosedBeforeDone => ErrorCategory::Truncation,
            StreamError::TokenParse { .. }
            | StreamError::DoneParse { .. }
            | StreamError::ErrorFrameParse { .. } => ErrorCategory::FrameParse,
        }
    }

    /// Build the descriptor mapping: `message` plus variant detail.
    pub fn to_descriptor(&self) -> Metadata {
        let mut descriptor = Metadata::new();
        descriptor.insert("message".to_string(), Value::from(self.kind()));

        match self {
            StreamError::HttpStatus { status, body } => {
                descriptor.insert("status".to_string(), Value::from(*status));
                descriptor.insert("body".to_string(), Value::from(body.as_str()));
            }
            StreamError::TokenParse { detail }
            | StreamError::DoneParse { detail }
            | StreamError::ErrorFrameParse { detail }
            | StreamError::StartFailed { detail }
            | StreamError::ReadFailed { detail } => {
                descriptor.insert("detail".to_string(), Value::from(detail.as_str()));
            }
            StreamError::NoResponseBody | StreamError::ClosedBeforeDone => {}
        }

        descriptor
    }

    /// Convert into the `Error` event reported to the UI.
    pub fn into_event(self) -> DomainEvent {
        DomainEvent::Error(self.to_descriptor())
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::HttpStatus { status, .. } => {
                write!(f, "Server responded with HTTP {}", status)
            }
            StreamError::NoResponseBody => write!(f, "Response has no readable body"),
            StreamError::ClosedBeforeDone => {
                write!(f, "Stream closed before a done event was received")
            }
            StreamError::TokenParse { detail } => {
                write!(f, "Failed to parse token frame: {}", detail)
            }
            StreamError::DoneParse { detail } => {
                write!(f, "Failed to parse done frame: {}", detail)
            }
            StreamError::ErrorFrameParse { detail } => {
                write!(f, "Failed to parse server error frame: {}", detail)
            }
            StreamError::StartFailed { detail } => {
                write!(f, "Failed to start stream: {}", detail)
            }
            StreamError::ReadFailed { detail } => write!(f, "Stream read failed: {}", detail),
        }
    }
}

impl std::error::Error for StreamError {}
