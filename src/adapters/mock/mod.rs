//! Mock implementations for testing.
//!
//! Test doubles for the trait seams, enabling controller tests without
//! network access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted streaming responses
//! - [`RecordingSink`] - Event sink that keeps what it receives

pub mod http;
pub mod sink;

pub use http::{MockChunk, MockHttpClient, MockResponse, RecordedRequest};
pub use sink::RecordingSink;
