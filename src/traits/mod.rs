//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - Streaming POST used to open a session
//! - [`EventSink`] - Where a session's domain events are delivered

pub mod http;
pub mod sink;

pub use http::{ByteStream, Headers, HttpClient, HttpError, StreamResponse};
pub use sink::EventSink;
