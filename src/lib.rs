//! tokenwire - client for token-by-token server-sent event streams
//!
//! Decodes a chunked HTTP response into `token` / `done` / `error` events,
//! one cancellable session at a time.
//!
//! This library exposes modules for use in integration tests.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod sse;
pub mod stream;
pub mod traits;
