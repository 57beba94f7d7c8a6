//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Scripted streaming responses
//! - [`mock::RecordingSink`] - Event capture

pub mod mock;
pub mod reqwest_http;

pub use mock::{MockHttpClient, RecordingSink};
pub use reqwest_http::ReqwestHttpClient;
