//! HTTP client trait abstraction.
//!
//! Provides a trait-based abstraction for the one request a session makes,
//! enabling dependency injection and mocking in tests.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;
use thiserror::Error;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Incremental response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Response head plus the not-yet-read body.
///
/// Non-2xx responses are returned as-is so the caller can decide how to
/// report them. `body` is `None` when the transport exposes no readable body.
pub struct StreamResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body, read chunk by chunk
    pub body: Option<ByteStream>,
}

impl StreamResponse {
    /// Create a response with a streaming body.
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Some(body),
        }
    }

    /// Create a response without a body.
    pub fn without_body(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Set the response headers.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for StreamResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

/// HTTP client errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HttpError {
    /// Connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    /// Request timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
    /// Reading the body failed mid-stream
    #[error("IO error: {0}")]
    Io(String),
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Other error
    #[error("HTTP error: {0}")]
    Other(String),
}

/// Trait for the streaming POST a session issues.
///
/// # Example
///
/// ```ignore
/// use tokenwire::traits::{HttpClient, Headers};
///
/// async fn status<C: HttpClient>(client: &C) -> Result<u16, HttpError> {
///     let response = client.post_stream("https://api.example.com/chat", "{}", &Headers::new()).await?;
///     Ok(response.status)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a POST request and return the response with its body unread.
    ///
    /// # Arguments
    /// * `url` - The URL to request
    /// * `body` - Request body as a string
    /// * `headers` - Request headers
    ///
    /// # Returns
    /// The response head and body stream, or an error if no response arrived
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamResponse, HttpError>;
}
