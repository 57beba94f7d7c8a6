//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that returns scripted streaming
//! responses: chunk sequences, error statuses, mid-stream failures and stalls.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, StreamResponse};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body
    pub body: String,
}

/// One step of a scripted body.
#[derive(Debug, Clone)]
pub enum MockChunk {
    /// Deliver these bytes
    Data(Bytes),
    /// Fail the read with this error
    Fail(HttpError),
    /// Never deliver anything else
    Stall,
}

impl MockChunk {
    /// Create a data chunk.
    pub fn data(bytes: impl Into<Bytes>) -> Self {
        MockChunk::Data(bytes.into())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Respond with `status` and play `chunks` as the body
    Stream { status: u16, chunks: Vec<MockChunk> },
    /// Respond with `status` and no readable body
    NoBody { status: u16 },
    /// Fail before any response arrives
    Error(HttpError),
    /// Never respond
    Hang,
}

impl MockResponse {
    /// A 200 response whose body is `chunks`, in order.
    pub fn chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        MockResponse::Stream {
            status: 200,
            chunks: chunks.into_iter().map(MockChunk::data).collect(),
        }
    }

    /// A response with `status` and a single-chunk body.
    pub fn status(status: u16, body: impl Into<Bytes>) -> Self {
        MockResponse::Stream {
            status,
            chunks: vec![MockChunk::data(body)],
        }
    }

    /// A 200 response following an explicit script.
    pub fn script(chunks: Vec<MockChunk>) -> Self {
        MockResponse::Stream {
            status: 200,
            chunks,
        }
    }
}

/// Mock HTTP client for testing.
///
/// Responses are looked up by exact URL, then by URL prefix, then the default.
///
/// # Example
///
/// ```ignore
/// use tokenwire::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://api.example.com/chat",
///     MockResponse::chunks(["event: token\ndata: {\"token\":\"hi\"}\n\n"]),
/// );
///
/// let response = client.post_stream("https://api.example.com/chat", "{}", &Headers::new()).await?;
/// assert_eq!(response.status, 200);
/// assert_eq!(client.get_requests().len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Test doubles don't care about poisoning; a panicking test already failed.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a response for a specific URL.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        lock(&self.responses).insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn record_request(&self, url: &str, headers: &Headers, body: &str) {
        lock(&self.requests).push(RecordedRequest {
            method: "POST".to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body: body.to_string(),
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        let responses = lock(&self.responses);

        // First try exact match
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        // Then try prefix match (for URL patterns)
        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
        }

        lock(&self.default_response).clone()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn a script into a body stream. Steps after a `Stall` are unreachable.
fn scripted_body(chunks: Vec<MockChunk>) -> ByteStream {
    let stalls = chunks.iter().any(|c| matches!(c, MockChunk::Stall));
    let items: Vec<Result<Bytes, HttpError>> = chunks
        .into_iter()
        .take_while(|c| !matches!(c, MockChunk::Stall))
        .filter_map(|c| match c {
            MockChunk::Data(bytes) => Some(Ok(bytes)),
            MockChunk::Fail(err) => Some(Err(err)),
            MockChunk::Stall => None,
        })
        .collect();

    let body = stream::iter(items);
    if stalls {
        Box::pin(body.chain(stream::pending()))
    } else {
        Box::pin(body)
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamResponse, HttpError> {
        self.record_request(url, headers, body);

        match self.get_response(url) {
            Some(MockResponse::Stream { status, chunks }) => {
                Ok(StreamResponse::new(status, scripted_body(chunks)))
            }
            Some(MockResponse::NoBody { status }) => Ok(StreamResponse::without_body(status)),
            Some(MockResponse::Error(err)) => Err(err),
            Some(MockResponse::Hang) => futures::future::pending().await,
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
