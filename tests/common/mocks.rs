//! Mock configurations for test fixtures.
//!
//! Re-exports the mocks from `tokenwire::adapters::mock` and adds a builder
//! for the common response setups.

pub use tokenwire::adapters::mock::{
    MockChunk, MockHttpClient, MockResponse, RecordedRequest, RecordingSink,
};
pub use tokenwire::traits::HttpError;

use bytes::Bytes;

/// Configuration for setting up mock HTTP responses.
pub struct MockHttpConfig {
    client: MockHttpClient,
}

impl MockHttpConfig {
    /// Creates a new mock HTTP configuration.
    pub fn new() -> Self {
        Self {
            client: MockHttpClient::new(),
        }
    }

    /// Configures a 200 response streaming `chunks`.
    pub fn with_chunks<I, B>(self, url: &str, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.client.set_response(url, MockResponse::chunks(chunks));
        self
    }

    /// Configures a 200 response streaming `chunks` for every URL.
    pub fn with_default_chunks<I, B>(self, chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.client.set_default_response(MockResponse::chunks(chunks));
        self
    }

    /// Configures a response with `status` and `body`.
    pub fn with_status(self, url: &str, status: u16, body: &str) -> Self {
        self.client
            .set_response(url, MockResponse::status(status, body.to_string()));
        self
    }

    /// Configures an explicit body script.
    pub fn with_script(self, url: &str, chunks: Vec<MockChunk>) -> Self {
        self.client.set_response(url, MockResponse::script(chunks));
        self
    }

    /// Configures a request failure.
    pub fn with_error(self, url: &str, error: HttpError) -> Self {
        self.client.set_response(url, MockResponse::Error(error));
        self
    }

    /// Configures any response.
    pub fn with_response(self, url: &str, response: MockResponse) -> Self {
        self.client.set_response(url, response);
        self
    }

    /// Builds the configured MockHttpClient.
    pub fn build(self) -> MockHttpClient {
        self.client
    }
}

impl Default for MockHttpConfig {
    fn default() -> Self {
        Self::new()
    }
}
