//! Error handling for tokenwire.
//!
//! - **Error Categories**: transport, truncation and frame-parse failures
//! - **Stream Errors**: every client-side failure a session can report,
//!   each tied to the `message` kind the UI receives
//!
//! | Category | Examples | Ends session |
//! |----------|----------|--------------|
//! | Transport | `http_error`, `no_response_body`, `fetch_stream_error` | Yes |
//! | Truncation | `stream_closed_before_done` | Yes |
//! | FrameParse | `token_parse_failed`, `done_parse_failed` | Only for terminal frames |
//!
//! Cancellation is not an error: an aborted session reports nothing.

mod category;
mod stream;

pub use category::ErrorCategory;
pub use stream::{kind, StreamError};

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Every error converts into an `Error` event whose message is its kind.
    #[test]
    fn test_error_events_carry_kind() {
        let errors = vec![
            StreamError::HttpStatus {
                status: 401,
                body: "denied".to_string(),
            },
            StreamError::ClosedBeforeDone,
            StreamError::DoneParse {
                detail: "eof".to_string(),
            },
        ];

        for err in errors {
            let kind = err.kind();
            let event = err.into_event();
            assert!(event.is_terminal());
            assert_eq!(event.error_message(), Some(kind));
        }
    }

    #[test]
    fn test_fatal_errors() {
        assert!(StreamError::NoResponseBody.category().is_fatal());
        assert!(StreamError::ClosedBeforeDone.category().is_fatal());
        assert!(!StreamError::TokenParse {
            detail: String::new()
        }
        .category()
        .is_fatal());
    }
}
