//! Error category classification.
//!
//! Sorts session failures into the three families the controller handles
//! differently: transport failures, truncated streams, and bad frames.

use std::fmt;

/// High-level categorization of stream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Non-2xx status, missing body, or a network failure.
    /// Fatal to the session.
    Transport,

    /// The source ended before a terminal event arrived.
    /// Fatal to the session.
    Truncation,

    /// Malformed structured content inside a single frame.
    /// Local to that frame unless the frame was terminal.
    FrameParse,
}

impl ErrorCategory {
    /// Returns true if errors in this category always end the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorCategory::Transport | ErrorCategory::Truncation)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transport => "transport",
            ErrorCategory::Truncation => "truncation",
            ErrorCategory::FrameParse => "frame_parse",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
