//! Recording event sink for testing.

use std::sync::{Arc, Mutex};

use crate::sse::DomainEvent;
use crate::traits::EventSink;

/// Sink that keeps every event it receives.
///
/// Clones share the same buffer, so a test can hand one clone to the
/// controller and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<DomainEvent>>>,
}

impl RecordingSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<DomainEvent> {
        self.lock().clone()
    }

    /// Number of events received so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if nothing has been received.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Concatenation of every `Token` received.
    pub fn text(&self) -> String {
        self.lock()
            .iter()
            .filter_map(|event| match event {
                DomainEvent::Token(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Messages of every `Error` received, in order.
    pub fn error_messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|event| event.error_message().map(str::to_string))
            .collect()
    }

    /// Forget everything received.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DomainEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: DomainEvent) {
        self.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_shares_buffer() {
        let sink = RecordingSink::new();
        let handle = sink.clone();
        sink.emit(DomainEvent::Token("he".to_string()));
        sink.emit(DomainEvent::Token("llo".to_string()));
        sink.emit(DomainEvent::error("http_error"));

        assert_eq!(handle.len(), 3);
        assert_eq!(handle.text(), "hello");
        assert_eq!(handle.error_messages(), vec!["http_error".to_string()]);

        handle.clear();
        assert!(sink.is_empty());
    }
}
