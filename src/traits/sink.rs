//! Event sink trait abstraction.
//!
//! The controller reports every event through an `EventSink`. The UI side
//! decides what to do with them; an unbounded channel is the usual bridge.

use tokio::sync::mpsc;

use crate::sse::DomainEvent;

/// Receiver of a session's domain events.
///
/// `emit` is called from the session task, in stream order. It must not block.
pub trait EventSink: Send + Sync {
    /// Deliver one event.
    fn emit(&self, event: DomainEvent);
}

impl EventSink for mpsc::UnboundedSender<DomainEvent> {
    fn emit(&self, event: DomainEvent) {
        if self.send(event).is_err() {
            tracing::debug!("Event receiver dropped");
        }
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn emit(&self, event: DomainEvent) {
        (**self).emit(event)
    }
}
