//! Streaming session control.
//!
//! - `controller` - StreamController (start/stop/wait, the read loop)
//! - `session` - StreamSession snapshots, StreamState, SessionOutcome

mod controller;
mod session;

pub use controller::{StreamController, ACCEPT_EVENT_STREAM, CONTENT_TYPE_JSON};
pub use session::{SessionOutcome, StreamSession, StreamState};
