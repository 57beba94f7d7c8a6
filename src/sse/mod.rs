//! SSE (Server-Sent Events) stream decoding
//!
//! Turns the raw body of a streaming response into domain events:
//! - `event: <name>` - event name line (`token`, `done`, `error`)
//! - `data: <json>` - payload line(s), joined with newlines
//! - Blank line - ends the frame
//! - Lines starting with `:` - comments (ignored)
//!
//! # Module structure
//! - `decoder` - ByteDecoder (UTF-8 carry-over, line-ending normalization)
//! - `frame` - FrameDecoder and line/frame parsing
//! - `dispatch` - EventDispatcher (frame → DomainEvent)
//! - `pipeline` - StreamDecoder chaining the three stages
//! - `events` - DomainEvent, Frame, SseLine

mod decoder;
mod dispatch;
mod events;
mod frame;
mod pipeline;

// Re-export public types
pub use decoder::ByteDecoder;
pub use dispatch::{Dispatched, EventDispatcher, DONE_SENTINEL};
pub use events::{DomainEvent, Frame, Metadata, SseLine};
pub use frame::{parse_frame, parse_sse_line, FrameDecoder, FRAME_SEPARATOR};
pub use pipeline::{decode_chunks, StreamDecoder};
