//! Byte → frame → event pipeline
//!
//! One `StreamDecoder` per session. It owns the decode carry-over, the frame
//! buffer and the terminal flag, so nothing outside the session's read loop
//! can observe or mutate them.

use crate::config::DecoderConfig;
use crate::sse::decoder::ByteDecoder;
use crate::sse::dispatch::{Dispatched, EventDispatcher};
use crate::sse::events::{DomainEvent, Frame};
use crate::sse::frame::FrameDecoder;

/// Stateful decoder turning raw chunks into dispatched events.
///
/// Once a terminal event has been produced, everything after it is ignored:
/// frames already buffered behind it are discarded and later chunks yield
/// nothing.
#[derive(Debug)]
pub struct StreamDecoder {
    bytes: ByteDecoder,
    frames: FrameDecoder,
    dispatcher: EventDispatcher,
    flush_trailing_frame: bool,
    terminal: bool,
}

impl StreamDecoder {
    /// Create a pipeline configured by `config`.
    pub fn new(config: &DecoderConfig) -> Self {
        Self {
            bytes: ByteDecoder::new(config.normalize_line_endings),
            frames: FrameDecoder::new(),
            dispatcher: EventDispatcher::new(config),
            flush_trailing_frame: config.flush_trailing_frame,
            terminal: false,
        }
    }

    /// Feed one chunk from the transport.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Dispatched> {
        if self.terminal {
            return Vec::new();
        }
        let text = self.bytes.decode(chunk);
        self.push_text(&text)
    }

    /// Flush the byte decoder and, if enabled, the unterminated final frame.
    ///
    /// Call once after the source is exhausted.
    pub fn finish(&mut self) -> Vec<Dispatched> {
        if self.terminal {
            return Vec::new();
        }

        if self.bytes.has_pending() {
            tracing::debug!("Source ended inside a partial sequence");
        }
        let tail = self.bytes.flush();
        let mut dispatched = self.push_text(&tail);

        if self.flush_trailing_frame {
            if let Some(frame) = self.frames.finish() {
                dispatched.extend(self.dispatch_all(vec![frame]));
            }
        } else if !self.frames.buffered().is_empty() {
            tracing::debug!(
                bytes = self.frames.buffered().len(),
                "Discarding unterminated final frame"
            );
            self.frames.reset();
        }

        dispatched
    }

    /// True once a terminal event has been dispatched.
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    /// Text waiting for a frame separator.
    pub fn buffered(&self) -> &str {
        self.frames.buffered()
    }

    fn push_text(&mut self, text: &str) -> Vec<Dispatched> {
        if text.is_empty() {
            return Vec::new();
        }
        let frames = self.frames.push(text);
        self.dispatch_all(frames)
    }

    fn dispatch_all(&mut self, frames: Vec<Frame>) -> Vec<Dispatched> {
        let mut dispatched = Vec::new();

        for frame in frames {
            if self.terminal {
                tracing::debug!("Skipping frame after terminal event");
                break;
            }
            if let Some(result) = self.dispatcher.dispatch(&frame) {
                tracing::trace!(event = result.event.event_type_name(), "Dispatched frame");
                if result.terminal {
                    self.terminal = true;
                    self.frames.reset();
                }
                dispatched.push(result);
            }
        }

        dispatched
    }
}

/// Decode a complete byte sequence delivered as `chunks`, returning only the events.
pub fn decode_chunks<I, B>(config: &DecoderConfig, chunks: I) -> Vec<DomainEvent>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut decoder = StreamDecoder::new(config);
    let mut events: Vec<DomainEvent> = chunks
        .into_iter()
        .flat_map(|chunk| decoder.feed(chunk.as_ref()))
        .map(|d| d.event)
        .collect();
    events.extend(decoder.finish().into_iter().map(|d| d.event));
    events
}
