//! Frame extraction
//!
//! Accumulates decoded text and splits it into blank-line separated frames.
//! A frame is only yielded once its separator has arrived; the unterminated
//! remainder stays buffered for the next append.

use crate::sse::events::{Frame, SseLine};

/// Blank line separating two frames (after line-ending normalization).
pub const FRAME_SEPARATOR: &str = "\n\n";

/// Parse a single SSE line into its component type
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    // id:, retry: and anything unknown
    SseLine::Comment(line.to_string())
}

/// Parse one frame's text into its event name and joined data.
///
/// Returns `None` for frames that carry neither an event name nor data
/// (blank frames, keep-alive comments).
pub fn parse_frame(block: &str) -> Option<Frame> {
    if block.trim().is_empty() {
        return None;
    }

    let mut event = None;
    let mut data_lines: Vec<String> = Vec::new();

    for line in block.split('\n') {
        match parse_sse_line(line) {
            SseLine::Event(name) if !name.is_empty() => event = Some(name),
            SseLine::Data(chunk) => data_lines.push(chunk),
            _ => {}
        }
    }

    if event.is_none() && data_lines.is_empty() {
        return None;
    }

    let data = if data_lines.is_empty() {
        None
    } else {
        Some(data_lines.join("\n"))
    };

    Some(Frame { event, data })
}

/// Append-only text buffer that yields complete frames in arrival order.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: String,
}

impl FrameDecoder {
    /// Create an empty frame decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Append decoded text and return every frame it completed.
    pub fn push(&mut self, text: &str) -> Vec<Frame> {
        self.buffer.push_str(text);

        let mut frames = Vec::new();
        let mut consumed = 0;

        while let Some(pos) = self.buffer[consumed..].find(FRAME_SEPARATOR) {
            let end = consumed + pos;
            match parse_frame(&self.buffer[consumed..end]) {
                Some(frame) => frames.push(frame),
                None => tracing::trace!("Dropping frame with no event or data"),
            }
            consumed = end + FRAME_SEPARATOR.len();
        }

        self.buffer.drain(..consumed);
        frames
    }

    /// Take the unterminated remainder as a final frame.
    ///
    /// Used once the source is exhausted; the buffer is empty afterwards.
    pub fn finish(&mut self) -> Option<Frame> {
        let rest = std::mem::take(&mut self.buffer);
        parse_frame(&rest)
    }

    /// Text still waiting for a separator.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Discard buffered text.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
