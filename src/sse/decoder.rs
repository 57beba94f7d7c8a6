//! Incremental byte → text decoding
//!
//! Chunks from the transport are decoded one at a time, but the output is
//! identical to decoding the concatenated byte stream in a single pass.

/// Replacement emitted for invalid or truncated UTF-8.
const REPLACEMENT: char = '\u{FFFD}';

/// Stateful UTF-8 decoder that carries incomplete sequences across chunks.
///
/// Invalid bytes are replaced with U+FFFD rather than reported, the same way
/// `String::from_utf8_lossy` treats them. When line-ending normalization is
/// on, `\r\n` becomes `\n`; a `\r` at the end of a chunk is held back until
/// the next chunk shows whether a `\n` follows.
#[derive(Debug, Default)]
pub struct ByteDecoder {
    /// Tail of an incomplete multi-byte sequence (at most 3 bytes)
    pending: Vec<u8>,
    /// A trailing `\r` withheld from the previous output
    held_cr: bool,
    normalize_line_endings: bool,
}

impl ByteDecoder {
    /// Create a decoder; `normalize_line_endings` rewrites `\r\n` to `\n`.
    pub fn new(normalize_line_endings: bool) -> Self {
        Self {
            pending: Vec::new(),
            held_cr: false,
            normalize_line_endings,
        }
    }

    /// Decode one chunk, returning all text that is complete so far.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut text = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&rest[..valid_up_to]));

                    match err.error_len() {
                        Some(len) => {
                            text.push(REPLACEMENT);
                            rest = &rest[valid_up_to + len..];
                        }
                        None => {
                            // Sequence may be completed by the next chunk
                            self.pending = rest[valid_up_to..].to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.normalize(text)
    }

    /// Emit whatever is still held once the source is exhausted.
    ///
    /// An incomplete trailing sequence becomes a single U+FFFD.
    pub fn flush(&mut self) -> String {
        let mut text = String::new();
        if std::mem::take(&mut self.held_cr) {
            text.push('\r');
        }
        if !self.pending.is_empty() {
            self.pending.clear();
            text.push(REPLACEMENT);
        }
        text
    }

    /// True when bytes or a withheld `\r` are waiting for more input.
    pub fn has_pending(&self) -> bool {
        self.held_cr || !self.pending.is_empty()
    }

    fn normalize(&mut self, mut text: String) -> String {
        if !self.normalize_line_endings {
            return text;
        }

        if std::mem::take(&mut self.held_cr) {
            text.insert(0, '\r');
        }
        if text.ends_with('\r') {
            text.pop();
            self.held_cr = true;
        }

        if text.contains("\r\n") {
            text.replace("\r\n", "\n")
        } else {
            text
        }
    }
}
