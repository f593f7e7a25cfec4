use crate::error::LlmError;
use bytes::BytesMut;

/// Sentinel OpenAI-compatible providers send as the last frame
pub const DONE_SENTINEL: &str = "[DONE]";

/// One unit extracted from an SSE byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// The frame's `data:` payload
    Data(String),
    /// Keep-alive: a blank frame, comments only, or no `data:` lines
    Empty,
    /// The termination sentinel
    Sentinel,
}

/// Reassembles Server-Sent Event frames from arbitrarily split byte chunks.
///
/// Bytes are buffered as bytes, so a multi-byte UTF-8 character split across
/// two reads is decoded correctly. A frame ends at the first blank line, with
/// `\n` and `\r\n` line endings accepted in any mix (`\n\n`, `\r\n\r\n`,
/// `\n\r\n`, `\r\n\n`). Bare `\r` line endings are not recognised.
#[derive(Debug)]
pub struct FrameDecoder {
    buffer: BytesMut,
    /// Bytes at the front of `buffer` already known to hold no delimiter
    scanned: usize,
    sentinel: Option<String>,
}

impl FrameDecoder {
    /// Create a decoder; `sentinel` is the payload that ends the stream, if any
    pub fn new(sentinel: Option<&str>) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            sentinel: sentinel.map(str::to_string),
        }
    }

    /// Append bytes read from the transport
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Bytes buffered but not yet part of a complete frame
    pub fn remainder_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial frame
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.scanned = 0;
    }

    /// Extract the next complete frame, or `None` if more bytes are needed.
    ///
    /// A frame that is not valid UTF-8 is reported as [`LlmError::Decode`].
    pub fn next_frame(&mut self) -> Option<Result<SseFrame, LlmError>> {
        let Some((end, consumed)) = find_delimiter(&self.buffer, self.scanned) else {
            // Keep a tail so a delimiter split across pushes is still found
            self.scanned = self.buffer.len().saturating_sub(3);
            return None;
        };

        let frame = self.buffer.split_to(consumed);
        self.scanned = 0;

        Some(match std::str::from_utf8(&frame[..end]) {
            Ok(block) => Ok(parse_block(block, self.sentinel.as_deref())),
            Err(e) => Err(LlmError::decode(
                String::from_utf8_lossy(&frame[..end]).into_owned(),
                e,
            )),
        })
    }
}

/// Earliest blank line at or after `from`.
///
/// Returns where the frame's content ends and where the next frame starts.
fn find_delimiter(buf: &[u8], from: usize) -> Option<(usize, usize)> {
    let mut i = from;
    while let Some(pos) = buf[i..].iter().position(|&b| b == b'\n') {
        let newline = i + pos;
        let next = &buf[newline + 1..];
        let consumed = if next.starts_with(b"\n") {
            Some(newline + 2)
        } else if next.starts_with(b"\r\n") {
            Some(newline + 3)
        } else {
            None
        };
        if let Some(consumed) = consumed {
            let end = if newline > 0 && buf[newline - 1] == b'\r' {
                newline - 1
            } else {
                newline
            };
            return Some((end, consumed));
        }
        i = newline + 1;
    }
    None
}

/// Collect the `data:` lines of one event block
fn parse_block(block: &str, sentinel: Option<&str>) -> SseFrame {
    let mut data: Option<String> = None;
    for line in block.lines() {
        // `event:`, `id:`, `retry:` and `:` comment lines carry no payload
        let Some(value) = line.strip_prefix("data:") else {
            continue;
        };
        let value = value.strip_prefix(' ').unwrap_or(value);
        match &mut data {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(value);
            }
            None => data = Some(value.to_string()),
        }
    }

    match data {
        None => SseFrame::Empty,
        Some(data) if data.trim().is_empty() => SseFrame::Empty,
        Some(data) if sentinel.is_some_and(|s| data.trim() == s) => SseFrame::Sentinel,
        Some(data) => SseFrame::Data(data),
    }
}
