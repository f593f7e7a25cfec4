//! Streaming response decoding
//!
//! [`ChunkStream`] pulls bytes from a response body, reassembles SSE frames
//! and parses each payload into the request's chunk type. It reads from the
//! network only when the consumer asks for the next item, so a slow consumer
//! slows the read loop instead of growing a buffer.
//!
//! The stream ends after the termination sentinel, at end of body, or right
//! after the first error it yields. Whichever comes first, the underlying
//! body is released exactly once.

use crate::error::{LlmError, parse_error_envelope};
use crate::transport::ByteStream;
use crate::utils::sse::{FrameDecoder, SseFrame};
use futures::Stream;
use futures::stream::FusedStream;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Lazily decoded sequence of stream chunks
pub struct ChunkStream<T> {
    body: Option<ByteStream>,
    decoder: FrameDecoder,
    finished: bool,
    _chunk: PhantomData<fn() -> T>,
}

impl<T> ChunkStream<T> {
    /// Decode `body`, stopping at `sentinel` when the provider sends one
    pub fn new(body: ByteStream, sentinel: Option<&str>) -> Self {
        Self {
            body: Some(body),
            decoder: FrameDecoder::new(sentinel),
            finished: false,
            _chunk: PhantomData,
        }
    }

    /// Stop consuming and release the connection. Calling it again is a no-op.
    pub fn close(&mut self) {
        self.finished = true;
        self.decoder.clear();
        if self.body.take().is_some() {
            log::debug!("Closed streaming response body");
        }
    }

    /// Whether the body is still held open
    pub fn is_open(&self) -> bool {
        self.body.is_some()
    }
}

impl<T> Drop for ChunkStream<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T> std::fmt::Debug for ChunkStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkStream")
            .field("open", &self.is_open())
            .field("finished", &self.finished)
            .field("buffered", &self.decoder.remainder_len())
            .finish()
    }
}

impl<T: DeserializeOwned> Stream for ChunkStream<T> {
    type Item = Result<T, LlmError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if this.finished {
                return Poll::Ready(None);
            }

            // Drain complete frames before reading more bytes
            match this.decoder.next_frame() {
                Some(Ok(SseFrame::Data(payload))) => {
                    let parsed = parse_chunk(&payload);
                    if parsed.is_err() {
                        this.close();
                    }
                    return Poll::Ready(Some(parsed));
                }
                Some(Ok(SseFrame::Empty)) => {
                    log::trace!("Skipping keep-alive frame");
                    continue;
                }
                Some(Ok(SseFrame::Sentinel)) => {
                    log::debug!("Received stream termination sentinel");
                    this.close();
                    return Poll::Ready(None);
                }
                Some(Err(e)) => {
                    this.close();
                    return Poll::Ready(Some(Err(e)));
                }
                None => {}
            }

            let Some(body) = this.body.as_mut() else {
                this.finished = true;
                return Poll::Ready(None);
            };

            match body.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.decoder.push(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    this.close();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    let leftover = this.decoder.remainder_len();
                    if leftover > 0 {
                        log::debug!("Discarding {leftover} bytes of incomplete trailing frame");
                    }
                    this.close();
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl<T: DeserializeOwned> FusedStream for ChunkStream<T> {
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

/// Parse one frame payload, recognising in-stream error envelopes
fn parse_chunk<T: DeserializeOwned>(payload: &str) -> Result<T, LlmError> {
    serde_json::from_str(payload).map_err(|err| match parse_error_envelope(payload) {
        Some((message, code)) => {
            LlmError::stream(message.unwrap_or_else(|| "unknown error".to_string()), code)
        }
        None => LlmError::decode(payload, err),
    })
}
