//! Test utilities for simulating provider responses
//!
//! Fake SSE bodies with controllable chunk boundaries, a body stream that
//! counts how often it is released, and an in-memory [`HttpTransport`].

use crate::error::LlmError;
use crate::request::OutboundRequest;
use crate::transport::{ByteStream, HttpTransport, TransportResponse};
use bytes::Bytes;
use futures::Stream;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

/// SSE body carrying `events` as `data:` frames, delivered in one chunk
pub fn fake_sse_stream(events: &[&str]) -> ByteStream {
    byte_stream(vec![sse_body(events).into_bytes()])
}

/// SSE body split into chunks of `chunk_size` bytes, ignoring frame and
/// character boundaries
pub fn fake_sse_stream_chunked(events: &[&str], chunk_size: usize) -> ByteStream {
    let body = sse_body(events).into_bytes();
    byte_stream(body.chunks(chunk_size.max(1)).map(<[u8]>::to_vec).collect())
}

/// Byte stream yielding exactly the given chunks
pub fn byte_stream(chunks: Vec<Vec<u8>>) -> ByteStream {
    Box::pin(futures::stream::iter(
        chunks.into_iter().map(|chunk| Ok(Bytes::from(chunk))),
    ))
}

fn sse_body(events: &[&str]) -> String {
    events
        .iter()
        .map(|event| format!("data: {event}\n\n"))
        .collect()
}

/// Byte stream that counts how many times it has been dropped
pub struct CountingStream {
    chunks: std::vec::IntoIter<Vec<u8>>,
    dropped: Arc<AtomicUsize>,
}

impl CountingStream {
    /// Returns the stream and the shared drop counter
    pub fn new(chunks: Vec<Vec<u8>>) -> (Self, Arc<AtomicUsize>) {
        let dropped = Arc::new(AtomicUsize::new(0));
        (
            Self {
                chunks: chunks.into_iter(),
                dropped: dropped.clone(),
            },
            dropped,
        )
    }
}

impl Stream for CountingStream {
    type Item = Result<Bytes, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.chunks.next().map(|chunk| Ok(Bytes::from(chunk))))
    }
}

impl Drop for CountingStream {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

/// Canned response served by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub chunks: Vec<Vec<u8>>,
}

impl MockResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "application/json",
            chunks: vec![body.as_bytes().to_vec()],
        }
    }

    pub fn sse(status: u16, events: &[&str]) -> Self {
        Self {
            status,
            content_type: "text/event-stream",
            chunks: vec![sse_body(events).into_bytes()],
        }
    }

    pub fn raw(status: u16, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: "text/event-stream",
            chunks,
        }
    }
}

type Responder = dyn Fn(&OutboundRequest) -> Result<MockResponse, LlmError> + Send + Sync;

/// In-memory transport that records every request it executes
pub struct MockTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<OutboundRequest>>,
}

impl MockTransport {
    /// Answer each request with whatever `responder` returns
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&OutboundRequest) -> Result<MockResponse, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same response
    pub fn always(response: MockResponse) -> Self {
        Self::from_fn(move |_| Ok(response.clone()))
    }

    /// Requests executed so far, in order
    pub fn requests(&self) -> Vec<OutboundRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Body of the most recent request as a string
    pub fn last_body(&self) -> Option<String> {
        let requests = self.requests.lock().unwrap();
        let body = requests.last()?.body()?;
        Some(String::from_utf8_lossy(body).into_owned())
    }
}

#[async_trait::async_trait]
impl HttpTransport for MockTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<TransportResponse, LlmError> {
        let response = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        let response = response?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(response.content_type));
        Ok(TransportResponse {
            status: response.status,
            headers,
            body: byte_stream(response.chunks),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    async fn collect_text(stream: ByteStream) -> (usize, String) {
        let chunks: Vec<Result<Bytes, LlmError>> = stream.collect().await;
        let count = chunks.len();
        let mut text = String::new();
        for chunk in chunks {
            text.push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
        }
        (count, text)
    }

    #[tokio::test]
    async fn test_basic_fake_sse_stream() {
        let (count, text) = collect_text(fake_sse_stream(&["hello", "world"])).await;
        assert_eq!(count, 1);
        assert_eq!(text, "data: hello\n\ndata: world\n\n");
    }

    #[tokio::test]
    async fn test_fake_sse_stream_chunked() {
        let (count, text) = collect_text(fake_sse_stream_chunked(&["hello", "world"], 5)).await;
        assert!(count > 1);
        assert_eq!(text, "data: hello\n\ndata: world\n\n");
    }

    #[tokio::test]
    async fn test_empty_events() {
        let (count, _) = collect_text(fake_sse_stream(&[])).await;
        assert_eq!(count, 1);
        let (count, _) = collect_text(fake_sse_stream_chunked(&[], 5)).await;
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_counting_stream_counts_drops() {
        let (stream, dropped) = CountingStream::new(vec![b"a".to_vec()]);
        assert_eq!(dropped.load(Ordering::SeqCst), 0);
        drop(stream);
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }
}
