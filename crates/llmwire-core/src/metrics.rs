//! Request and streaming metrics
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! application installs a recorder.

use crate::error::LlmError;
use crate::stream::ChunkStream;
use futures::Stream;
use futures::stream::FusedStream;
use metrics::{counter, histogram};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Outcome label for one request/response exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Success,
    ApiError,
    TransportError,
    DecodeError,
}

impl RequestOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestOutcome::Success => "success",
            RequestOutcome::ApiError => "api_error",
            RequestOutcome::TransportError => "transport_error",
            RequestOutcome::DecodeError => "decode_error",
        }
    }
}

/// Count one exchange and record how long the provider took to answer
pub fn record_request(provider: &'static str, outcome: RequestOutcome, elapsed: Duration) {
    counter!(
        "llm_requests_total",
        "provider" => provider,
        "outcome" => outcome.as_str()
    )
    .increment(1);
    histogram!("llm_request_duration_ms", "provider" => provider)
        .record(elapsed.as_secs_f64() * 1000.0);
}

/// Streaming metrics collector
#[derive(Debug, Clone)]
pub struct StreamingMetrics {
    pub start_time: Instant,
    pub first_chunk_latency: Option<Duration>,
    pub total_chunks: usize,
    pub provider_name: &'static str,
}

impl StreamingMetrics {
    pub fn new(provider_name: &'static str) -> Self {
        Self {
            start_time: Instant::now(),
            first_chunk_latency: None,
            total_chunks: 0,
            provider_name,
        }
    }

    pub fn record_chunk(&mut self) {
        self.total_chunks += 1;
        if self.first_chunk_latency.is_none() {
            let latency = self.start_time.elapsed();
            self.first_chunk_latency = Some(latency);

            histogram!(
                "llm_streaming_first_chunk_latency_ms",
                "provider" => self.provider_name
            )
            .record(latency.as_secs_f64() * 1000.0);

            log::debug!(
                "First chunk received after {:?} for provider {}",
                latency,
                self.provider_name
            );
        }
    }

    pub fn record_error(&self) {
        counter!(
            "llm_streaming_errors_total",
            "provider" => self.provider_name
        )
        .increment(1);
    }

    pub fn finalize(&self) {
        let total_duration = self.start_time.elapsed();

        if total_duration.as_secs_f64() > 0.0 {
            let chunks_per_second = self.total_chunks as f64 / total_duration.as_secs_f64();
            histogram!(
                "llm_streaming_chunks_per_second",
                "provider" => self.provider_name
            )
            .record(chunks_per_second);

            log::debug!(
                "Stream completed: {} chunks in {:?} ({:.2} chunks/s) for provider {}",
                self.total_chunks,
                total_duration,
                chunks_per_second,
                self.provider_name
            );
        }

        counter!(
            "llm_streaming_chunks_total",
            "provider" => self.provider_name
        )
        .increment(self.total_chunks as u64);
        counter!(
            "llm_streaming_completions_total",
            "provider" => self.provider_name
        )
        .increment(1);
    }
}

/// Wrapper stream that adds metrics tracking
#[derive(Debug)]
pub struct MetricsStream<S> {
    inner: S,
    metrics: StreamingMetrics,
    finished: bool,
}

impl<S> MetricsStream<S> {
    pub fn new(inner: S, provider_name: &'static str) -> Self {
        Self {
            inner,
            metrics: StreamingMetrics::new(provider_name),
            finished: false,
        }
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    pub fn metrics(&self) -> &StreamingMetrics {
        &self.metrics
    }
}

impl<T> MetricsStream<ChunkStream<T>> {
    /// Stop consuming and release the connection; see [`ChunkStream::close`]
    pub fn close(&mut self) {
        self.inner.close();
    }
}

impl<S, T> Stream for MetricsStream<S>
where
    S: Stream<Item = Result<T, LlmError>> + Unpin,
{
    type Item = Result<T, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                self.metrics.record_chunk();
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                self.metrics.record_error();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.finished = true;
                self.metrics.finalize();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<S, T> FusedStream for MetricsStream<S>
where
    S: Stream<Item = Result<T, LlmError>> + Unpin,
{
    fn is_terminated(&self) -> bool {
        self.finished
    }
}

impl<S> Drop for MetricsStream<S> {
    fn drop(&mut self) {
        if !self.finished {
            counter!(
                "llm_streaming_cancellations_total",
                "provider" => self.metrics.provider_name
            )
            .increment(1);
        }
    }
}
