//! Response dispatch
//!
//! Sends an [`OutboundRequest`] through the transport and routes the response
//! by status: non-2xx becomes an API error, 2xx is parsed as one JSON document
//! or handed to the stream decoder, depending on the call.

use crate::error::{LlmError, parse_error_envelope};
use crate::metrics::{RequestOutcome, record_request};
use crate::request::OutboundRequest;
use crate::stream::ChunkStream;
use crate::transport::{HttpTransport, TransportResponse};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;

/// Executes requests for one provider and classifies the responses
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn HttpTransport>,
    provider: &'static str,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn HttpTransport>, provider: &'static str) -> Self {
        Self {
            transport,
            provider,
        }
    }

    /// Send once and parse the whole body as `R`
    pub async fn send_json<R: DeserializeOwned>(
        &self,
        request: OutboundRequest,
    ) -> Result<R, LlmError> {
        let start = Instant::now();
        let response = self.execute_checked(request, start).await?;

        let body = match response.collect_body().await {
            Ok(body) => body,
            Err(e) => {
                record_request(self.provider, RequestOutcome::TransportError, start.elapsed());
                return Err(e);
            }
        };

        match serde_json::from_slice::<R>(&body) {
            Ok(parsed) => {
                record_request(self.provider, RequestOutcome::Success, start.elapsed());
                Ok(parsed)
            }
            Err(e) => {
                record_request(self.provider, RequestOutcome::DecodeError, start.elapsed());
                log::warn!(
                    "Response from {} did not match the expected shape: {e}",
                    self.provider
                );
                Err(LlmError::deserialization(
                    String::from_utf8_lossy(&body).into_owned(),
                    e,
                ))
            }
        }
    }

    /// Send and decode the body as a stream of `C` chunks
    pub async fn send_stream<C: DeserializeOwned>(
        &self,
        request: OutboundRequest,
        sentinel: Option<&str>,
    ) -> Result<ChunkStream<C>, LlmError> {
        let start = Instant::now();
        let response = self.execute_checked(request, start).await?;
        record_request(self.provider, RequestOutcome::Success, start.elapsed());
        Ok(ChunkStream::new(response.body, sentinel))
    }

    /// Execute and turn non-2xx responses into errors
    async fn execute_checked(
        &self,
        request: OutboundRequest,
        start: Instant,
    ) -> Result<TransportResponse, LlmError> {
        let response = match self.transport.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Request to {} failed: {e}", self.provider);
                record_request(self.provider, RequestOutcome::TransportError, start.elapsed());
                return Err(e);
            }
        };

        if response.is_success() {
            log::debug!(
                "{} answered {} after {:?}",
                self.provider,
                response.status,
                start.elapsed()
            );
            return Ok(response);
        }

        let status = response.status;
        let body = match response.collect_body().await {
            Ok(body) => String::from_utf8_lossy(&body).into_owned(),
            Err(e) => {
                log::debug!("Could not read error body for status {status}: {e}");
                String::new()
            }
        };
        record_request(self.provider, RequestOutcome::ApiError, start.elapsed());

        let error = error_for_status(status, body);
        log::warn!("{} returned an error: {error}", self.provider);
        Err(error)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Classify a non-2xx response body
pub fn error_for_status(status: u16, body: String) -> LlmError {
    match parse_error_envelope(&body) {
        Some((message, code)) => LlmError::api(status, message, code),
        None => LlmError::unexpected_status(status, body),
    }
}
