//! HTTP transport collaborator
//!
//! The rest of the crate only needs "send this request, give me a status,
//! headers and a byte stream". [`HttpTransport`] is that seam;
//! [`ReqwestTransport`] is the default implementation.

use crate::error::LlmError;
use crate::request::OutboundRequest;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::HeaderMap;
use std::pin::Pin;
use std::time::Duration;

/// Response body as a stream of byte chunks. Dropping it closes the connection.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, LlmError>> + Send>>;

/// Status line, headers and unconsumed body of an HTTP response
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Read the whole body into memory
    pub async fn collect_body(self) -> Result<Bytes, LlmError> {
        let mut body = self.body;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer.freeze())
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Executes outbound requests
#[async_trait::async_trait]
pub trait HttpTransport: Send + Sync {
    /// Send the request and return once response headers have arrived.
    ///
    /// Implementations must enforce [`OutboundRequest::timeout`] and report
    /// failures as [`LlmError::ConnectionFailed`] or [`LlmError::Timeout`].
    async fn execute(&self, request: OutboundRequest) -> Result<TransportResponse, LlmError>;
}

/// [`HttpTransport`] backed by a shared `reqwest::Client`
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing client (and its connection pool)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<TransportResponse, LlmError> {
        let (method, url, headers, body, timeout) = request.into_parts();
        log::debug!("{method} {url}");

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = match tokio::time::timeout(timeout, builder.send()).await {
            Ok(result) => result.map_err(|e| classify(e, timeout))?,
            Err(_) => return Err(LlmError::timeout(timeout)),
        };

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = with_read_timeout(response.bytes_stream(), timeout);

        Ok(TransportResponse {
            status,
            headers,
            body: Box::pin(body),
        })
    }
}

fn classify(err: reqwest::Error, timeout: Duration) -> LlmError {
    if err.is_timeout() {
        LlmError::timeout(timeout)
    } else {
        LlmError::from(err)
    }
}

/// Fail the body with a timeout when no bytes arrive for `timeout`.
///
/// The limit applies per read, so long streams that keep producing are not cut off.
fn with_read_timeout<S>(stream: S, timeout: Duration) -> impl Stream<Item = Result<Bytes, LlmError>> + Send
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    async_stream::stream! {
        let mut stream = Box::pin(stream);
        loop {
            match tokio::time::timeout(timeout, stream.next()).await {
                Ok(Some(Ok(bytes))) => yield Ok(bytes),
                Ok(Some(Err(e))) => {
                    yield Err(classify(e, timeout));
                    break;
                }
                Ok(None) => break,
                Err(_) => {
                    yield Err(LlmError::timeout(timeout));
                    break;
                }
            }
        }
    }
}
