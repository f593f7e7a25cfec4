//! Outbound request construction
//!
//! [`RequestBuilder`] turns a base URL, an endpoint path, a verb, an encoded
//! body and a header map into one immutable [`OutboundRequest`]. In direct
//! mode it adds `Authorization: Bearer <key>`; in proxied mode it hands the
//! assembled request to a [`ProxySigner`] instead.

use crate::error::LlmError;
use bytes::Bytes;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A fully assembled HTTP request, consumed once by the transport
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Duration,
}

impl OutboundRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Read timeout the transport should enforce
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Split into parts for a transport implementation
    pub fn into_parts(self) -> (Method, Url, HeaderMap, Option<Bytes>, Duration) {
        (self.method, self.url, self.headers, self.body, self.timeout)
    }
}

/// Signs requests for an authenticating proxy.
///
/// Implementations may add headers but see the rest of the request read-only.
pub trait ProxySigner: Send + Sync {
    fn sign(
        &self,
        method: &Method,
        url: &Url,
        body: Option<&[u8]>,
        headers: &mut HeaderMap,
    ) -> Result<(), LlmError>;
}

/// How outbound requests are authenticated
#[derive(Clone)]
pub enum Auth {
    /// Caller-supplied provider key sent as a bearer token
    Direct { api_key: String },
    /// Requests are routed through a signing proxy
    Proxied(Arc<dyn ProxySigner>),
    /// No authentication (local servers)
    None,
}

impl Auth {
    pub fn direct(api_key: impl Into<String>) -> Self {
        Auth::Direct {
            api_key: api_key.into(),
        }
    }
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Auth::Direct { .. } => f.write_str("Direct { api_key: <redacted> }"),
            Auth::Proxied(_) => f.write_str("Proxied"),
            Auth::None => f.write_str("None"),
        }
    }
}

/// Response mode the request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// A single JSON document
    Json,
    /// A server-sent event stream
    EventStream,
}

/// Assembles [`OutboundRequest`]s for one provider
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    auth: Auth,
    default_headers: HeaderMap,
}

impl RequestBuilder {
    pub fn new(auth: Auth) -> Self {
        Self {
            auth,
            default_headers: HeaderMap::new(),
        }
    }

    /// Headers added to every request, e.g. organization or project ids.
    ///
    /// Names or values that are not valid HTTP headers are dropped with a warning.
    pub fn with_headers(mut self, headers: &HashMap<String, String>) -> Self {
        for (key, value) in headers {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(val)) => {
                    self.default_headers.insert(name, val);
                }
                _ => log::warn!("Dropping invalid header '{key}'"),
            }
        }
        self
    }

    /// Build one request.
    ///
    /// `path` is appended to `base_url` with exactly one `/` between them.
    pub fn build(
        &self,
        base_url: &str,
        path: &str,
        method: Method,
        body: Option<Vec<u8>>,
        mode: ResponseMode,
        timeout: Duration,
    ) -> Result<OutboundRequest, LlmError> {
        let url = compose_url(base_url, path)?;

        let mut headers = self.default_headers.clone();
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(match mode {
                ResponseMode::Json => "application/json",
                ResponseMode::EventStream => "text/event-stream",
            }),
        );

        match &self.auth {
            Auth::Direct { api_key } => {
                let mut value = HeaderValue::from_str(&format!("Bearer {api_key}"))
                    .map_err(|_| LlmError::configuration("API key is not a valid header value"))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Auth::Proxied(signer) => {
                signer.sign(&method, &url, body.as_deref(), &mut headers)?;
            }
            Auth::None => {}
        }

        Ok(OutboundRequest {
            method,
            url,
            headers,
            body: body.map(Bytes::from),
            timeout,
        })
    }
}

/// Join base URL and path into an absolute http(s) URL
pub fn compose_url(base_url: &str, path: &str) -> Result<Url, LlmError> {
    let joined = if path.is_empty() {
        base_url.to_string()
    } else {
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    };

    let url = Url::parse(&joined).map_err(|e| LlmError::invalid_url(&joined, e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(LlmError::invalid_url(
            joined,
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(LlmError::invalid_url(joined, "missing host"));
    }
    Ok(url)
}
