use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = LlmError> = std::result::Result<T, E>;

/// Boxed error source carried by several variants
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the LLM client
#[derive(Error, Debug)]
pub enum LlmError {
    /// Base URL and path did not compose into an absolute http(s) URL
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A request value could not be encoded into its wire form
    #[error("Encoding error: {message}")]
    Encoding {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A fragment of external JSON could not be parsed into a wire value
    #[error("Malformed value: {fragment}")]
    MalformedValue {
        fragment: String,
        #[source]
        source: BoxError,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The transport could not reach the provider, or the connection broke mid-body
    #[error("Connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// No response (or no further body bytes) within the request timeout
    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// The provider answered with a non-2xx status and a structured error body
    #[error("API error (status {status}): {}", .message.as_deref().unwrap_or("no message"))]
    Api {
        status: u16,
        message: Option<String>,
        code: Option<String>,
    },

    /// Non-2xx status whose body was not a recognisable error envelope
    #[error("Unexpected HTTP status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    /// 2xx status but the body did not match the expected response shape
    #[error("Failed to deserialize response body: {source}")]
    Deserialization {
        body: String,
        #[source]
        source: BoxError,
    },

    /// One streamed frame failed to parse; the stream ends here
    #[error("Failed to decode stream frame '{frame}': {source}")]
    Decode {
        frame: String,
        #[source]
        source: BoxError,
    },

    /// The provider sent an error envelope in place of a stream chunk
    #[error("Stream error from provider: {message}")]
    Stream {
        message: String,
        code: Option<String>,
    },
}

impl LlmError {
    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create an encoding error
    pub fn encoding(message: impl Into<String>) -> Self {
        Self::Encoding {
            message: message.into(),
            source: None,
        }
    }

    /// Create an encoding error with source
    pub fn encoding_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Encoding {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a malformed value error
    pub fn malformed_value(fragment: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::MalformedValue {
            fragment: fragment.into(),
            source: source.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a connection error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connection error with source
    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a timeout error
    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    /// Create an API error
    pub fn api(status: u16, message: Option<String>, code: Option<String>) -> Self {
        Self::Api {
            status,
            message,
            code,
        }
    }

    /// Create an unexpected status error
    pub fn unexpected_status(status: u16, body: impl Into<String>) -> Self {
        Self::UnexpectedStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a deserialization error
    pub fn deserialization(body: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Deserialization {
            body: body.into(),
            source: source.into(),
        }
    }

    /// Create a frame decode error
    pub fn decode(frame: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            frame: frame.into(),
            source: source.into(),
        }
    }

    /// Create an in-stream provider error
    pub fn stream(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Stream {
            message: message.into(),
            code,
        }
    }

    /// HTTP status attached to the error, if the provider answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::Api { status, .. } | LlmError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Whether an outer retry layer could reasonably try the call again.
    ///
    /// Nothing inside this crate retries; the classification is for callers.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::ConnectionFailed { .. } | LlmError::Timeout { .. } => true,
            LlmError::Api { status, .. } | LlmError::UnexpectedStatus { status, .. } => {
                matches!(status, 408 | 429 | 500 | 502 | 503 | 504)
            }
            _ => false,
        }
    }
}

/// Classify transport failures from reqwest
impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not report the configured limit
            LlmError::timeout(Duration::ZERO)
        } else if err.is_connect() {
            LlmError::connection_failed_with_source("Connection failed", err)
        } else if err.is_builder() {
            LlmError::encoding_with_source("Invalid request", err)
        } else {
            LlmError::connection_failed_with_source("HTTP request failed", err)
        }
    }
}

/// Convert from serde_json errors raised while encoding request bodies
impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::encoding_with_source("JSON serialization failed", err)
    }
}

/// Structured error body sent by OpenAI-compatible providers.
///
/// Most nest the details under `error`; xAI sends `error` as a plain string
/// next to a top-level `code`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Nested {
        error: ErrorDetail,
    },
    Flat {
        error: String,
        #[serde(default)]
        code: Option<serde_json::Value>,
    },
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Message and code of an error envelope, or `None` if `body` is not one
pub(crate) fn parse_error_envelope(body: &str) -> Option<(Option<String>, Option<String>)> {
    match serde_json::from_str::<ErrorEnvelope>(body).ok()? {
        ErrorEnvelope::Nested { error } => {
            let code = error.code.and_then(code_string);
            Some((error.message.or(error.kind), code))
        }
        ErrorEnvelope::Flat { error, code } => Some((Some(error), code.and_then(code_string))),
    }
}

fn code_string(code: serde_json::Value) -> Option<String> {
    match code {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display_with_and_without_message() {
        let err = LlmError::api(401, Some("Incorrect API key".to_string()), None);
        assert_eq!(
            err.to_string(),
            "API error (status 401): Incorrect API key"
        );

        let err = LlmError::api(500, None, None);
        assert_eq!(err.to_string(), "API error (status 500): no message");
    }

    #[test]
    fn test_status_accessor() {
        assert_eq!(LlmError::unexpected_status(502, "<html>").status(), Some(502));
        assert_eq!(LlmError::timeout(Duration::from_secs(1)).status(), None);
    }

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::timeout(Duration::from_secs(5)).is_transient());
        assert!(LlmError::connection_failed("reset").is_transient());
        assert!(LlmError::api(429, None, None).is_transient());
        assert!(LlmError::unexpected_status(503, "").is_transient());
        assert!(!LlmError::api(400, None, None).is_transient());
        assert!(!LlmError::encoding("bad").is_transient());
        assert!(
            !LlmError::decode("{", serde_json::from_str::<u8>("{").unwrap_err()).is_transient()
        );
    }

    #[test]
    fn test_decode_error_keeps_frame_and_source() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = LlmError::decode("{oops", source);
        match &err {
            LlmError::Decode { frame, .. } => assert_eq!(frame, "{oops"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_parse_nested_error_envelope() {
        let body = r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#;
        assert_eq!(
            parse_error_envelope(body),
            Some((
                Some("Rate limit reached".to_string()),
                Some("rate_limit_exceeded".to_string())
            ))
        );

        let numeric = r#"{"error":{"type":"overloaded","code":529}}"#;
        assert_eq!(
            parse_error_envelope(numeric),
            Some((Some("overloaded".to_string()), Some("529".to_string())))
        );
    }

    #[test]
    fn test_parse_flat_error_envelope() {
        let body = r#"{"code":"Client specified an invalid argument","error":"Incorrect API key provided"}"#;
        assert_eq!(
            parse_error_envelope(body),
            Some((
                Some("Incorrect API key provided".to_string()),
                Some("Client specified an invalid argument".to_string())
            ))
        );
    }

    #[test]
    fn test_non_envelope_bodies() {
        assert_eq!(parse_error_envelope("<html>Bad Gateway</html>"), None);
        assert_eq!(parse_error_envelope(r#"{"choices":[]}"#), None);
        assert_eq!(parse_error_envelope(""), None);
    }
}
