//! Request and response types for OpenAI-compatible endpoints
//!
//! Three request families are supported: chat completions, image generation
//! and response generation. Each request type names its endpoint and its
//! response type through [`ApiRequest`]; the streamable ones also name the
//! chunk type their event stream carries through [`StreamingRequest`].

pub mod chat;
pub mod images;
pub mod models;
pub mod responses;

pub use chat::*;
pub use images::*;
pub use models::*;
pub use responses::*;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// A request that can be sent once and answered with a single JSON document
pub trait ApiRequest: Serialize + Clone + Send + Sync {
    /// Parsed body of a successful response
    type Response: DeserializeOwned + Send;

    /// Endpoint path relative to the provider base URL
    const PATH: &'static str;

    /// Model the request targets
    fn model(&self) -> &str;

    /// Whether the request currently asks for an event stream
    fn wants_stream(&self) -> bool {
        false
    }

    /// Clear any streaming flags so the provider answers with one document
    fn disable_streaming(&mut self) {}
}

/// A request whose response can be delivered as a server-sent event stream
pub trait StreamingRequest: ApiRequest {
    /// Parsed payload of one stream frame
    type Chunk: DeserializeOwned + Send + 'static;

    /// Force the streaming flavor of the request.
    ///
    /// `include_usage` is set when the provider accepts `stream_options`.
    fn enable_streaming(&mut self, include_usage: bool);
}
