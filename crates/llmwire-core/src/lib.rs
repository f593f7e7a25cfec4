//! # llmwire-core - OpenAI-compatible LLM client core
//!
//! Encodes strongly typed requests into the exact JSON an OpenAI-compatible
//! provider expects, sends them, and decodes the answer either as one JSON
//! document or as a lazily pulled stream of typed chunks.
//!
//! ## Features
//!
//! - **Typed requests** - chat completions, image generation and the responses API
//! - **Deterministic encoding** - tagged variants map to exactly one wire shape
//! - **Streaming** - SSE frames reassembled across arbitrary read boundaries,
//!   `[DONE]` handled, decode failures reported instead of skipped
//! - **Cancellation** - dropping a stream closes the connection exactly once
//! - **Providers** - OpenAI, xAI, Groq, OpenRouter, DeepSeek
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use llmwire_core::{ChatCompletionRequest, ClientConfig, LlmClient, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LlmClient::new(ClientConfig::xai("your-api-key"))?;
//!     let request = ChatCompletionRequest::new(
//!         "grok-3-mini",
//!         vec![Message::system("be terse"), Message::user("hi")],
//!     );
//!     let response = client.chat_completion(request).await?;
//!     println!("{}", response.content().unwrap_or_default());
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use llmwire_core::{ChatCompletionRequest, LlmClient, Message, identities};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LlmClient::from_env(identities::XAI)?;
//!     let request = ChatCompletionRequest::new("grok-3-mini", vec![Message::user("hi")]);
//!
//!     let mut stream = client.send_streaming(request, Duration::from_secs(30)).await?;
//!     while let Some(chunk) = stream.next().await {
//!         if let Some(text) = chunk?.content() {
//!             print!("{text}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every call returns [`Result<T, LlmError>`](LlmError). A stream ends either
//! with `None` (clean end) or with one final `Err` item:
//!
//! ```rust,no_run
//! # use llmwire_core::{LlmClient, LlmError, ChatCompletionRequest};
//! # async fn run(client: LlmClient, request: ChatCompletionRequest) {
//! match client.chat_completion(request).await {
//!     Ok(response) => println!("Success: {:?}", response.content()),
//!     Err(LlmError::Api { status, message, .. }) => {
//!         println!("Provider rejected the request ({status}): {message:?}")
//!     }
//!     Err(e) if e.is_transient() => println!("Worth retrying: {e}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! # }
//! ```

pub mod client;
pub mod config;
pub mod dispatch;
pub mod encode;
pub mod error;
pub mod metrics;
pub mod providers;
pub mod request;
pub mod stream;
pub mod transport;
pub mod types;
pub mod utils;
pub mod value;


pub use client::{LlmClient, LlmStream};
pub use config::ClientConfig;
pub use dispatch::Dispatcher;
pub use encode::{WireEncode, encode_body};
pub use error::{LlmError, Result};
pub use metrics::MetricsStream;
pub use providers::{ProviderIdentity, identities};
pub use request::{Auth, OutboundRequest, ProxySigner, RequestBuilder, ResponseMode};
pub use stream::ChunkStream;
pub use transport::{ByteStream, HttpTransport, ReqwestTransport, TransportResponse};
pub use types::{
    ApiRequest, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse, ContentPart,
    ImageGenerationRequest, ImageGenerationResponse, Message, ResponseFormat, ResponseObject,
    ResponseRequest, ResponseStreamEvent, StreamingRequest, Tool, ToolChoice,
};
pub use utils::sse::{DONE_SENTINEL, FrameDecoder, SseFrame};
pub use value::WireValue;
