use crate::config::ClientConfig;
use crate::dispatch::Dispatcher;
use crate::encode::encode_body;
use crate::error::LlmError;
use crate::metrics::MetricsStream;
use crate::providers::ProviderIdentity;
use crate::request::{Auth, ProxySigner, RequestBuilder, ResponseMode};
use crate::stream::ChunkStream;
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::types::{
    ApiRequest, ChatCompletionChunk, ChatCompletionRequest, ChatCompletionResponse,
    ImageGenerationRequest, ImageGenerationResponse, MODELS_PATH, ModelList, ResponseObject,
    ResponseRequest, ResponseStreamEvent, StreamingRequest,
};
use reqwest::Method;
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

/// Chunk sequence returned by streaming calls.
///
/// Lazy and single-pass. Dropping it, or calling `close`, releases the connection.
pub type LlmStream<T> = MetricsStream<ChunkStream<T>>;

/// Client for one OpenAI-compatible provider.
///
/// Cheap to clone; clones share the transport. Calls hold no shared mutable
/// state, so one client can serve many concurrent requests.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: ClientConfig,
    builder: RequestBuilder,
    dispatcher: Dispatcher,
}

impl LlmClient {
    /// Create a client that sends requests with reqwest
    pub fn new(config: ClientConfig) -> Result<Self, LlmError> {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Create client from environment variables
    pub fn from_env(identity: ProviderIdentity) -> Result<Self, LlmError> {
        Self::new(ClientConfig::from_env(identity)?)
    }

    /// Create a client in direct mode over a custom transport
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, LlmError> {
        config.validate()?;
        let auth = Auth::direct(config.api_key.clone());
        Ok(Self::assemble(config, auth, transport))
    }

    /// Create a client whose requests are signed by an authenticating proxy.
    ///
    /// The configured API key is not sent.
    pub fn proxied(
        config: ClientConfig,
        signer: Arc<dyn ProxySigner>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, LlmError> {
        config.validate_endpoint()?;
        Ok(Self::assemble(config, Auth::Proxied(signer), transport))
    }

    fn assemble(config: ClientConfig, auth: Auth, transport: Arc<dyn HttpTransport>) -> Self {
        let builder = RequestBuilder::new(auth).with_headers(&config.headers());
        let dispatcher = Dispatcher::new(transport, config.identity.name);
        Self {
            config,
            builder,
            dispatcher,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn identity(&self) -> ProviderIdentity {
        self.config.identity
    }

    /// Send a request and parse the single JSON response.
    ///
    /// Streaming flags set on the request are cleared first; use
    /// [`send_streaming`](Self::send_streaming) for the event-stream flavor.
    pub async fn send_once<R: ApiRequest>(
        &self,
        request: &R,
        timeout: Duration,
    ) -> Result<R::Response, LlmError> {
        let request = if request.wants_stream() {
            log::debug!("Clearing stream flag on one-shot {} request", R::PATH);
            let mut owned = request.clone();
            owned.disable_streaming();
            Cow::Owned(owned)
        } else {
            Cow::Borrowed(request)
        };
        log::debug!(
            "Sending {} request to {} for model {}",
            R::PATH,
            self.config.identity.name,
            request.model()
        );
        let body = encode_body(&*request)?;
        let outbound = self.builder.build(
            self.config.base_url(),
            R::PATH,
            Method::POST,
            Some(body),
            ResponseMode::Json,
            timeout,
        )?;
        self.dispatcher.send_json(outbound).await
    }

    /// Send the streaming flavor of a request.
    ///
    /// Forces `stream: true` (plus `stream_options` where the provider
    /// supports it) and returns once response headers arrive. Chunks are
    /// decoded as the caller pulls them.
    pub async fn send_streaming<R: StreamingRequest>(
        &self,
        mut request: R,
        timeout: Duration,
    ) -> Result<LlmStream<R::Chunk>, LlmError> {
        request.enable_streaming(self.config.identity.supports_stream_options);
        log::debug!(
            "Opening {} stream to {} for model {}",
            R::PATH,
            self.config.identity.name,
            request.model()
        );

        let body = encode_body(&request)?;
        let outbound = self.builder.build(
            self.config.base_url(),
            R::PATH,
            Method::POST,
            Some(body),
            ResponseMode::EventStream,
            timeout,
        )?;
        let stream = self
            .dispatcher
            .send_stream::<R::Chunk>(outbound, self.config.identity.sentinel)
            .await?;
        Ok(MetricsStream::new(stream, self.config.identity.name))
    }

    /// Send a chat completion request
    pub async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, LlmError> {
        self.send_once(&request, self.config.timeout()).await
    }

    /// Send a streaming chat completion request
    pub async fn chat_completion_stream(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<LlmStream<ChatCompletionChunk>, LlmError> {
        self.send_streaming(request, self.config.timeout()).await
    }

    pub async fn generate_image(
        &self,
        request: ImageGenerationRequest,
    ) -> Result<ImageGenerationResponse, LlmError> {
        self.send_once(&request, self.config.timeout()).await
    }

    pub async fn create_response(&self, request: ResponseRequest) -> Result<ResponseObject, LlmError> {
        self.send_once(&request, self.config.timeout()).await
    }

    pub async fn create_response_stream(
        &self,
        request: ResponseRequest,
    ) -> Result<LlmStream<ResponseStreamEvent>, LlmError> {
        self.send_streaming(request, self.config.timeout()).await
    }

    /// List the models the provider serves
    pub async fn list_models(&self) -> Result<ModelList, LlmError> {
        let outbound = self.builder.build(
            self.config.base_url(),
            MODELS_PATH,
            Method::GET,
            None,
            ResponseMode::Json,
            self.config.timeout(),
        )?;
        self.dispatcher.send_json(outbound).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::identities;
    use crate::types::{Message, StreamOptions};
    use crate::utils::test_helpers::{MockResponse, MockTransport};
    use futures::StreamExt;
    use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};

    fn client(transport: Arc<MockTransport>, config: ClientConfig) -> LlmClient {
        LlmClient::with_transport(config, transport).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let transport = Arc::new(MockTransport::always(MockResponse::json(200, "{}")));
        assert!(LlmClient::with_transport(ClientConfig::xai(""), transport.clone()).is_err());
        assert!(
            LlmClient::with_transport(
                ClientConfig::xai("key").with_base_url("not a url"),
                transport
            )
            .is_err()
        );
    }

    #[tokio::test]
    async fn test_send_once_builds_request() {
        let transport = Arc::new(MockTransport::always(MockResponse::json(
            200,
            r#"{"id":"c1","object":"chat.completion","created":1,"model":"grok-3-mini","choices":[{"index":0,"message":{"role":"assistant","content":"Hello"},"finish_reason":"stop"}]}"#,
        )));
        let client = client(
            transport.clone(),
            ClientConfig::xai("xai-key").with_project("proj"),
        );

        let request = ChatCompletionRequest::new("grok-3-mini", vec![Message::user("hi")]);
        let response = client
            .send_once(&request, Duration::from_secs(7))
            .await
            .unwrap();
        assert_eq!(response.content(), Some("Hello"));

        let sent = &transport.requests()[0];
        assert_eq!(sent.method(), &Method::POST);
        assert_eq!(sent.url().as_str(), "https://api.x.ai/v1/chat/completions");
        assert_eq!(sent.headers()[AUTHORIZATION], "Bearer xai-key");
        assert_eq!(sent.headers()[CONTENT_TYPE], "application/json");
        assert_eq!(sent.headers()[ACCEPT], "application/json");
        assert_eq!(sent.headers()["openai-project"], "proj");
        assert_eq!(sent.timeout(), Duration::from_secs(7));
        assert!(!transport.last_body().unwrap().contains("stream"));
    }

    #[tokio::test]
    async fn test_send_once_clears_caller_stream_flag() {
        let transport = Arc::new(MockTransport::always(MockResponse::json(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"Hello"}}]}"#,
        )));
        let client = client(transport.clone(), ClientConfig::xai("xai-key"));

        let request = ChatCompletionRequest::new("grok-3-mini", vec![Message::user("hi")])
            .stream(true)
            .stream_options(StreamOptions {
                include_usage: true,
            });
        let response = client
            .send_once(&request, Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(response.content(), Some("Hello"));

        let body = transport.last_body().unwrap();
        assert!(!body.contains("stream"), "one-shot body was {body}");
        assert_eq!(transport.requests()[0].headers()[ACCEPT], "application/json");
        // caller's request is left untouched
        assert_eq!(request.stream, Some(true));
    }

    #[tokio::test]
    async fn test_create_response_clears_stream_flag() {
        let transport = Arc::new(MockTransport::always(MockResponse::json(
            200,
            r#"{"id":"resp_1","status":"completed","output":[]}"#,
        )));
        let client = client(transport.clone(), ClientConfig::xai("xai-key"));

        let mut request = ResponseRequest::new("grok-3-mini", "hi");
        request.stream = Some(true);
        client.create_response(request).await.unwrap();

        let body: serde_json::Value =
            serde_json::from_str(&transport.last_body().unwrap()).unwrap();
        assert!(body.get("stream").is_none());
    }

    #[tokio::test]
    async fn test_send_streaming_forces_stream_flag() {
        let transport = Arc::new(MockTransport::always(MockResponse::sse(
            200,
            &[
                r#"{"choices":[{"index":0,"delta":{"role":"assistant","content":"Hel"}}]}"#,
                r#"{"choices":[{"index":0,"delta":{"content":"lo"},"finish_reason":"stop"}]}"#,
                r#"{"choices":[],"usage":{"prompt_tokens":3,"completion_tokens":2,"total_tokens":5}}"#,
                "[DONE]",
            ],
        )));
        let client = client(transport.clone(), ClientConfig::openai("sk-test"));

        let request = ChatCompletionRequest::new("gpt-4o-mini", vec![Message::user("hi")]);
        let stream = client.chat_completion_stream(request).await.unwrap();
        let chunks: Vec<ChatCompletionChunk> =
            stream.map(|chunk| chunk.unwrap()).collect().await;

        let text: String = chunks.iter().filter_map(|c| c.content()).collect();
        assert_eq!(text, "Hello");
        assert_eq!(chunks[1].finish_reason(), Some("stop"));
        assert_eq!(chunks[2].usage.as_ref().map(|u| u.total_tokens), Some(5));

        let sent = &transport.requests()[0];
        assert_eq!(sent.headers()[ACCEPT], "text/event-stream");
        let body: serde_json::Value =
            serde_json::from_str(&transport.last_body().unwrap()).unwrap();
        assert_eq!(body["stream"], true);
        assert_eq!(body["stream_options"]["include_usage"], true);
    }

    #[tokio::test]
    async fn test_stream_options_omitted_when_unsupported() {
        let transport = Arc::new(MockTransport::always(MockResponse::sse(200, &["[DONE]"])));
        let client = client(transport.clone(), ClientConfig::groq("gsk_test"));

        let request = ChatCompletionRequest::new("llama-3.1-8b-instant", vec![Message::user("hi")]);
        let mut stream = client.chat_completion_stream(request).await.unwrap();
        assert!(stream.next().await.is_none());

        let body: serde_json::Value =
            serde_json::from_str(&transport.last_body().unwrap()).unwrap();
        assert_eq!(body["stream"], true);
        assert!(body.get("stream_options").is_none());
    }

    #[tokio::test]
    async fn test_list_models_uses_get_without_body() {
        let transport = Arc::new(MockTransport::always(MockResponse::json(
            200,
            r#"{"object":"list","data":[{"id":"grok-3"},{"id":"grok-3-mini","owned_by":"xai"}]}"#,
        )));
        let client = client(transport.clone(), ClientConfig::xai("xai-key"));

        let models = client.list_models().await.unwrap();
        assert_eq!(models.ids(), vec!["grok-3", "grok-3-mini"]);

        let sent = &transport.requests()[0];
        assert_eq!(sent.method(), &Method::GET);
        assert_eq!(sent.url().as_str(), "https://api.x.ai/v1/models");
        assert!(sent.body().is_none());
        assert!(sent.headers().get(CONTENT_TYPE).is_none());
    }

    #[tokio::test]
    async fn test_proxied_client_does_not_send_key() {
        struct StaticSigner;
        impl ProxySigner for StaticSigner {
            fn sign(
                &self,
                _method: &Method,
                _url: &reqwest::Url,
                _body: Option<&[u8]>,
                headers: &mut reqwest::header::HeaderMap,
            ) -> Result<(), LlmError> {
                headers.insert("x-proxy-token", "signed".parse().unwrap());
                Ok(())
            }
        }

        let transport = Arc::new(MockTransport::always(MockResponse::json(
            200,
            r#"{"data":[]}"#,
        )));
        let client = LlmClient::proxied(
            ClientConfig::new(identities::OPENAI, ""),
            Arc::new(StaticSigner),
            transport.clone(),
        )
        .unwrap();
        client.list_models().await.unwrap();

        let sent = &transport.requests()[0];
        assert!(sent.headers().get(AUTHORIZATION).is_none());
        assert_eq!(sent.headers()["x-proxy-token"], "signed");
    }
}
