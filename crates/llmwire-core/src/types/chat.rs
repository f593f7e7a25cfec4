//! Chat Completions API types
//!
//! Request-side variants (`Message`, `Tool`, `ToolChoice`, `ResponseFormat`,
//! ...) are encoded through [`WireEncode`]; response-side types are plain
//! serde structs that tolerate missing optional fields.

use super::{ApiRequest, StreamingRequest};
use crate::encode::WireEncode;
use crate::value::WireValue;
use serde::{Deserialize, Serialize};

/// Chat completion request with the commonly supported parameters
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    /// The model to use (e.g. "grok-3-mini", "gpt-4o")
    pub model: String,

    /// Conversation so far, oldest first
    pub messages: Vec<Message>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Number of choices to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    /// Maximum number of tokens to generate (legacy name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Maximum number of completion tokens, including reasoning tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,

    /// Sequences that stop generation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,

    /// Best-effort deterministic sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,

    /// End-user identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Tools the model may call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,

    /// How the model should use the provided tools
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_tool_calls: Option<bool>,

    /// Output format constraint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,

    /// Reasoning budget for reasoning models
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning_effort: Option<ReasoningEffort>,

    /// Whether to stream the response as server-sent events
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    /// Streaming options, only meaningful with `stream: true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            n: None,
            max_tokens: None,
            max_completion_tokens: None,
            stop: None,
            presence_penalty: None,
            frequency_penalty: None,
            seed: None,
            user: None,
            tools: None,
            tool_choice: None,
            parallel_tool_calls: None,
            response_format: None,
            reasoning_effort: None,
            stream: None,
            stream_options: None,
        }
    }

    pub fn message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn max_completion_tokens(mut self, max_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_tokens);
        self
    }

    pub fn stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(tool);
        self
    }

    pub fn tool_choice(mut self, tool_choice: ToolChoice) -> Self {
        self.tool_choice = Some(tool_choice);
        self
    }

    pub fn parallel_tool_calls(mut self, enabled: bool) -> Self {
        self.parallel_tool_calls = Some(enabled);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning_effort = Some(effort);
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    pub fn stream_options(mut self, options: StreamOptions) -> Self {
        self.stream_options = Some(options);
        self
    }
}

impl ApiRequest for ChatCompletionRequest {
    type Response = ChatCompletionResponse;
    const PATH: &'static str = "/chat/completions";

    fn model(&self) -> &str {
        &self.model
    }

    fn wants_stream(&self) -> bool {
        self.stream == Some(true) || self.stream_options.is_some()
    }

    fn disable_streaming(&mut self) {
        self.stream = None;
        self.stream_options = None;
    }
}

impl StreamingRequest for ChatCompletionRequest {
    type Chunk = ChatCompletionChunk;

    fn enable_streaming(&mut self, include_usage: bool) {
        self.stream = Some(true);
        if include_usage && self.stream_options.is_none() {
            self.stream_options = Some(StreamOptions {
                include_usage: true,
            });
        }
    }
}

/// A message in the conversation, tagged by `role` on the wire
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    System {
        content: String,
        name: Option<String>,
    },
    User {
        content: UserContent,
        name: Option<String>,
    },
    Assistant {
        content: Option<String>,
        name: Option<String>,
        tool_calls: Vec<ToolCall>,
    },
    /// Result of a tool call, answered back to the model
    Tool {
        content: String,
        tool_call_id: String,
    },
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Message::System {
            content: content.into(),
            name: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Message::User {
            content: UserContent::Text(content.into()),
            name: None,
        }
    }

    /// User message made of several parts (text and images)
    pub fn user_parts(parts: Vec<ContentPart>) -> Self {
        Message::User {
            content: UserContent::Parts(parts),
            name: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Message::Assistant {
            content: Some(content.into()),
            name: None,
            tool_calls: Vec::new(),
        }
    }

    /// Assistant turn that only requested tool calls
    pub fn assistant_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Message::Assistant {
            content: None,
            name: None,
            tool_calls,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Message::Tool {
            content: content.into(),
            tool_call_id: tool_call_id.into(),
        }
    }

    /// Attach a participant name; ignored for tool messages
    pub fn with_name(mut self, new_name: impl Into<String>) -> Self {
        match &mut self {
            Message::System { name, .. }
            | Message::User { name, .. }
            | Message::Assistant { name, .. } => *name = Some(new_name.into()),
            Message::Tool { .. } => {}
        }
        self
    }

    pub fn role(&self) -> &'static str {
        match self {
            Message::System { .. } => "system",
            Message::User { .. } => "user",
            Message::Assistant { .. } => "assistant",
            Message::Tool { .. } => "tool",
        }
    }
}

impl WireEncode for Message {
    fn to_wire(&self) -> WireValue {
        let wire = WireValue::object().with("role", self.role());
        match self {
            Message::System { content, name } => {
                wire.with("content", content).with_opt("name", name.as_ref())
            }
            Message::User { content, name } => wire
                .with("content", content.to_wire())
                .with_opt("name", name.as_ref()),
            Message::Assistant {
                content,
                name,
                tool_calls,
            } => {
                let wire = wire
                    .with_opt("content", content.as_ref())
                    .with_opt("name", name.as_ref());
                if tool_calls.is_empty() {
                    wire
                } else {
                    wire.with("tool_calls", tool_calls.to_wire())
                }
            }
            Message::Tool {
                content,
                tool_call_id,
            } => wire
                .with("content", content)
                .with("tool_call_id", tool_call_id),
        }
    }
}

/// User content is either a bare string or an array of typed parts
#[derive(Debug, Clone, PartialEq)]
pub enum UserContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl WireEncode for UserContent {
    fn to_wire(&self) -> WireValue {
        match self {
            UserContent::Text(text) => WireValue::from(text),
            UserContent::Parts(parts) => parts.to_wire(),
        }
    }
}

/// One part of a multi-part user message
#[derive(Debug, Clone, PartialEq)]
pub enum ContentPart {
    Text {
        text: String,
    },
    /// Image by URL or `data:` URI
    ImageUrl {
        url: String,
        detail: Option<ImageDetail>,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            url: url.into(),
            detail: None,
        }
    }
}

impl WireEncode for ContentPart {
    fn to_wire(&self) -> WireValue {
        match self {
            ContentPart::Text { text } => WireValue::object().with("type", "text").with("text", text),
            ContentPart::ImageUrl { url, detail } => WireValue::object()
                .with("type", "image_url")
                .with(
                    "image_url",
                    WireValue::object()
                        .with("url", url)
                        .with_opt("detail", detail.map(ImageDetail::as_str)),
                ),
        }
    }
}

/// Image fidelity hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageDetail {
    Auto,
    Low,
    High,
}

impl ImageDetail {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageDetail::Auto => "auto",
            ImageDetail::Low => "low",
            ImageDetail::High => "high",
        }
    }
}

/// A tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

impl ToolCall {
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

impl WireEncode for ToolCall {
    fn to_wire(&self) -> WireValue {
        WireValue::object()
            .with("id", &self.id)
            .with("type", &self.kind)
            .with(
                "function",
                WireValue::object()
                    .with("name", &self.function.name)
                    .with("arguments", &self.function.arguments),
            )
    }
}

/// Function name and JSON-encoded arguments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments as the model produced them (a JSON string, possibly invalid)
    #[serde(default)]
    pub arguments: String,
}

/// A tool the model may call
#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    Function(FunctionDefinition),
}

impl Tool {
    pub fn function(name: impl Into<String>) -> FunctionDefinition {
        FunctionDefinition {
            name: name.into(),
            description: None,
            parameters: None,
            strict: None,
        }
    }
}

/// Function tool definition
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: Option<String>,
    /// JSON schema of the arguments
    pub parameters: Option<WireValue>,
    pub strict: Option<bool>,
}

impl FunctionDefinition {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn parameters(mut self, schema: WireValue) -> Self {
        self.parameters = Some(schema);
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub fn build(self) -> Tool {
        Tool::Function(self)
    }

    fn to_wire_fields(&self) -> WireValue {
        WireValue::object()
            .with("name", &self.name)
            .with_opt("description", self.description.as_ref())
            .with_opt("parameters", self.parameters.clone())
            .with_opt("strict", self.strict)
    }
}

impl WireEncode for Tool {
    fn to_wire(&self) -> WireValue {
        match self {
            Tool::Function(function) => WireValue::object()
                .with("type", "function")
                .with("function", function.to_wire_fields()),
        }
    }
}

/// Tool selection policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolChoice {
    /// Never call tools
    None,
    /// Let the model decide
    Auto,
    /// Call at least one tool
    Required,
    /// Call this specific function
    Function { name: String },
}

impl ToolChoice {
    pub fn function(name: impl Into<String>) -> Self {
        ToolChoice::Function { name: name.into() }
    }
}

impl WireEncode for ToolChoice {
    fn to_wire(&self) -> WireValue {
        match self {
            ToolChoice::None => WireValue::from("none"),
            ToolChoice::Auto => WireValue::from("auto"),
            ToolChoice::Required => WireValue::from("required"),
            ToolChoice::Function { name } => WireValue::object()
                .with("type", "function")
                .with("function", WireValue::object().with("name", name)),
        }
    }
}

/// Output format constraint
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseFormat {
    Text,
    JsonObject,
    JsonSchema(JsonSchemaFormat),
}

/// Named JSON schema the output must follow
#[derive(Debug, Clone, PartialEq)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub description: Option<String>,
    pub schema: WireValue,
    pub strict: Option<bool>,
}

impl JsonSchemaFormat {
    pub fn new(name: impl Into<String>, schema: WireValue) -> Self {
        Self {
            name: name.into(),
            description: None,
            schema,
            strict: None,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = Some(strict);
        self
    }

    pub(crate) fn to_wire_fields(&self) -> WireValue {
        WireValue::object()
            .with("name", &self.name)
            .with_opt("description", self.description.as_ref())
            .with("schema", self.schema.clone())
            .with_opt("strict", self.strict)
    }
}

impl WireEncode for ResponseFormat {
    fn to_wire(&self) -> WireValue {
        match self {
            ResponseFormat::Text => WireValue::object().with("type", "text"),
            ResponseFormat::JsonObject => WireValue::object().with("type", "json_object"),
            ResponseFormat::JsonSchema(format) => WireValue::object()
                .with("type", "json_schema")
                .with("json_schema", format.to_wire_fields()),
        }
    }
}

/// Reasoning budget hint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

impl WireEncode for ReasoningEffort {
    fn to_wire(&self) -> WireValue {
        WireValue::from(match self {
            ReasoningEffort::Low => "low",
            ReasoningEffort::Medium => "medium",
            ReasoningEffort::High => "high",
        })
    }
}

crate::serialize_via_wire!(Message, UserContent, ContentPart, Tool, ToolChoice, ResponseFormat, ReasoningEffort);

/// Options for streamed responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamOptions {
    /// Ask for a final chunk carrying token usage
    pub include_usage: bool,
}

/// Chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice, if any
    pub fn content(&self) -> Option<&str> {
        self.choices.first()?.message.content.as_deref()
    }
}

/// One generated alternative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: AssistantMessage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Message generated by the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantMessage {
    #[serde(default = "assistant_role")]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Reasoning trace, for providers that expose it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refusal: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tool_calls: Vec<ToolCall>,
}

fn assistant_role() -> String {
    "assistant".to_string()
}

/// Some compatible servers send `"tool_calls": null` instead of omitting it
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// One streamed fragment of a chat completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created: u64,
    #[serde(default)]
    pub model: String,
    /// Empty on the trailing usage chunk
    pub choices: Vec<ChunkChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

impl ChatCompletionChunk {
    /// Content delta of the first choice, if any
    pub fn content(&self) -> Option<&str> {
        self.choices.first()?.delta.content.as_deref()
    }

    /// Finish reason of the first choice, if this chunk ends it
    pub fn finish_reason(&self) -> Option<&str> {
        self.choices.first()?.finish_reason.as_deref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Incremental message fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning_content: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub tool_calls: Vec<ToolCallDelta>,
}

/// Partial tool call; `id` and `function.name` arrive on the first fragment only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallDelta {
    #[serde(default)]
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function: Option<FunctionCallDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallDelta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_body;

    fn encode<T: WireEncode>(value: &T) -> String {
        value.to_wire().to_json_string()
    }

    #[test]
    fn test_message_roles_encode_with_discriminator() {
        assert_eq!(
            encode(&Message::system("be terse")),
            r#"{"content":"be terse","role":"system"}"#
        );
        assert_eq!(
            encode(&Message::user("hi").with_name("alice")),
            r#"{"content":"hi","name":"alice","role":"user"}"#
        );
        assert_eq!(
            encode(&Message::tool("call_1", "42")),
            r#"{"content":"42","role":"tool","tool_call_id":"call_1"}"#
        );
    }

    #[test]
    fn test_assistant_tool_calls_omit_absent_content() {
        let message = Message::assistant_tool_calls(vec![ToolCall::function(
            "call_1",
            "get_weather",
            r#"{"city":"Paris"}"#,
        )]);
        let wire = message.to_wire();
        assert!(wire.get("content").is_none());
        let call = &wire.get("tool_calls").unwrap().as_array().unwrap()[0];
        assert_eq!(call.get("type").and_then(WireValue::as_str), Some("function"));
        assert_eq!(
            call.get("function").unwrap().get("arguments").and_then(WireValue::as_str),
            Some(r#"{"city":"Paris"}"#)
        );
    }

    #[test]
    fn test_user_parts_encode_as_array() {
        let message = Message::user_parts(vec![
            ContentPart::text("What is this?"),
            ContentPart::ImageUrl {
                url: "https://example.com/cat.png".to_string(),
                detail: Some(ImageDetail::High),
            },
        ]);
        assert_eq!(
            encode(&message),
            r#"{"content":[{"text":"What is this?","type":"text"},{"image_url":{"detail":"high","url":"https://example.com/cat.png"},"type":"image_url"}],"role":"user"}"#
        );
    }

    #[test]
    fn test_payload_free_tool_choices_are_bare_strings() {
        for (choice, expected) in [
            (ToolChoice::None, "none"),
            (ToolChoice::Auto, "auto"),
            (ToolChoice::Required, "required"),
        ] {
            assert_eq!(choice.to_wire(), WireValue::from(expected));
        }
    }

    #[test]
    fn test_function_tool_choice_is_object() {
        assert_eq!(
            encode(&ToolChoice::function("get_weather")),
            r#"{"function":{"name":"get_weather"},"type":"function"}"#
        );
    }

    #[test]
    fn test_tool_definition_omits_absent_fields() {
        let tool = Tool::function("ping").build();
        assert_eq!(encode(&tool), r#"{"function":{"name":"ping"},"type":"function"}"#);

        let schema = WireValue::parse(r#"{"type":"object","properties":{}}"#).unwrap();
        let tool = Tool::function("ping")
            .description("Ping a host")
            .parameters(schema)
            .strict(true)
            .build();
        assert_eq!(
            encode(&tool),
            r#"{"function":{"description":"Ping a host","name":"ping","parameters":{"properties":{},"type":"object"},"strict":true},"type":"function"}"#
        );
    }

    #[test]
    fn test_response_formats() {
        assert_eq!(encode(&ResponseFormat::Text), r#"{"type":"text"}"#);
        assert_eq!(encode(&ResponseFormat::JsonObject), r#"{"type":"json_object"}"#);
        let schema = WireValue::object().with("type", "object");
        assert_eq!(
            encode(&ResponseFormat::JsonSchema(
                JsonSchemaFormat::new("answer", schema).strict(true)
            )),
            r#"{"json_schema":{"name":"answer","schema":{"type":"object"},"strict":true},"type":"json_schema"}"#
        );
    }

    #[test]
    fn test_request_body_field_order_and_omission() {
        let request = ChatCompletionRequest::new(
            "grok-3-mini",
            vec![Message::system("be terse"), Message::user("hi")],
        )
        .temperature(0.7)
        .reasoning_effort(ReasoningEffort::Low);

        let body = String::from_utf8(encode_body(&request).unwrap()).unwrap();
        assert_eq!(
            body,
            r#"{"model":"grok-3-mini","messages":[{"content":"be terse","role":"system"},{"content":"hi","role":"user"}],"temperature":0.7,"reasoning_effort":"low"}"#
        );
    }

    #[test]
    fn test_request_encoding_is_deterministic() {
        let schema = WireValue::parse(
            r#"{"type":"object","properties":{"b":{"type":"string"},"a":{"type":"number"}}}"#,
        )
        .unwrap();
        let request = ChatCompletionRequest::new("gpt-4o", vec![Message::user("hi")])
            .tool(Tool::function("f").parameters(schema.clone()).build())
            .tool_choice(ToolChoice::Required)
            .response_format(ResponseFormat::JsonSchema(JsonSchemaFormat::new("out", schema)));

        let first = encode_body(&request).unwrap();
        let second = encode_body(&request.clone()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_enable_streaming_respects_existing_stream_options() {
        let mut request = ChatCompletionRequest::new("m", vec![Message::user("hi")]);
        request.enable_streaming(false);
        assert_eq!(request.stream, Some(true));
        assert!(request.stream_options.is_none());

        request.enable_streaming(true);
        assert_eq!(
            request.stream_options,
            Some(StreamOptions { include_usage: true })
        );

        let mut request = ChatCompletionRequest::new("m", vec![])
            .stream_options(StreamOptions { include_usage: false });
        request.enable_streaming(true);
        assert_eq!(
            request.stream_options,
            Some(StreamOptions { include_usage: false })
        );
    }

    #[test]
    fn test_parse_response_with_tool_calls() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1700000000,
            "model": "grok-3-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{"id": "call_1", "type": "function", "function": {"name": "f", "arguments": "{}"}}]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;
        let response: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.content(), None);
        assert_eq!(response.choices[0].message.tool_calls[0].function.name, "f");
        assert_eq!(response.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_null_tool_calls_read_as_empty() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi","tool_calls":null}}]}"#,
        )
        .unwrap();
        assert_eq!(response.content(), Some("Hi"));
        assert!(response.choices[0].message.tool_calls.is_empty());

        let chunk: ChatCompletionChunk = serde_json::from_str(
            r#"{"choices":[{"index":0,"delta":{"content":"Hi","tool_calls":null}}]}"#,
        )
        .unwrap();
        assert_eq!(chunk.content(), Some("Hi"));
        assert!(chunk.choices[0].delta.tool_calls.is_empty());
    }

    #[test]
    fn test_parse_minimal_chunk() {
        let chunk: ChatCompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#).unwrap();
        assert_eq!(chunk.content(), Some("Hi"));
        assert_eq!(chunk.finish_reason(), None);
    }

    #[test]
    fn test_chunk_requires_choices() {
        let result =
            serde_json::from_str::<ChatCompletionChunk>(r#"{"error":{"message":"overloaded"}}"#);
        assert!(result.is_err());
    }
}
