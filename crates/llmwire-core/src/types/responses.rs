//! Responses API types (response generation)
//!
//! Unlike chat completions, the Responses API flattens function tools, tool
//! choices and JSON-schema formats into a single object next to their `type`
//! discriminator, and streams typed events instead of choice deltas.

use super::chat::{JsonSchemaFormat, ReasoningEffort};
use super::{ApiRequest, StreamingRequest};
use crate::encode::WireEncode;
use crate::value::WireValue;
use serde::{Deserialize, Serialize};

/// Response generation request
#[derive(Debug, Clone, Serialize)]
pub struct ResponseRequest {
    pub model: String,

    /// Prompt text or a list of input items
    pub input: ResponseInput,

    /// System-level instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ResponseTool>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ResponseToolChoice>,

    /// Output text format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<TextConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningConfig>,

    /// Continue from a stored response
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_response_id: Option<String>,

    /// Whether the provider keeps the response for later retrieval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ResponseRequest {
    pub fn new(model: impl Into<String>, input: impl Into<ResponseInput>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            instructions: None,
            temperature: None,
            top_p: None,
            max_output_tokens: None,
            tools: None,
            tool_choice: None,
            text: None,
            reasoning: None,
            previous_response_id: None,
            store: None,
            stream: None,
            user: None,
        }
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_output_tokens(mut self, max_tokens: u32) -> Self {
        self.max_output_tokens = Some(max_tokens);
        self
    }

    pub fn tool(mut self, tool: ResponseTool) -> Self {
        self.tools.get_or_insert_with(Vec::new).push(tool);
        self
    }

    pub fn tool_choice(mut self, choice: ResponseToolChoice) -> Self {
        self.tool_choice = Some(choice);
        self
    }

    pub fn text_format(mut self, format: TextFormat) -> Self {
        self.text = Some(TextConfig { format });
        self
    }

    pub fn reasoning_effort(mut self, effort: ReasoningEffort) -> Self {
        self.reasoning = Some(ReasoningConfig {
            effort: Some(effort),
        });
        self
    }

    pub fn previous_response_id(mut self, id: impl Into<String>) -> Self {
        self.previous_response_id = Some(id.into());
        self
    }

    pub fn store(mut self, store: bool) -> Self {
        self.store = Some(store);
        self
    }
}

impl ApiRequest for ResponseRequest {
    type Response = ResponseObject;
    const PATH: &'static str = "/responses";

    fn model(&self) -> &str {
        &self.model
    }

    fn wants_stream(&self) -> bool {
        self.stream == Some(true)
    }

    fn disable_streaming(&mut self) {
        self.stream = None;
    }
}

impl StreamingRequest for ResponseRequest {
    type Chunk = ResponseStreamEvent;

    fn enable_streaming(&mut self, _include_usage: bool) {
        // Usage always arrives on response.completed here
        self.stream = Some(true);
    }
}

/// Request input: a bare prompt string or a list of items
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseInput {
    Text(String),
    Items(Vec<InputItem>),
}

impl From<&str> for ResponseInput {
    fn from(text: &str) -> Self {
        ResponseInput::Text(text.to_string())
    }
}

impl From<String> for ResponseInput {
    fn from(text: String) -> Self {
        ResponseInput::Text(text)
    }
}

impl From<Vec<InputItem>> for ResponseInput {
    fn from(items: Vec<InputItem>) -> Self {
        ResponseInput::Items(items)
    }
}

impl WireEncode for ResponseInput {
    fn to_wire(&self) -> WireValue {
        match self {
            ResponseInput::Text(text) => WireValue::from(text),
            ResponseInput::Items(items) => items.to_wire(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRole {
    System,
    Developer,
    User,
    Assistant,
}

impl InputRole {
    pub fn as_str(self) -> &'static str {
        match self {
            InputRole::System => "system",
            InputRole::Developer => "developer",
            InputRole::User => "user",
            InputRole::Assistant => "assistant",
        }
    }
}

/// One input item
#[derive(Debug, Clone, PartialEq)]
pub enum InputItem {
    Message { role: InputRole, content: String },
    /// A function call the model made earlier, replayed as context
    FunctionCall {
        call_id: String,
        name: String,
        arguments: String,
    },
    /// Output of a function call, answered back to the model
    FunctionCallOutput { call_id: String, output: String },
}

impl InputItem {
    pub fn message(role: InputRole, content: impl Into<String>) -> Self {
        InputItem::Message {
            role,
            content: content.into(),
        }
    }

    pub fn function_call_output(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        InputItem::FunctionCallOutput {
            call_id: call_id.into(),
            output: output.into(),
        }
    }
}

impl WireEncode for InputItem {
    fn to_wire(&self) -> WireValue {
        match self {
            InputItem::Message { role, content } => WireValue::object()
                .with("type", "message")
                .with("role", role.as_str())
                .with("content", content),
            InputItem::FunctionCall {
                call_id,
                name,
                arguments,
            } => WireValue::object()
                .with("type", "function_call")
                .with("call_id", call_id)
                .with("name", name)
                .with("arguments", arguments),
            InputItem::FunctionCallOutput { call_id, output } => WireValue::object()
                .with("type", "function_call_output")
                .with("call_id", call_id)
                .with("output", output),
        }
    }
}

/// A tool available to the model
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseTool {
    Function {
        name: String,
        description: Option<String>,
        parameters: Option<WireValue>,
        strict: Option<bool>,
    },
    /// Provider-hosted web search
    WebSearch,
}

impl ResponseTool {
    pub fn function(name: impl Into<String>, parameters: WireValue) -> Self {
        ResponseTool::Function {
            name: name.into(),
            description: None,
            parameters: Some(parameters),
            strict: None,
        }
    }
}

impl WireEncode for ResponseTool {
    fn to_wire(&self) -> WireValue {
        match self {
            ResponseTool::Function {
                name,
                description,
                parameters,
                strict,
            } => WireValue::object()
                .with("type", "function")
                .with("name", name)
                .with_opt("description", description.as_ref())
                .with_opt("parameters", parameters.clone())
                .with_opt("strict", *strict),
            ResponseTool::WebSearch => WireValue::object().with("type", "web_search"),
        }
    }
}

/// Tool selection policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseToolChoice {
    None,
    Auto,
    Required,
    Function { name: String },
}

impl WireEncode for ResponseToolChoice {
    fn to_wire(&self) -> WireValue {
        match self {
            ResponseToolChoice::None => WireValue::from("none"),
            ResponseToolChoice::Auto => WireValue::from("auto"),
            ResponseToolChoice::Required => WireValue::from("required"),
            ResponseToolChoice::Function { name } => {
                WireValue::object().with("type", "function").with("name", name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextConfig {
    pub format: TextFormat,
}

/// Output text format
#[derive(Debug, Clone, PartialEq)]
pub enum TextFormat {
    Text,
    JsonObject,
    JsonSchema(JsonSchemaFormat),
}

impl WireEncode for TextFormat {
    fn to_wire(&self) -> WireValue {
        match self {
            TextFormat::Text => WireValue::object().with("type", "text"),
            TextFormat::JsonObject => WireValue::object().with("type", "json_object"),
            TextFormat::JsonSchema(format) => {
                let mut wire = format.to_wire_fields();
                wire.insert("type", "json_schema");
                wire
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReasoningConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effort: Option<ReasoningEffort>,
}

crate::serialize_via_wire!(ResponseInput, InputItem, ResponseTool, ResponseToolChoice, TextFormat);

/// A generated (or in-progress) response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseObject {
    pub id: String,
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub model: String,
    /// "in_progress", "completed", "failed", "incomplete", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub output: Vec<OutputItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<ResponseUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseErrorInfo>,
}

impl ResponseObject {
    /// All output text of message items, concatenated in order
    pub fn output_text(&self) -> String {
        self.output
            .iter()
            .filter_map(|item| match item {
                OutputItem::Message { content, .. } => Some(content),
                _ => None,
            })
            .flatten()
            .filter_map(|part| match part {
                OutputContent::OutputText { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Function calls the model requested
    pub fn function_calls(&self) -> impl Iterator<Item = &OutputItem> {
        self.output
            .iter()
            .filter(|item| matches!(item, OutputItem::FunctionCall { .. }))
    }
}

/// One output item, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputItem {
    Message {
        #[serde(default)]
        id: String,
        #[serde(default)]
        role: String,
        #[serde(default)]
        content: Vec<OutputContent>,
    },
    FunctionCall {
        #[serde(default)]
        id: String,
        call_id: String,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    /// Reasoning summaries, search calls and other item kinds
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    OutputText { text: String },
    Refusal { refusal: String },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseUsage {
    #[serde(default)]
    pub input_tokens: u32,
    #[serde(default)]
    pub output_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseErrorInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

/// One event of a streamed response, tagged by `type`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ResponseStreamEvent {
    #[serde(rename = "response.created")]
    Created { response: ResponseObject },

    #[serde(rename = "response.in_progress")]
    InProgress { response: ResponseObject },

    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta {
        #[serde(default)]
        item_id: String,
        #[serde(default)]
        output_index: u32,
        #[serde(default)]
        content_index: u32,
        delta: String,
    },

    #[serde(rename = "response.output_text.done")]
    OutputTextDone {
        #[serde(default)]
        item_id: String,
        #[serde(default)]
        output_index: u32,
        #[serde(default)]
        content_index: u32,
        text: String,
    },

    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta {
        #[serde(default)]
        item_id: String,
        #[serde(default)]
        output_index: u32,
        delta: String,
    },

    #[serde(rename = "response.completed")]
    Completed { response: ResponseObject },

    #[serde(rename = "response.failed")]
    Failed { response: ResponseObject },

    /// Error reported by the provider in the middle of the stream
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        code: Option<String>,
        message: String,
    },

    #[serde(other)]
    Unknown,
}

impl ResponseStreamEvent {
    /// Text delta carried by this event, if any
    pub fn text_delta(&self) -> Option<&str> {
        match self {
            ResponseStreamEvent::OutputTextDelta { delta, .. } => Some(delta),
            _ => None,
        }
    }

    /// Whether this event is the last one of a well-formed stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ResponseStreamEvent::Completed { .. }
                | ResponseStreamEvent::Failed { .. }
                | ResponseStreamEvent::Error { .. }
        )
    }
}
