// ABOUTME: Defines the LanguageModel trait that LLM provider adapters implement.
// ABOUTME: Also defines the provider-neutral request/response shapes and ModelError.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How the model may use the declared tools on a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolMode {
    /// No tools are offered.
    Disabled,
    /// The model decides whether to call a tool.
    Auto,
    /// The model must attempt at least one tool call.
    Required,
}

/// A single-turn generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRequest {
    pub prompt: String,
    pub temperature: f64,
    /// Provider-neutral tool declarations (name, description, parameters).
    pub tools: Vec<Value>,
    pub tool_mode: ToolMode,
}

impl ModelRequest {
    /// A plain text request with no tools.
    pub fn text(prompt: impl Into<String>, temperature: f64) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            tools: Vec::new(),
            tool_mode: ToolMode::Disabled,
        }
    }

    /// A request offering `tools` under the given mode.
    pub fn with_tools(
        prompt: impl Into<String>,
        temperature: f64,
        tools: Vec<Value>,
        tool_mode: ToolMode,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            tools,
            tool_mode,
        }
    }
}

/// A tool invocation requested by the model: a tool name plus its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

/// One piece of model output, in the order the model emitted it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponsePart {
    Text(String),
    ToolCall(ToolCallRequest),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub parts: Vec<ResponsePart>,
}

impl ModelResponse {
    pub fn new(parts: Vec<ResponsePart>) -> Self {
        Self { parts }
    }

    /// Text fragments only, in emission order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            ResponsePart::Text(text) => Some(text.as_str()),
            ResponsePart::ToolCall(_) => None,
        })
    }
}

/// Errors that can occur while calling a language model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("{0}")]
    MissingCredential(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,
}

/// Trait that all LLM provider adapters implement. A call is a single
/// request/response exchange; there are no retries at this layer.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Provider name for logging (e.g. "gemini").
    fn provider_name(&self) -> &str;

    /// Model identifier being used (e.g. "gemini-2.5-flash").
    fn model_name(&self) -> &str;
}
