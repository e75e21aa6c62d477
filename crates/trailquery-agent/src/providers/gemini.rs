// ABOUTME: Google Gemini API adapter implementing the LanguageModel trait.
// ABOUTME: Translates ModelRequest into generateContent calls with function declarations and parses parts back.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::runtime::{
    LanguageModel, ModelError, ModelRequest, ModelResponse, ResponsePart, ToolCallRequest, ToolMode,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Google Gemini runtime adapter. Calls the generateContent API with function
/// declarations and maps text and functionCall parts to ResponseParts.
pub struct GeminiModel {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiModel {
    /// Create a new GeminiModel with explicit configuration.
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model,
        }
    }

    /// Build the JSON request body for the Gemini generateContent API.
    pub fn build_request_body(request: &ModelRequest) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": request.prompt}]
            }],
            "generation_config": {
                "temperature": request.temperature
            }
        });

        if request.tool_mode != ToolMode::Disabled && !request.tools.is_empty() {
            let mode = match request.tool_mode {
                ToolMode::Required => "ANY",
                _ => "AUTO",
            };
            body["tools"] = json!([{ "function_declarations": build_gemini_tools(&request.tools) }]);
            body["tool_config"] = json!({
                "function_calling_config": { "mode": mode }
            });
        }

        body
    }

    /// Parse a Gemini generateContent response into ordered ResponseParts,
    /// walking every candidate.
    pub fn parse_response(response_body: &Value) -> Result<ModelResponse, ModelError> {
        let candidates = response_body
            .get("candidates")
            .and_then(|c| c.as_array())
            .ok_or_else(|| {
                ModelError::InvalidResponse("missing candidates array in response".to_string())
            })?;

        let mut parts = Vec::new();

        for candidate in candidates {
            let Some(candidate_parts) = candidate
                .get("content")
                .and_then(|c| c.get("parts"))
                .and_then(|p| p.as_array())
            else {
                // Blocked or empty candidates carry no content.
                continue;
            };

            for part in candidate_parts {
                if let Some(function_call) = part.get("functionCall") {
                    parts.push(ResponsePart::ToolCall(parse_gemini_function_call(
                        function_call,
                    )?));
                    continue;
                }

                if part.get("thought").and_then(|t| t.as_bool()) == Some(true) {
                    continue;
                }

                if let Some(text) = part.get("text").and_then(|t| t.as_str()) {
                    let text = text.trim();
                    if !text.is_empty() {
                        parts.push(ResponsePart::Text(text.to_string()));
                    }
                }
            }
        }

        Ok(ModelResponse::new(parts))
    }
}

/// Convert tool definitions to Gemini's function declaration format.
fn build_gemini_tools(tools: &[Value]) -> Vec<Value> {
    tools
        .iter()
        .map(|tool| {
            json!({
                "name": tool.get("name").cloned().unwrap_or(Value::Null),
                "description": tool.get("description").cloned().unwrap_or(Value::Null),
                "parameters": tool.get("parameters").cloned().unwrap_or(json!({"type": "object"}))
            })
        })
        .collect()
}

/// Parse a Gemini functionCall object into a ToolCallRequest.
fn parse_gemini_function_call(function_call: &Value) -> Result<ToolCallRequest, ModelError> {
    let name = function_call
        .get("name")
        .and_then(|n| n.as_str())
        .ok_or_else(|| ModelError::InvalidResponse("functionCall missing name".to_string()))?;

    let args = function_call.get("args").cloned().unwrap_or(json!({}));

    Ok(ToolCallRequest {
        name: name.to_string(),
        args,
    })
}

#[async_trait]
impl LanguageModel for GeminiModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let body = Self::build_request_body(request);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        );

        tracing::debug!(model = %self.model, tools = request.tools.len(), "calling gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::ProviderError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ModelError::ProviderError(
                "Unauthorized: check GEMINI_API_KEY / GOOGLE_API_KEY".to_string(),
            ));
        }

        if status.is_server_error() {
            return Err(ModelError::ProviderError(format!("Server error: {}", status)));
        }

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(ModelError::ProviderError(format!(
                "API error {}: {}",
                status, error_body
            )));
        }

        let response_body: Value = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(format!("failed to parse JSON: {}", e)))?;

        Self::parse_response(&response_body)
    }

    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
