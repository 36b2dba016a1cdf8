//! OpenAI-compatible chat-completions client (Groq by default)

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatRequest, LlmClient, LlmError};
use crate::config::LlmConfig;
use crate::message::{AssistantResponse, Message, ToolCall};
use crate::tools::ToolSpec;

/// HTTP LLM client using an OpenAI-compatible API
pub struct HttpLlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    /// Build a client; the key is checked per request
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Configured model name
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct WireRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunctionCall {
    name: String,
    /// JSON-encoded argument object
    arguments: String,
}

#[derive(Debug, Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunction,
}

#[derive(Debug, Serialize)]
struct WireFunction {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Debug, Deserialize)]
struct WireChoice {
    message: WireResponseMessage,
}

#[derive(Debug, Deserialize)]
struct WireResponseMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
}

fn function_type() -> String {
    "function".to_string()
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let tool_calls: Vec<WireToolCall> = message
            .tool_calls
            .iter()
            .map(|call| WireToolCall {
                id: call.id.clone(),
                kind: function_type(),
                function: WireFunctionCall {
                    name: call.name.clone(),
                    arguments: call.arguments.to_string(),
                },
            })
            .collect();

        let content = if message.content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(message.content.clone())
        };

        Self {
            role: message.role.as_str(),
            content,
            tool_calls,
            tool_call_id: message.tool_call_id.clone(),
        }
    }
}

impl From<&ToolSpec> for WireTool {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            kind: "function",
            function: WireFunction {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters_schema(),
            },
        }
    }
}

fn parse_response(response: WireResponse) -> Result<AssistantResponse, LlmError> {
    let message = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| LlmError::Response("no choices in response".to_string()))?;

    let calls = message.tool_calls.unwrap_or_default();
    if calls.is_empty() {
        return Ok(AssistantResponse::Text(message.content.unwrap_or_default()));
    }

    let calls = calls
        .into_iter()
        .map(|call| {
            let arguments = if call.function.arguments.trim().is_empty() {
                serde_json::Value::Object(Default::default())
            } else {
                serde_json::from_str(&call.function.arguments).map_err(|e| {
                    LlmError::Response(format!(
                        "invalid arguments for tool {}: {}",
                        call.function.name, e
                    ))
                })?
            };
            Ok(ToolCall {
                id: call.id,
                name: call.function.name,
                arguments,
            })
        })
        .collect::<Result<Vec<_>, LlmError>>()?;

    Ok(AssistantResponse::ToolRequests(calls))
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn chat(&self, request: ChatRequest) -> Result<AssistantResponse, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingCredentials)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| LlmError::Http(e.to_string()))?,
        );

        let body = WireRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            tools: request.tools.iter().map(WireTool::from).collect(),
        };

        debug!(
            model = %self.config.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            temperature = request.temperature,
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.config.endpoint)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: WireResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Response(e.to_string()))?;
        parse_response(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(value: serde_json::Value) -> Result<AssistantResponse, LlmError> {
        parse_response(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_parse_text_response() {
        let out = decode(json!({
            "choices": [{"message": {"role": "assistant", "content": "- Morning: Louvre"}}]
        }))
        .unwrap();
        assert_eq!(out, AssistantResponse::Text("- Morning: Louvre".to_string()));
    }

    #[test]
    fn test_parse_tool_call_response() {
        let out = decode(json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "get_weather", "arguments": "{\"city\":\"Paris\"}"}
                }]
            }}]
        }))
        .unwrap();

        let calls = out.tool_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].id, "call_1");
        assert_eq!(calls[0].name, "get_weather");
        assert_eq!(calls[0].arguments, json!({"city": "Paris"}));
    }

    #[test]
    fn test_parse_rejects_bad_arguments() {
        let err = decode(json!({
            "choices": [{"message": {"tool_calls": [{
                "id": "call_1",
                "function": {"name": "get_weather", "arguments": "{not json"}
            }]}}]
        }))
        .unwrap_err();
        assert!(matches!(err, LlmError::Response(_)));
    }

    #[test]
    fn test_parse_empty_choices() {
        assert!(decode(json!({"choices": []})).is_err());
    }

    #[test]
    fn test_wire_message_for_tool_request() {
        let call = ToolCall::new("get_weather", json!({"city": "Paris"}));
        let wire = WireMessage::from(&Message::assistant_with_tools("", vec![call]));
        let encoded = serde_json::to_value(&wire).unwrap();

        assert_eq!(encoded["role"], "assistant");
        assert!(encoded.get("content").is_none());
        assert_eq!(encoded["tool_calls"][0]["type"], "function");
        assert_eq!(
            encoded["tool_calls"][0]["function"]["arguments"],
            "{\"city\":\"Paris\"}"
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_fast() {
        let client = HttpLlmClient::new(LlmConfig::default()).unwrap();
        let err = client
            .chat(ChatRequest::new(vec![Message::user("hi")], 0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::MissingCredentials));
    }
}
