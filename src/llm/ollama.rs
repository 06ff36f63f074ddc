use super::{LlmError, LlmProvider, LlmResponse, Message, ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};

const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Client for a local Ollama server (`/api/chat`).
pub struct OllamaClient {
    pub base_url: String,
    pub model: String,
    http: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ChatPayload {
    model: String,
    messages: Vec<WireMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
}

#[derive(Serialize, Deserialize, Debug)]
struct WireMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Serialize, Deserialize, Debug)]
struct WireToolCall {
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize, Debug)]
struct WireFunctionCall {
    name: String,
    arguments: serde_json::Value,
}

#[derive(Serialize)]
struct WireTool {
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionDef,
}

#[derive(Serialize)]
struct WireFunctionDef {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Deserialize, Debug)]
struct ChatReply {
    message: WireMessage,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            http: reqwest::blocking::Client::builder()
                .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    fn to_wire_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| WireMessage {
                role: m.role.to_string(),
                content: m.content.clone(),
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| WireToolCall {
                                function: WireFunctionCall {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.clone(),
                                },
                            })
                            .collect(),
                    )
                },
            })
            .collect()
    }

    fn to_wire_tools(tools: &[ToolDefinition]) -> Vec<WireTool> {
        tools
            .iter()
            .map(|t| WireTool {
                kind: "function".to_string(),
                function: WireFunctionDef {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect()
    }
}

impl LlmProvider for OllamaClient {
    fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let payload = ChatPayload {
            model: self.model.clone(),
            messages: Self::to_wire_messages(messages),
            stream: false,
            tools: Self::to_wire_tools(tools),
        };

        let response = self.http.post(&url).json(&payload).send().map_err(|e| {
            if e.is_connect() {
                LlmError::ConnectionError(
                    "Cannot connect to Ollama. Is it running? Start with: ollama serve".to_string(),
                )
            } else if e.is_timeout() {
                LlmError::RequestError("Request timed out".to_string())
            } else {
                LlmError::RequestError(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotFound(format!(
                "Model '{}' not found. Pull it with: ollama pull {}",
                self.model, self.model
            )));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::RequestError(format!(
                "Ollama returned status {}: {}",
                status, body
            )));
        }

        let reply: ChatReply = response
            .json()
            .map_err(|e| LlmError::ParseError(format!("Failed to parse Ollama response: {}", e)))?;

        let tool_calls = reply
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .enumerate()
            .map(|(i, tc)| ToolCall {
                id: format!("call_{}", i),
                name: tc.function.name,
                arguments: tc.function.arguments,
            })
            .collect::<Vec<_>>();

        let content = if reply.message.content.is_empty() {
            None
        } else {
            Some(reply.message.content)
        };

        Ok(LlmResponse {
            content,
            tool_calls,
        })
    }
}
