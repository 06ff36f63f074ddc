use super::{LlmError, LlmProvider, LlmResponse, Message, ToolCall, ToolDefinition};
use serde::{Deserialize, Serialize};

const REQUEST_TIMEOUT_SECS: u64 = 300;

/// Client for any OpenAI-compatible server (`/v1/chat/completions`):
/// llama.cpp, vLLM, LM Studio, or a hosted endpoint with an API key.
pub struct OpenAiCompatClient {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    http: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug)]
struct WireMessage {
    role: String,
    // Null when the assistant turn is a bare tool call.
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Serialize, Deserialize, Debug)]
struct WireToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: WireFunctionCall,
}

#[derive(Serialize, Deserialize, Debug)]
struct WireFunctionCall {
    name: String,
    // The OpenAI wire format carries arguments as a JSON-encoded string.
    arguments: String,
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
struct CompletionReply {
    choices: Vec<ReplyChoice>,
}

#[derive(Deserialize, Debug)]
struct ReplyChoice {
    message: WireMessage,
}

impl OpenAiCompatClient {
    pub fn new(base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
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
                content: if m.content.is_empty() && !m.tool_calls.is_empty() {
                    None
                } else {
                    Some(m.content.clone())
                },
                tool_calls: if m.tool_calls.is_empty() {
                    None
                } else {
                    Some(
                        m.tool_calls
                            .iter()
                            .map(|tc| WireToolCall {
                                id: tc.id.clone(),
                                kind: "function".to_string(),
                                function: WireFunctionCall {
                                    name: tc.name.clone(),
                                    arguments: tc.arguments.to_string(),
                                },
                            })
                            .collect(),
                    )
                },
                tool_call_id: m.tool_call_id.clone(),
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

impl LlmProvider for OpenAiCompatClient {
    fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: Self::to_wire_messages(messages),
            tools: Self::to_wire_tools(tools),
            stream: false,
        };

        let mut builder = self.http.post(&url).json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        let response = builder.send().map_err(|e| {
            if e.is_connect() {
                LlmError::ConnectionError(format!(
                    "Cannot connect to OpenAI-compatible server at {}. Is it running?",
                    self.base_url
                ))
            } else if e.is_timeout() {
                LlmError::RequestError("Request timed out".to_string())
            } else {
                LlmError::RequestError(e.to_string())
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotFound(format!(
                "Model '{}' not found on server at {}",
                self.model, self.base_url
            )));
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(LlmError::RequestError(
                "Authentication failed. Check your api_key in config.".to_string(),
            ));
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(LlmError::RequestError(format!(
                "Server returned status {}: {}",
                status, body
            )));
        }

        let reply: CompletionReply = response
            .json()
            .map_err(|e| LlmError::ParseError(format!("Failed to parse response: {}", e)))?;

        let choice = reply
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::ParseError("No choices in response".to_string()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let arguments: serde_json::Value = serde_json::from_str(&tc.function.arguments)
                    .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
                ToolCall {
                    id: tc.id,
                    name: tc.function.name,
                    arguments,
                }
            })
            .collect::<Vec<_>>();

        let content = choice.message.content.filter(|c| !c.is_empty());

        Ok(LlmResponse {
            content,
            tool_calls,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_stores_config() {
        let client =
            OpenAiCompatClient::new("http://localhost:8080/", "m", Some("sk-test".to_string()));
        assert_eq!(client.base_url, "http://localhost:8080");
        assert_eq!(client.model, "m");
        assert_eq!(client.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_bare_tool_call_turn_has_null_content() {
        let messages = vec![Message::assistant_with_tool_calls(vec![ToolCall {
            id: "call_9".to_string(),
            name: "run_python".to_string(),
            arguments: json!({"code": "print(1+1)"}),
        }])];
        let wire = OpenAiCompatClient::to_wire_messages(&messages);
        assert!(wire[0].content.is_none());
        let calls = wire[0].tool_calls.as_ref().unwrap();
        assert_eq!(calls[0].id, "call_9");
        assert_eq!(calls[0].kind, "function");
        // Arguments are serialized to a JSON string on this wire.
        assert_eq!(calls[0].function.arguments, r#"{"code":"print(1+1)"}"#);
    }

    #[test]
    fn test_tool_result_turn_carries_call_id() {
        let messages = vec![Message::tool_result("call_9", "2")];
        let wire = OpenAiCompatClient::to_wire_messages(&messages);
        assert_eq!(wire[0].role, "tool");
        assert_eq!(wire[0].content.as_deref(), Some("2"));
        assert_eq!(wire[0].tool_call_id.as_deref(), Some("call_9"));
    }

    #[test]
    fn test_reply_parse_arguments_string() {
        let reply: CompletionReply = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_a",
                        "type": "function",
                        "function": {
                            "name": "stage_file",
                            "arguments": "{\"filename\":\"accidents.csv\"}"
                        }
                    }]
                }
            }]
        }))
        .unwrap();
        let calls = reply.choices[0].message.tool_calls.as_ref().unwrap();
        let args: serde_json::Value = serde_json::from_str(&calls[0].function.arguments).unwrap();
        assert_eq!(args["filename"], "accidents.csv");
    }

    #[test]
    fn test_malformed_arguments_fall_back_to_empty_object() {
        let parsed: serde_json::Value = serde_json::from_str("not json {{{")
            .unwrap_or_else(|_| serde_json::Value::Object(serde_json::Map::new()));
        assert!(parsed.as_object().unwrap().is_empty());
    }

    #[test]
    fn test_request_omits_empty_tools() {
        let request = CompletionRequest {
            model: "m".to_string(),
            messages: vec![],
            tools: vec![],
            stream: false,
        };
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_wire_tools_shape() {
        let wire = OpenAiCompatClient::to_wire_tools(&[ToolDefinition {
            name: "run_python".to_string(),
            description: "Run Python in the sandbox".to_string(),
            parameters: json!({"type": "object"}),
        }]);
        assert_eq!(wire[0].kind, "function");
        assert_eq!(wire[0].function.name, "run_python");
    }
}
