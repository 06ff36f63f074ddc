pub mod ollama;
pub mod openai_compat;

use std::fmt;

/// One turn in a conversation. The backend keeps no session state, so the
/// full ordered sequence is sent on every call.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub tool_call_id: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self {
            role: Role::System,
            content: content.to_string(),
            tool_call_id: None,
            tool_calls: vec![],
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: Role::User,
            content: content.to_string(),
            tool_call_id: None,
            tool_calls: vec![],
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: Role::Assistant,
            content: content.to_string(),
            tool_call_id: None,
            tool_calls: vec![],
        }
    }

    pub fn assistant_with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content: String::new(),
            tool_call_id: None,
            tool_calls,
        }
    }

    pub fn tool_result(tool_call_id: &str, content: &str) -> Self {
        Self {
            role: Role::Tool,
            content: content.to_string(),
            tool_call_id: Some(tool_call_id.to_string()),
            tool_calls: vec![],
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Static advertisement of a tool: name, description, JSON schema of its
/// parameters. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// What the model gave back: final text, tool-call requests, or both.
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

#[derive(Debug)]
pub enum LlmError {
    ConnectionError(String),
    RequestError(String),
    ParseError(String),
    ModelNotFound(String),
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::ConnectionError(msg) => write!(f, "Connection error: {}", msg),
            LlmError::RequestError(msg) => write!(f, "Request error: {}", msg),
            LlmError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            LlmError::ModelNotFound(model) => write!(f, "Model not found: {}", model),
        }
    }
}

impl std::error::Error for LlmError {}

/// Blocking model backend. One request, one response; tool definitions are
/// passed along so the model can ask for a tool call instead of answering.
pub trait LlmProvider {
    fn chat(&self, messages: &[Message], tools: &[ToolDefinition]) -> Result<LlmResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_constructors() {
        let sys = Message::system("prompt");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "prompt");
        assert!(sys.tool_call_id.is_none());
        assert!(sys.tool_calls.is_empty());

        let usr = Message::user("question");
        assert_eq!(usr.role, Role::User);

        let asst = Message::assistant("answer");
        assert_eq!(asst.role, Role::Assistant);

        let tool = Message::tool_result("call_3", "output");
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_3"));
        assert_eq!(tool.content, "output");
    }

    #[test]
    fn test_assistant_with_tool_calls_has_empty_content() {
        let msg = Message::assistant_with_tool_calls(vec![ToolCall {
            id: "call_0".to_string(),
            name: "stage_file".to_string(),
            arguments: json!({"filename": "a.csv"}),
        }]);
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.content.is_empty());
        assert_eq!(msg.tool_calls.len(), 1);
        assert_eq!(msg.tool_calls[0].name, "stage_file");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn test_tool_definition_equality() {
        let a = ToolDefinition {
            name: "run_python".to_string(),
            description: "Run code".to_string(),
            parameters: json!({"type": "object"}),
        };
        let b = a.clone();
        assert_eq!(a, b);
    }

    #[test]
    fn test_llm_error_display() {
        let err = LlmError::ConnectionError("refused".to_string());
        assert_eq!(err.to_string(), "Connection error: refused");
        let err = LlmError::ModelNotFound("qwen2.5:7b".to_string());
        assert_eq!(err.to_string(), "Model not found: qwen2.5:7b");
    }
}
