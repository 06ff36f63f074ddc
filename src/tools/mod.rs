pub mod run_python;
pub mod stage_file;

use crate::llm::ToolDefinition;
use colored::Colorize;
use std::fmt;

#[derive(Debug)]
pub enum ToolError {
    InvalidArguments(String),
    AccessDenied(String),
    ExecutionFailed(String),
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::InvalidArguments(msg) => write!(f, "Invalid arguments: {}", msg),
            ToolError::AccessDenied(msg) => write!(f, "Access denied: {}", msg),
            ToolError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
        }
    }
}

impl std::error::Error for ToolError {}

#[derive(Debug)]
pub enum DispatchError {
    /// The model asked for a name that is not registered.
    UnknownTool(String),
    /// The tool itself failed; carried through unchanged.
    Tool(ToolError),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::UnknownTool(name) => write!(f, "Unknown tool: {}", name),
            DispatchError::Tool(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for DispatchError {}

impl From<ToolError> for DispatchError {
    fn from(err: ToolError) -> Self {
        DispatchError::Tool(err)
    }
}

/// A named, schema-described capability the model may invoke. `execute`
/// must validate its arguments against the declared schema and fail with
/// `InvalidArguments` before doing anything else.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> serde_json::Value;
    fn execute(&self, args: serde_json::Value) -> Result<String, ToolError>;

    /// The static advertisement sent to the model. Pure; same value every call.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Register a tool. A tool with the same name is replaced, so a name
    /// always resolves to exactly one executable.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        if let Some(slot) = self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            *slot = tool;
        } else {
            self.tools.push(tool);
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn list(&self) -> Vec<&dyn Tool> {
        self.tools.iter().map(|t| t.as_ref()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Look up a tool by name and run it. Every dispatch is logged to
    /// stderr before execution; the arguments came from the model, so the
    /// operator gets an audit line for each call.
    pub fn dispatch(&self, name: &str, args: serde_json::Value) -> Result<String, DispatchError> {
        eprintln!(
            "  {} {}",
            format!("[tool: {}]", name).cyan(),
            args.to_string().dimmed()
        );
        let tool = self
            .get(name)
            .ok_or_else(|| DispatchError::UnknownTool(name.to_string()))?;
        tool.execute(args).map_err(DispatchError::Tool)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct EchoTool {
        label: &'static str,
    }

    impl EchoTool {
        fn new() -> Self {
            Self { label: "echo" }
        }
    }

    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            self.label
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string", "description": "Text to echo back"}
                },
                "required": ["text"]
            })
        }

        fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
            let text = args["text"]
                .as_str()
                .ok_or_else(|| ToolError::InvalidArguments("missing 'text' argument".to_string()))?;
            Ok(text.to_string())
        }
    }

    struct FailingTool;

    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "failing"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {}})
        }

        fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
            Err(ToolError::ExecutionFailed("boom".to_string()))
        }
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new()));
        assert!(registry.get("echo").is_some());
        assert!(registry.get("missing").is_none());
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn test_dispatch_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new()));
        let result = registry.dispatch("echo", json!({"text": "hello"})).unwrap();
        assert_eq!(result, "hello");
    }

    #[test]
    fn test_dispatch_unknown_tool() {
        let registry = ToolRegistry::new();
        let err = registry.dispatch("nope", json!({})).unwrap_err();
        assert!(matches!(err, DispatchError::UnknownTool(name) if name == "nope"));
    }

    #[test]
    fn test_dispatch_propagates_tool_failure_unchanged() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(FailingTool));
        let err = registry.dispatch("failing", json!({})).unwrap_err();
        match err {
            DispatchError::Tool(ToolError::ExecutionFailed(msg)) => assert_eq!(msg, "boom"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_invalid_arguments() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new()));
        let err = registry.dispatch("echo", json!({})).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::Tool(ToolError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_duplicate_registration_replaces() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new()));
        registry.register(Box::new(EchoTool {
            label: "replacement",
        }));
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.get("echo").unwrap().description(), "replacement");
    }

    #[test]
    fn test_definition_is_stable() {
        let tool = EchoTool::new();
        assert_eq!(tool.definition(), tool.definition());
    }

    #[test]
    fn test_definitions_cover_all_tools() {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(EchoTool::new()));
        registry.register(Box::new(FailingTool));
        let defs = registry.definitions();
        assert_eq!(defs.len(), 2);
        for def in &defs {
            assert!(!def.name.is_empty());
            assert!(!def.description.is_empty());
            assert_eq!(def.parameters["type"], "object");
        }
    }

    #[test]
    fn test_tool_error_display() {
        assert_eq!(
            ToolError::InvalidArguments("bad".to_string()).to_string(),
            "Invalid arguments: bad"
        );
        assert_eq!(
            ToolError::AccessDenied("escape".to_string()).to_string(),
            "Access denied: escape"
        );
        assert_eq!(
            ToolError::ExecutionFailed("died".to_string()).to_string(),
            "Execution failed: died"
        );
        assert_eq!(
            DispatchError::UnknownTool("x".to_string()).to_string(),
            "Unknown tool: x"
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = ToolRegistry::default();
        assert!(registry.list().is_empty());
        assert!(registry.definitions().is_empty());
    }
}
