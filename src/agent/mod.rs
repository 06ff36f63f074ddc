pub mod history;
pub mod prompt;

use crate::config::Config;
use crate::llm::{LlmError, LlmProvider, Message};
use crate::sandbox::Sandbox;
use crate::tools::run_python::RunPythonTool;
use crate::tools::stage_file::StageFileTool;
use crate::tools::{DispatchError, ToolError, ToolRegistry};
use self::history::ChatHistory;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

const MAX_TOOL_OUTPUT_CHARS: usize = 50_000;

#[derive(Debug)]
pub enum AgentError {
    /// The model backend failed; nothing to feed back to the model.
    Backend(LlmError),
    /// The model asked for a tool this agent does not hold. A
    /// configuration or prompting mistake, so the task aborts.
    UnknownTool(String),
    /// A tool refused a path outside its allowed root. Never retried.
    AccessDenied(String),
    /// The tool loop ran out of turns without a final answer.
    IterationLimit(usize),
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Backend(err) => write!(f, "Model backend error: {}", err),
            AgentError::UnknownTool(name) => write!(f, "Unknown tool requested: {}", name),
            AgentError::AccessDenied(reason) => write!(f, "Access denied: {}", reason),
            AgentError::IterationLimit(n) => {
                write!(f, "No final answer after {} tool iterations", n)
            }
        }
    }
}

impl std::error::Error for AgentError {}

impl From<LlmError> for AgentError {
    fn from(err: LlmError) -> Self {
        AgentError::Backend(err)
    }
}

/// One agent: a developer prompt, a model handle, a fixed tool set, and an
/// append-only conversation. The tool set is decided at construction and
/// never exposed mutably afterwards, so an agent cannot grow capabilities
/// mid-conversation.
pub struct Agent {
    llm: Box<dyn LlmProvider>,
    tools: ToolRegistry,
    history: ChatHistory,
    context: Vec<String>,
    max_iterations: usize,
}

impl Agent {
    pub fn new(
        llm: Box<dyn LlmProvider>,
        tools: ToolRegistry,
        developer_prompt: &str,
        max_iterations: usize,
    ) -> Self {
        let mut history = ChatHistory::new();
        history.push(Message::system(developer_prompt));
        Self {
            llm,
            tools,
            history,
            context: Vec::new(),
            max_iterations,
        }
    }

    /// The staging agent. Holds exactly one tool: stage_file. It can read
    /// the allowed data directory but has no way to execute code.
    pub fn file_access(
        llm: Box<dyn LlmProvider>,
        sandbox: Arc<dyn Sandbox>,
        cfg: &Config,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(StageFileTool::new(
            sandbox,
            PathBuf::from(&cfg.files.data_dir),
            &cfg.sandbox.dest_dir,
        )));
        Self::new(
            llm,
            tools,
            &prompt::file_access_prompt(&cfg.sandbox.dest_dir),
            cfg.agent.max_iterations,
        )
    }

    /// The analyst agent. Holds exactly one tool: run_python. It can
    /// execute code inside the sandbox but has no host filesystem reach.
    pub fn python_exec(
        llm: Box<dyn LlmProvider>,
        sandbox: Arc<dyn Sandbox>,
        cfg: &Config,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(Box::new(RunPythonTool::new(
            sandbox,
            &cfg.sandbox.dest_dir,
            &cfg.sandbox.python,
        )));
        Self::new(
            llm,
            tools,
            &prompt::python_exec_prompt(&cfg.sandbox.dest_dir),
            cfg.agent.max_iterations,
        )
    }

    /// Queue free text to be prepended to the next task's user turn. The
    /// conversation itself is untouched until `task` runs.
    pub fn add_context(&mut self, text: &str) {
        self.context.push(text.to_string());
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn task(&mut self, user_input: &str) -> Result<String, AgentError> {
        self.task_with_approval(user_input, &mut |_, _| true)
    }

    /// Run one task to completion: send the conversation, execute any tool
    /// calls the model requests, and repeat until it answers in text.
    /// `on_approve` is consulted before each tool execution; a denial is
    /// reported to the model as the tool's result.
    pub fn task_with_approval(
        &mut self,
        user_input: &str,
        on_approve: &mut dyn FnMut(&str, &serde_json::Value) -> bool,
    ) -> Result<String, AgentError> {
        let turn = if self.context.is_empty() {
            user_input.to_string()
        } else {
            let mut merged = self.context.join("\n\n");
            merged.push_str("\n\n");
            merged.push_str(user_input);
            self.context.clear();
            merged
        };
        self.history.push(Message::user(&turn));

        let tool_defs = self.tools.definitions();

        for _iteration in 0..self.max_iterations {
            let response = self.llm.chat(self.history.all(), &tool_defs)?;

            if response.tool_calls.is_empty() {
                let content = response.content.unwrap_or_default();
                self.history.push(Message::assistant(&content));
                return Ok(content);
            }

            let tool_calls = response.tool_calls;
            self.history
                .push(Message::assistant_with_tool_calls(tool_calls.clone()));

            for call in &tool_calls {
                let result = if !on_approve(&call.name, &call.arguments) {
                    "Tool execution denied by user.".to_string()
                } else {
                    match self.tools.dispatch(&call.name, call.arguments.clone()) {
                        Ok(output) => output,
                        Err(DispatchError::UnknownTool(name)) => {
                            return Err(AgentError::UnknownTool(name))
                        }
                        Err(DispatchError::Tool(ToolError::AccessDenied(reason))) => {
                            return Err(AgentError::AccessDenied(reason))
                        }
                        // Recoverable failures go back into the
                        // conversation so the model can correct itself.
                        Err(DispatchError::Tool(err)) => format!("Tool error: {}", err),
                    }
                };

                let result = truncate_output(result);
                self.history.push(Message::tool_result(&call.id, &result));
            }
        }

        Err(AgentError::IterationLimit(self.max_iterations))
    }
}

fn truncate_output(result: String) -> String {
    if result.len() <= MAX_TOOL_OUTPUT_CHARS {
        return result;
    }
    let mut end = MAX_TOOL_OUTPUT_CHARS;
    while !result.is_char_boundary(end) {
        end -= 1;
    }
    let mut truncated = String::with_capacity(end + 40);
    truncated.push_str(&result[..end]);
    truncated.push_str("\n...[output truncated to 50KB]");
    truncated
}
