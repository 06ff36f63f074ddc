use super::{Tool, ToolError};
use crate::sandbox::{ExecOutcome, Sandbox, SandboxError};
use serde_json::json;
use std::sync::Arc;

/// Runs model-generated Python inside the sandbox. The source never
/// executes on the host: it is written to a uniquely named temp file,
/// copied through the sandbox boundary, and run there.
///
/// A nonzero exit or a timeout comes back as the tool's text result, not
/// as an error, so the model sees the traceback and can retry with
/// corrected code.
pub struct RunPythonTool {
    sandbox: Arc<dyn Sandbox>,
    dest_dir: String,
    python: String,
}

impl RunPythonTool {
    pub fn new(sandbox: Arc<dyn Sandbox>, dest_dir: &str, python: &str) -> Self {
        Self {
            sandbox,
            dest_dir: dest_dir.trim_end_matches('/').to_string(),
            python: python.to_string(),
        }
    }
}

impl Tool for RunPythonTool {
    fn name(&self) -> &str {
        "run_python"
    }

    fn description(&self) -> &str {
        "Execute Python code inside the isolated analysis sandbox and return its \
         printed output. Staged data files are available at the paths reported \
         when they were staged."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The Python source to execute"
                }
            },
            "required": ["code"]
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let code = args["code"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("missing 'code' argument".to_string()))?;

        let script_name = format!("job-{}.py", uuid::Uuid::new_v4());
        let host_script = std::env::temp_dir().join(&script_name);
        std::fs::write(&host_script, code).map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to write script: {}", e))
        })?;

        let dest_path = format!("{}/{}", self.dest_dir, script_name);
        let copied = self.sandbox.copy_in(&host_script, &dest_path);
        let _ = std::fs::remove_file(&host_script);
        copied.map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to copy script into the sandbox: {}", e))
        })?;

        match self.sandbox.exec(&[self.python.clone(), dest_path]) {
            Ok(outcome) => Ok(render_outcome(&outcome)),
            // Surfaced as result text; the model decides what to do next.
            Err(SandboxError::Timeout(secs)) => {
                Ok(format!("Execution timed out after {} seconds", secs))
            }
            Err(e) => Err(ToolError::ExecutionFailed(e.to_string())),
        }
    }
}

fn render_outcome(outcome: &ExecOutcome) -> String {
    let mut result = String::new();
    if !outcome.stdout.is_empty() {
        result.push_str(&outcome.stdout);
    }
    if !outcome.stderr.is_empty() {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str("[stderr] ");
        result.push_str(&outcome.stderr);
    }
    if outcome.exit_code != 0 {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&format!("[exit code: {}]", outcome.exit_code));
    }
    result
}
