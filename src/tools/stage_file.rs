use super::{Tool, ToolError};
use crate::sandbox::Sandbox;
use crate::security::path::resolve_within;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

/// How many data rows the staging report shows. Enough for the analyst
/// agent to see types and value shapes without pulling the whole file into
/// the conversation.
pub const PREVIEW_ROWS: usize = 15;

/// Copies a file from the allowed host directory into the sandbox and
/// reports its layout. This is the only host-filesystem reach in the
/// system, which is why it lives on an agent that cannot execute code.
pub struct StageFileTool {
    sandbox: Arc<dyn Sandbox>,
    data_dir: PathBuf,
    dest_dir: String,
}

impl StageFileTool {
    pub fn new(sandbox: Arc<dyn Sandbox>, data_dir: PathBuf, dest_dir: &str) -> Self {
        Self {
            sandbox,
            data_dir,
            dest_dir: dest_dir.trim_end_matches('/').to_string(),
        }
    }
}

impl Tool for StageFileTool {
    fn name(&self) -> &str {
        "stage_file"
    }

    fn description(&self) -> &str {
        "Copy a data file from the local data directory into the analysis sandbox \
         and report its column layout and first rows"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Name of the file inside the data directory"
                }
            },
            "required": ["filename"]
        })
    }

    fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let filename = args["filename"].as_str().ok_or_else(|| {
            ToolError::InvalidArguments("missing 'filename' argument".to_string())
        })?;

        // Containment check comes first; a rejected path is never read and
        // never copied.
        let host_path =
            resolve_within(&self.data_dir, filename).map_err(ToolError::AccessDenied)?;

        let contents = std::fs::read_to_string(&host_path).map_err(|e| {
            ToolError::ExecutionFailed(format!("Failed to read '{}': {}", filename, e))
        })?;

        let basename = host_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                ToolError::InvalidArguments(format!("'{}' has no file name", filename))
            })?;
        let dest_path = format!("{}/{}", self.dest_dir, basename);

        self.sandbox
            .copy_in(&host_path, &dest_path)
            .map_err(|e| {
                ToolError::ExecutionFailed(format!(
                    "Failed to copy '{}' into the sandbox: {}",
                    filename, e
                ))
            })?;

        Ok(staging_report(&basename, &dest_path, &contents))
    }
}

/// The text handed back up the agent chain: sandbox path, header, first
/// rows. The next agent writes code against this without raw file access.
fn staging_report(basename: &str, dest_path: &str, contents: &str) -> String {
    let mut lines = contents.lines();
    let header = lines.next().unwrap_or("");
    let rows: Vec<&str> = lines.collect();
    let shown = rows.len().min(PREVIEW_ROWS);

    let mut report = format!("Copied '{}' into the sandbox at {}.\n", basename, dest_path);
    report.push_str(&format!(
        "Columns ({}): {}\n",
        header.split(',').count(),
        header
    ));
    report.push_str(&format!("First {} of {} data rows:\n", shown, rows.len()));
    for row in rows.iter().take(PREVIEW_ROWS) {
        report.push_str(row);
        report.push('\n');
    }
    report
}
