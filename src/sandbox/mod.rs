pub mod docker;
pub mod process;

use std::fmt;
use std::path::Path;

/// Captured output of one command run inside the sandbox.
#[derive(Debug)]
pub struct ExecOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ExecOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug)]
pub enum SandboxError {
    CopyFailed(String),
    ExecutionFailed(String),
    Timeout(u64),
    Unavailable(String),
}

impl fmt::Display for SandboxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SandboxError::CopyFailed(msg) => write!(f, "Copy failed: {}", msg),
            SandboxError::ExecutionFailed(msg) => write!(f, "Execution failed: {}", msg),
            SandboxError::Timeout(secs) => write!(f, "Execution timed out after {} seconds", secs),
            SandboxError::Unavailable(msg) => write!(f, "Sandbox unavailable: {}", msg),
        }
    }
}

impl std::error::Error for SandboxError {}

/// An isolated execution environment. `copy_in` is the only route from the
/// host filesystem into the sandbox; `exec` runs one command inside it and
/// captures the result. Nothing here reaches back out.
pub trait Sandbox: Send + Sync {
    /// Copy a host file to an absolute destination path inside the sandbox.
    fn copy_in(&self, host_path: &Path, dest_path: &str) -> Result<(), SandboxError>;

    /// Run a command inside the sandbox and wait for it to finish.
    fn exec(&self, argv: &[String]) -> Result<ExecOutcome, SandboxError>;
}
