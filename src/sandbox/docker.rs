use super::{ExecOutcome, Sandbox, SandboxError};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Sandbox backed by a long-running Docker container.
///
/// The container is expected to be started separately with no network and
/// no host mounts, e.g.:
///
/// ```text
/// docker run -d --name tidepool-sandbox --network none python:3.12-slim sleep infinity
/// ```
///
/// Those isolation properties belong to the container's configuration; this
/// type only moves files in and runs commands.
pub struct DockerSandbox {
    container: String,
    timeout: Option<Duration>,
}

impl DockerSandbox {
    pub fn new(container: &str, timeout_secs: Option<u64>) -> Self {
        Self {
            container: container.to_string(),
            timeout: timeout_secs.map(Duration::from_secs),
        }
    }

    /// Whether the configured container exists and is running.
    pub fn container_running(&self) -> bool {
        Command::new("docker")
            .args(["inspect", "-f", "{{.State.Running}}", &self.container])
            .output()
            .map(|o| o.status.success() && String::from_utf8_lossy(&o.stdout).trim() == "true")
            .unwrap_or(false)
    }
}

impl Sandbox for DockerSandbox {
    fn copy_in(&self, host_path: &Path, dest_path: &str) -> Result<(), SandboxError> {
        let output = Command::new("docker")
            .arg("cp")
            .arg(host_path)
            .arg(format!("{}:{}", self.container, dest_path))
            .output()
            .map_err(|e| SandboxError::Unavailable(format!("failed to invoke docker: {}", e)))?;

        if !output.status.success() {
            return Err(SandboxError::CopyFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }
        Ok(())
    }

    fn exec(&self, argv: &[String]) -> Result<ExecOutcome, SandboxError> {
        let mut cmd = Command::new("docker");
        cmd.arg("exec").arg(&self.container).args(argv);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| SandboxError::Unavailable(format!("failed to invoke docker: {}", e)))?;

        let status = match self.timeout {
            Some(limit) => match child.wait_timeout(limit) {
                Ok(Some(status)) => status,
                Ok(None) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SandboxError::Timeout(limit.as_secs()));
                }
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(SandboxError::ExecutionFailed(format!(
                        "failed to wait for command: {}",
                        e
                    )));
                }
            },
            None => child.wait().map_err(|e| {
                SandboxError::ExecutionFailed(format!("failed to wait for command: {}", e))
            })?,
        };

        let mut stdout = Vec::new();
        if let Some(mut pipe) = child.stdout.take() {
            let _ = pipe.read_to_end(&mut stdout);
        }
        let mut stderr = Vec::new();
        if let Some(mut pipe) = child.stderr.take() {
            let _ = pipe.read_to_end(&mut stderr);
        }

        Ok(ExecOutcome {
            stdout: String::from_utf8_lossy(&stdout).to_string(),
            stderr: String::from_utf8_lossy(&stderr).to_string(),
            exit_code: status.code().unwrap_or(-1),
        })
    }
}

/// Whether the docker CLI is present and the daemon answers.
pub fn docker_available() -> bool {
    Command::new("docker")
        .arg("version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}
