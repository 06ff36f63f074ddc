use super::{ExecOutcome, Sandbox, SandboxError};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Sandbox backed by a scratch directory on the host, for machines without
/// Docker. Commands run with the scratch root as working directory and,
/// unless `network` is set, inside an unshared network namespace
/// (`unshare --net`). Weaker isolation than a container; the scratch root
/// doubles as the destination directory in config.
pub struct ProcessSandbox {
    root: PathBuf,
    timeout: Option<Duration>,
    network: bool,
}

impl ProcessSandbox {
    pub fn new(root: &Path, timeout_secs: Option<u64>, network: bool) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            timeout: timeout_secs.map(Duration::from_secs),
            network,
        })
    }
}

impl Sandbox for ProcessSandbox {
    fn copy_in(&self, host_path: &Path, dest_path: &str) -> Result<(), SandboxError> {
        let dest = Path::new(dest_path);
        if !dest.starts_with(&self.root) {
            return Err(SandboxError::CopyFailed(format!(
                "destination '{}' is outside the sandbox root '{}'",
                dest_path,
                self.root.display()
            )));
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SandboxError::CopyFailed(e.to_string()))?;
        }
        std::fs::copy(host_path, dest)
            .map(|_| ())
            .map_err(|e| SandboxError::CopyFailed(e.to_string()))
    }

    fn exec(&self, argv: &[String]) -> Result<ExecOutcome, SandboxError> {
        if argv.is_empty() {
            return Err(SandboxError::ExecutionFailed("empty command".to_string()));
        }

        let mut cmd = if self.network {
            let mut c = Command::new(&argv[0]);
            c.args(&argv[1..]);
            c
        } else {
            let mut c = Command::new("unshare");
            c.arg("--net").arg("--").args(argv);
            c
        };
        cmd.current_dir(&self.root);
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .map_err(|e| SandboxError::ExecutionFailed(format!("failed to spawn: {}", e)))?;

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
