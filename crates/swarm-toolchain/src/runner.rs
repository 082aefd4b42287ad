use std::io;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use swarm_types::{Result, SwarmError};

/// Result of running an external program.
#[derive(Debug, Clone)]
pub struct ExecResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u64,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs an external program to completion.
///
/// A program that cannot be located must surface as `SwarmError::ToolNotFound`
/// so callers can tell "missing" apart from "failed".
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<ExecResult>;
}

/// Spawns programs on the local machine with `tokio::process`. No shell is involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCommandRunner;

#[async_trait]
impl CommandRunner for LocalCommandRunner {
    async fn run(&self, program: &str, args: &[&str], cwd: &Path) -> Result<ExecResult> {
        // Spawning into a missing directory also reports NotFound.
        if !tokio::fs::try_exists(cwd).await? {
            return Err(SwarmError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("working directory {} does not exist", cwd.display()),
            )));
        }

        tracing::debug!(program, ?args, cwd = %cwd.display(), "Spawning command");

        let start = tokio::time::Instant::now();
        let output = tokio::process::Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => SwarmError::ToolNotFound {
                    program: program.to_string(),
                },
                _ => SwarmError::Io(e),
            })?;

        let result = ExecResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        tracing::debug!(
            program,
            exit_code = result.exit_code,
            duration_ms = result.duration_ms,
            "Command finished"
        );
        Ok(result)
    }
}
