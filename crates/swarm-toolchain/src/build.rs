use std::path::{Path, PathBuf};
use std::sync::Arc;

use swarm_types::SwarmError;

use crate::runner::{CommandRunner, LocalCommandRunner};

pub const DEFAULT_PROGRAM: &str = "anchor";

pub const INSTALL_HINT: &str =
    "cargo install --git https://github.com/project-serum/anchor anchor-cli";

// ---------------------------------------------------------------------------
// BuildReport
// ---------------------------------------------------------------------------

/// Step-level outcome of a build-and-test cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildReport {
    /// The toolchain executable could not be located.
    ToolchainMissing,
    /// A step ran and exited non-zero, or could not be run at all.
    Failed {
        step: String,
        exit_code: i32,
        stderr: String,
    },
    Passed,
}

impl BuildReport {
    pub fn passed(&self) -> bool {
        matches!(self, BuildReport::Passed)
    }
}

// ---------------------------------------------------------------------------
// BuildRunner
// ---------------------------------------------------------------------------

/// Checks the toolchain, then runs `<program> build` and `<program> test`.
pub struct BuildRunner {
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl BuildRunner {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            runner,
        }
    }

    /// A runner that spawns processes on this machine.
    pub fn local() -> Self {
        Self::new(Arc::new(LocalCommandRunner))
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build and test `project_root`. Never fails; any problem yields `false`.
    pub async fn run(&self, project_root: &Path) -> bool {
        self.report(project_root).await.passed()
    }

    /// Like `run`, but keeps the reason for a failure.
    pub async fn report(&self, project_root: &Path) -> BuildReport {
        // The version check must not depend on the project directory existing.
        let version_dir = nearest_existing_dir(project_root).await;
        for step in ["--version", "build", "test"] {
            let cwd = if step == "--version" {
                version_dir.as_path()
            } else {
                project_root
            };
            tracing::info!(program = %self.program, step, cwd = %cwd.display(), "Running toolchain step");
            match self.runner.run(&self.program, &[step], cwd).await {
                Ok(result) if result.success() => {}
                Ok(result) => {
                    tracing::error!(
                        program = %self.program,
                        step,
                        exit_code = result.exit_code,
                        stderr = %result.stderr.trim_end(),
                        "Toolchain step failed"
                    );
                    return BuildReport::Failed {
                        step: step.to_string(),
                        exit_code: result.exit_code,
                        stderr: result.stderr,
                    };
                }
                Err(SwarmError::ToolNotFound { program }) => {
                    tracing::error!(
                        program = %program,
                        "Toolchain not found. Install it with '{}'",
                        INSTALL_HINT
                    );
                    return BuildReport::ToolchainMissing;
                }
                Err(e) => {
                    tracing::error!(program = %self.program, step, error = %e, "Toolchain step could not run");
                    return BuildReport::Failed {
                        step: step.to_string(),
                        exit_code: -1,
                        stderr: e.to_string(),
                    };
                }
            }
        }
        tracing::info!(project = %project_root.display(), "Build and tests passed");
        BuildReport::Passed
    }
}

/// `path` or its closest ancestor that exists, falling back to `.`.
async fn nearest_existing_dir(path: &Path) -> PathBuf {
    for dir in path.ancestors() {
        if dir.as_os_str().is_empty() {
            break;
        }
        if tokio::fs::try_exists(dir).await.unwrap_or(false) {
            return dir.to_path_buf();
        }
    }
    PathBuf::from(".")
}

impl std::fmt::Debug for BuildRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildRunner")
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}
