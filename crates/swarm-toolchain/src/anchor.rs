use std::path::{Path, PathBuf};
use std::sync::Arc;

use swarm_types::{Result, SwarmError};
use toml::{Table, Value};

use crate::build::DEFAULT_PROGRAM;
use crate::runner::{CommandRunner, LocalCommandRunner};

/// What `ensure_initialized` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyPresent,
}

/// An Anchor workspace on disk.
pub struct AnchorProject {
    project_dir: PathBuf,
    program: String,
    runner: Arc<dyn CommandRunner>,
}

impl AnchorProject {
    pub fn new(project_dir: impl Into<PathBuf>, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            project_dir: project_dir.into(),
            program: DEFAULT_PROGRAM.to_string(),
            runner,
        }
    }

    pub fn local(project_dir: impl Into<PathBuf>) -> Self {
        Self::new(project_dir, Arc::new(LocalCommandRunner))
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.project_dir.join("Anchor.toml")
    }

    /// Run `anchor init` when the project directory does not exist yet.
    pub async fn ensure_initialized(&self) -> Result<InitOutcome> {
        if tokio::fs::try_exists(&self.project_dir).await? {
            tracing::debug!(dir = %self.project_dir.display(), "Project directory present");
            return Ok(InitOutcome::AlreadyPresent);
        }

        let parent = match self.project_dir.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let name = self
            .project_dir
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                SwarmError::Config(format!(
                    "Project directory {} has no usable name",
                    self.project_dir.display()
                ))
            })?
            .to_string();
        tokio::fs::create_dir_all(&parent).await?;

        self.run_step(&["--version"], &parent).await?;
        tracing::info!(program = %self.program, dir = %self.project_dir.display(), "Initializing project");
        self.run_step(&["init", &name], &parent).await?;
        Ok(InitOutcome::Created)
    }

    async fn run_step(&self, args: &[&str], cwd: &Path) -> Result<()> {
        let result = self.runner.run(&self.program, args, cwd).await?;
        if result.success() {
            return Ok(());
        }
        Err(SwarmError::Toolchain {
            program: self.program.clone(),
            step: args.join(" "),
            exit_code: result.exit_code,
            stderr: result.stderr,
        })
    }

    /// Add `name` under `[programs.localnet]` in `Anchor.toml`.
    ///
    /// The new entry reuses the program id of the `program` entry, or of the
    /// first entry when there is no `program`. Returns `false` without
    /// writing when the manifest is missing, the entry already exists, or
    /// there is no id to reuse.
    pub async fn register_contract(&self, name: &str) -> Result<bool> {
        let path = self.manifest_path();
        if !tokio::fs::try_exists(&path).await? {
            tracing::debug!(path = %path.display(), "No Anchor.toml, skipping registration");
            return Ok(false);
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let mut manifest: Table =
            toml::from_str(&content).map_err(|e| SwarmError::Toml(e.to_string()))?;

        let localnet = table_entry(table_entry(&mut manifest, "programs")?, "localnet")?;
        if localnet.contains_key(name) {
            return Ok(false);
        }

        let program_id = localnet
            .get("program")
            .or_else(|| localnet.values().next())
            .cloned();
        let Some(program_id) = program_id else {
            tracing::warn!(contract = name, "No program id in [programs.localnet] to reuse");
            return Ok(false);
        };
        localnet.insert(name.to_string(), program_id);

        let updated = toml::to_string(&manifest).map_err(|e| SwarmError::Toml(e.to_string()))?;
        tokio::fs::write(&path, updated).await?;
        tracing::info!(contract = name, path = %path.display(), "Registered contract in Anchor.toml");
        Ok(true)
    }
}

/// Get or create the sub-table `key`.
fn table_entry<'a>(table: &'a mut Table, key: &str) -> Result<&'a mut Table> {
    table
        .entry(key.to_string())
        .or_insert_with(|| Value::Table(Table::new()))
        .as_table_mut()
        .ok_or_else(|| SwarmError::Toml(format!("`{key}` in Anchor.toml is not a table")))
}

impl std::fmt::Debug for AnchorProject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnchorProject")
            .field("project_dir", &self.project_dir)
            .field("program", &self.program)
            .finish_non_exhaustive()
    }
}
