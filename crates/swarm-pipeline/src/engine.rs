//! Pipeline engine: agent stages, project setup, artifact write, build.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swarm_agent::{Agent, AgentConfig, AgentRole};
use swarm_llm::LlmClient;
use swarm_toolchain::{
    AnchorProject, ArtifactWriter, BuildRunner, CommandRunner, LocalCommandRunner,
};
use swarm_types::{PipelineStep, Result, RunStatus, StageName, StageResult, SwarmError};

use crate::events::{EventEmitter, PipelineEvent};
use crate::plan::StagePlan;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Where the generated project lives and what it is called.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub project_dir: PathBuf,
    /// Path of the generated program, relative to `project_dir`.
    pub artifact_path: PathBuf,
    /// Name registered under `[programs.localnet]` in `Anchor.toml`.
    pub contract_name: String,
    /// Run `anchor init` and register the contract before writing.
    pub init_project: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("program"),
            artifact_path: PathBuf::from("programs/program/src/lib.rs"),
            contract_name: "smart_contract".to_string(),
            init_project: true,
        }
    }
}

/// Everything one call to `process` produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineRun {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: StageResult,
    pub status: RunStatus,
    /// `None` when the run stopped before the build.
    pub build_passed: Option<bool>,
}

// ---------------------------------------------------------------------------
// Construction helpers
// ---------------------------------------------------------------------------

/// One agent per built-in role, all sharing `client`.
pub fn standard_agents(client: Arc<LlmClient>, config: &AgentConfig) -> HashMap<AgentRole, Agent> {
    AgentRole::ALL
        .into_iter()
        .map(|role| (role, Agent::for_role(role, client.clone(), config.clone())))
        .collect()
}

// ---------------------------------------------------------------------------
// ContractPipeline
// ---------------------------------------------------------------------------

/// Drives the agents of a plan in order, then writes and builds the program.
///
/// One run at a time: `process` takes `&mut self`.
pub struct ContractPipeline {
    plan: StagePlan,
    agents: HashMap<AgentRole, Agent>,
    config: PipelineConfig,
    writer: ArtifactWriter,
    builder: BuildRunner,
    project: AnchorProject,
    runner: Arc<dyn CommandRunner>,
    events: EventEmitter,
    last_build_passed: Option<bool>,
}

impl ContractPipeline {
    /// Build a pipeline over the standard plan. `runner` backs both the
    /// project setup and the build.
    ///
    /// Fails with `InvalidPlan` if a role used by the plan has no agent.
    pub fn new(
        agents: HashMap<AgentRole, Agent>,
        config: PipelineConfig,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Self> {
        let pipeline = Self {
            plan: StagePlan::standard(),
            agents,
            builder: BuildRunner::new(runner.clone()),
            project: AnchorProject::new(config.project_dir.clone(), runner.clone()),
            config,
            writer: ArtifactWriter::new(),
            runner,
            events: EventEmitter::default(),
            last_build_passed: None,
        };
        pipeline.check_agents()?;
        Ok(pipeline)
    }

    /// A pipeline that runs the toolchain on this machine.
    pub fn local(agents: HashMap<AgentRole, Agent>, config: PipelineConfig) -> Result<Self> {
        Self::new(agents, config, Arc::new(LocalCommandRunner))
    }

    pub fn with_plan(mut self, plan: StagePlan) -> Result<Self> {
        plan.validate()?;
        self.plan = plan;
        self.check_agents()?;
        Ok(self)
    }

    /// Use a toolchain executable other than `anchor`.
    pub fn with_toolchain_program(mut self, program: impl Into<String>) -> Self {
        let program = program.into();
        self.builder = BuildRunner::new(self.runner.clone()).with_program(program.clone());
        self.project =
            AnchorProject::new(self.config.project_dir.clone(), self.runner.clone()).with_program(program);
        self
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.events = events;
        self
    }

    fn check_agents(&self) -> Result<()> {
        match self.plan.roles().find(|role| !self.agents.contains_key(role)) {
            Some(role) => Err(SwarmError::InvalidPlan(format!(
                "no agent registered for role '{}'",
                role
            ))),
            None => Ok(()),
        }
    }

    pub fn plan(&self) -> &StagePlan {
        &self.plan
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn toolchain_program(&self) -> &str {
        self.builder.program()
    }

    /// Outcome of the build in the most recent run, if it got that far.
    pub fn last_build_passed(&self) -> Option<bool> {
        self.last_build_passed
    }

    /// Run every stage on `requirements`, then write and build the program.
    ///
    /// Never returns an error: a failure stops the run and is reported in
    /// `PipelineRun::status`, with the stages completed so far kept.
    pub async fn process(&mut self, requirements: &str) -> PipelineRun {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let clock = Instant::now();
        self.last_build_passed = None;

        tracing::info!(run_id = %run_id, stages = self.plan.len(), "Pipeline run started");
        self.events.emit(PipelineEvent::RunStarted {
            run_id: run_id.clone(),
            stage_count: self.plan.len(),
        });

        let mut stages = StageResult::new(requirements);
        let (status, build_passed) = match self.drive(&mut stages).await {
            Ok(passed) => (RunStatus::Completed, Some(passed)),
            Err((step, reason)) => (RunStatus::Failed { step, reason }, None),
        };
        self.last_build_passed = build_passed;
        self.finish(&run_id, started_at, clock, stages, status, build_passed)
    }

    /// Stages, project setup, artifact, build. Returns whether the build passed.
    async fn drive(
        &self,
        stages: &mut StageResult,
    ) -> std::result::Result<bool, (PipelineStep, String)> {
        // ---- Agent stages ----
        self.run_stages(stages).await?;

        // ---- Project setup ----
        if self.config.init_project {
            self.prepare_project()
                .await
                .map_err(|reason| (PipelineStep::ProjectInit, reason))?;
        }

        // ---- Artifact ----
        self.write_artifact(stages)
            .await
            .map_err(|reason| (PipelineStep::WriteArtifact, reason))?;

        // ---- Build and test ----
        let report = self.builder.report(&self.config.project_dir).await;
        let passed = report.passed();
        if !passed {
            tracing::warn!(?report, "Contract validation failed, review the generated output");
        }
        self.events.emit(PipelineEvent::BuildFinished { passed });
        Ok(passed)
    }

    async fn run_stages(
        &self,
        stages: &mut StageResult,
    ) -> std::result::Result<(), (PipelineStep, String)> {
        for spec in self.plan.stages() {
            let step = PipelineStep::Stage(spec.name);
            let fail = |error: SwarmError| {
                tracing::error!(stage = %spec.name, error = %error, "Stage failed");
                self.events.emit(PipelineEvent::StageFailed {
                    stage: spec.name,
                    error: error.to_string(),
                });
                (step, error.to_string())
            };

            let agent = self.agents.get(&spec.role).ok_or_else(|| {
                fail(SwarmError::InvalidPlan(format!(
                    "no agent registered for role '{}'",
                    spec.role
                )))
            })?;
            let input = stages
                .get(spec.input)
                .ok_or_else(|| {
                    fail(SwarmError::MissingStageInput {
                        stage: spec.name,
                        input: spec.input,
                    })
                })?
                .to_string();

            tracing::info!(stage = %spec.name, agent = %agent.name(), "Stage started");
            self.events.emit(PipelineEvent::StageStarted {
                stage: spec.name,
                agent: agent.name().to_string(),
            });

            let stage_clock = Instant::now();
            let output = agent.execute(&input).await.map_err(&fail)?;
            let output_len = output.len();
            stages.record(spec.name, output).map_err(&fail)?;

            self.events.emit(PipelineEvent::StageCompleted {
                stage: spec.name,
                output_len,
                duration_ms: stage_clock.elapsed().as_millis() as u64,
            });
        }
        Ok(())
    }

    /// Best effort: a missing toolchain or an unpatchable `Anchor.toml` only
    /// warns. A toolchain that runs and fails stops the run.
    async fn prepare_project(&self) -> std::result::Result<(), String> {
        match self.project.ensure_initialized().await {
            Ok(outcome) => {
                tracing::debug!(?outcome, dir = %self.config.project_dir.display(), "Project ready");
            }
            Err(SwarmError::ToolNotFound { program }) => {
                tracing::warn!(
                    program = %program,
                    "Toolchain not found, skipping project init. Install it with '{}'",
                    swarm_toolchain::INSTALL_HINT
                );
            }
            Err(e) => {
                tracing::error!(error = %e, "Project init failed");
                return Err(e.to_string());
            }
        }

        if let Err(e) = self.project.register_contract(&self.config.contract_name).await {
            tracing::warn!(
                contract = %self.config.contract_name,
                error = %e,
                "Could not register contract in Anchor.toml"
            );
        }
        Ok(())
    }

    async fn write_artifact(&self, stages: &StageResult) -> std::result::Result<(), String> {
        let code = stages.contract_code().ok_or_else(|| {
            let reason = format!("'{}' was not produced", StageName::ContractCode);
            tracing::error!(%reason, "Nothing to write");
            reason
        })?;

        match self
            .writer
            .write(&self.config.project_dir, &self.config.artifact_path, code)
            .await
        {
            Ok(path) => {
                self.events.emit(PipelineEvent::ArtifactWritten { path });
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Writing contract code failed");
                Err(e.to_string())
            }
        }
    }

    fn finish(
        &self,
        run_id: &str,
        started_at: DateTime<Utc>,
        clock: Instant,
        stages: StageResult,
        status: RunStatus,
        build_passed: Option<bool>,
    ) -> PipelineRun {
        let duration_ms = clock.elapsed().as_millis() as u64;
        match &status {
            RunStatus::Completed => {
                tracing::info!(run_id, duration_ms, ?build_passed, "Pipeline run completed")
            }
            RunStatus::Failed { step, reason } => {
                tracing::error!(run_id, duration_ms, %step, %reason, "Pipeline run failed")
            }
        }
        self.events.emit(PipelineEvent::RunFinished {
            run_id: run_id.to_string(),
            status: status.clone(),
            duration_ms,
        });
        PipelineRun {
            run_id: run_id.to_string(),
            started_at,
            finished_at: Utc::now(),
            stages,
            status,
            build_passed,
        }
    }
}

impl std::fmt::Debug for ContractPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractPipeline")
            .field("plan", &self.plan)
            .field("config", &self.config)
            .field("program", &self.builder.program())
            .finish_non_exhaustive()
    }
}

impl PipelineRun {
    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
