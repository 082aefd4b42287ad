//! End-to-end tests for the contract pipeline.
//!
//! The LLM is replaced by a provider that identifies the calling agent from
//! its system prompt; the toolchain is either missing or scripted.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use swarm_agent::{AgentConfig, AgentRole};
use swarm_llm::{FinishReason, LlmClient, ProviderAdapter, Request, Response, Usage};
use swarm_pipeline::{
    standard_agents, ContractPipeline, EventEmitter, PipelineConfig, PipelineEvent, StagePlan,
    StageSpec,
};
use swarm_toolchain::{CommandRunner, ExecResult};
use swarm_types::{PipelineStep, RunStatus, StageName, SwarmError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const VESTING: &str = "vesting contract, 12 month linear vesting, 3 month cliff";
const CONTRACT_CODE: &str = "use anchor_lang::prelude::*;\n\n#[program]\npub mod vesting {}\n";

/// (role, input) of every completion request, in order.
type CallLog = Arc<Mutex<Vec<(AgentRole, String)>>>;

struct ScriptedLlm {
    calls: CallLog,
    fail_role: Option<AgentRole>,
    /// Answers with empty text for this role.
    empty_role: Option<AgentRole>,
}

fn role_of(request: &Request) -> AgentRole {
    let system = &request.messages[0].content;
    AgentRole::ALL
        .into_iter()
        .find(|r| r.system_prompt() == system)
        .expect("request from an unknown agent")
}

#[async_trait]
impl ProviderAdapter for ScriptedLlm {
    async fn complete(&self, request: &Request) -> Result<Response, SwarmError> {
        let role = role_of(request);
        let input = request.messages[1].content.clone();
        self.calls.lock().unwrap().push((role, input));

        if self.fail_role == Some(role) {
            return Err(SwarmError::RateLimited {
                provider: "scripted".into(),
                retry_after_ms: 1000,
            });
        }

        let text = match role {
            _ if self.empty_role == Some(role) => String::new(),
            AgentRole::Analyzer => "Technical specification: 12 months, 3 month cliff".to_string(),
            AgentRole::Architect => "Architecture: VestingSchedule PDA".to_string(),
            AgentRole::Generator => CONTRACT_CODE.to_string(),
            AgentRole::Auditor => "Audit: no issues".to_string(),
            AgentRole::Tester => "Tests: claim before cliff fails".to_string(),
        };
        Ok(Response {
            id: "scripted".into(),
            text,
            usage: Usage::default(),
            model: request.model.clone(),
            finish_reason: FinishReason::EndTurn,
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "gpt-4"
    }
}

/// Toolchain stand-in that records `program args` and exits with `exit_code`
/// for the step named in `fail_on`, 0 otherwise.
struct ScriptedToolchain {
    calls: Mutex<Vec<String>>,
    fail_on: Option<&'static str>,
}

#[async_trait]
impl CommandRunner for ScriptedToolchain {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        _cwd: &Path,
    ) -> swarm_types::Result<ExecResult> {
        let step = args.first().copied().unwrap_or_default();
        self.calls.lock().unwrap().push(format!("{program} {}", args.join(" ")));
        let exit_code = if self.fail_on == Some(step) { 1 } else { 0 };
        Ok(ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            exit_code,
            duration_ms: 0,
        })
    }
}

fn client(fail_role: Option<AgentRole>) -> (Arc<LlmClient>, CallLog) {
    scripted_client(fail_role, None)
}

fn scripted_client(
    fail_role: Option<AgentRole>,
    empty_role: Option<AgentRole>,
) -> (Arc<LlmClient>, CallLog) {
    let calls: CallLog = Arc::new(Mutex::new(Vec::new()));
    let llm = LlmClient::new().with_provider(ScriptedLlm {
        calls: calls.clone(),
        fail_role,
        empty_role,
    });
    (Arc::new(llm), calls)
}

fn config_in(root: &Path) -> PipelineConfig {
    PipelineConfig {
        project_dir: root.join("program"),
        ..PipelineConfig::default()
    }
}

/// A pipeline whose toolchain is missing from PATH.
fn pipeline_without_toolchain(
    root: &Path,
    fail_role: Option<AgentRole>,
) -> (ContractPipeline, CallLog) {
    let (llm, calls) = client(fail_role);
    let pipeline = ContractPipeline::local(
        standard_agents(llm, &AgentConfig::default()),
        config_in(root),
    )
    .unwrap()
    .with_toolchain_program("swarm-no-such-anchor-xyz");
    (pipeline, calls)
}

// ---------------------------------------------------------------------------
// Stage chaining
// ---------------------------------------------------------------------------

#[tokio::test]
async fn requirements_are_kept_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _calls) = pipeline_without_toolchain(dir.path(), None);

    let requirements = "  odd\twhitespace\n and unicode: ✓ \n";
    let run = pipeline.process(requirements).await;
    assert_eq!(run.stages.requirements(), requirements);
}

#[tokio::test]
async fn vesting_scenario_chains_stages() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, calls) = pipeline_without_toolchain(dir.path(), None);

    let run = pipeline.process(VESTING).await;
    assert!(run.is_completed(), "status: {:?}", run.status);
    assert_eq!(run.stages.populated(), StageName::ALL.to_vec());

    let calls = calls.lock().unwrap();
    let roles: Vec<AgentRole> = calls.iter().map(|(r, _)| *r).collect();
    assert_eq!(roles, AgentRole::ALL.to_vec());

    let specs = run.stages.technical_specs().unwrap();
    assert!(!specs.is_empty());
    assert_eq!(calls[0].1, VESTING);
    assert_eq!(calls[1].1, specs);
    assert_eq!(calls[2].1, run.stages.architecture().unwrap());
    assert_eq!(calls[3].1, CONTRACT_CODE);
    // The tester reads the code, not the audit.
    assert_eq!(calls[4].1, CONTRACT_CODE);
    assert_ne!(calls[4].1, run.stages.security_audit().unwrap());
}

#[tokio::test]
async fn analyzer_failure_keeps_only_requirements() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, calls) = pipeline_without_toolchain(dir.path(), Some(AgentRole::Analyzer));

    let run = pipeline.process(VESTING).await;

    assert_eq!(run.stages.populated(), vec![StageName::Requirements]);
    assert_eq!(
        run.status.failed_step(),
        Some(PipelineStep::Stage(StageName::TechnicalSpecs))
    );
    assert_eq!(run.build_passed, None);
    assert_eq!(pipeline.last_build_passed(), None);
    assert_eq!(calls.lock().unwrap().len(), 1);
    assert!(!dir.path().join("program").exists());
}

#[tokio::test]
async fn auditor_failure_keeps_earlier_stages() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _calls) = pipeline_without_toolchain(dir.path(), Some(AgentRole::Auditor));

    let run = pipeline.process(VESTING).await;

    assert_eq!(
        run.stages.populated(),
        vec![
            StageName::Requirements,
            StageName::TechnicalSpecs,
            StageName::Architecture,
            StageName::ContractCode,
        ]
    );
    match &run.status {
        RunStatus::Failed { step, reason } => {
            assert_eq!(*step, PipelineStep::Stage(StageName::SecurityAudit));
            assert!(reason.contains("Rate limited"));
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(run.stages.test_cases().is_none());
}

#[tokio::test]
async fn empty_stage_output_flows_to_next_agent_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let (llm, calls) = scripted_client(None, Some(AgentRole::Analyzer));
    let mut pipeline = ContractPipeline::local(
        standard_agents(llm, &AgentConfig::default()),
        config_in(dir.path()),
    )
    .unwrap()
    .with_toolchain_program("swarm-no-such-anchor-xyz");

    let run = pipeline.process(VESTING).await;

    assert!(run.is_completed(), "status: {:?}", run.status);
    assert_eq!(run.stages.technical_specs(), Some(""));
    let calls = calls.lock().unwrap();
    assert_eq!(calls[1], (AgentRole::Architect, String::new()));
    assert_eq!(calls.len(), AgentRole::ALL.len());
}

#[tokio::test]
async fn architecture_never_without_technical_specs() {
    for fail_role in [None, Some(AgentRole::Analyzer), Some(AgentRole::Architect)] {
        let dir = tempfile::tempdir().unwrap();
        let (mut pipeline, _calls) = pipeline_without_toolchain(dir.path(), fail_role);
        let run = pipeline.process(VESTING).await;
        if run.stages.architecture().is_some() {
            assert!(run.stages.technical_specs().is_some());
        }
    }
}

// ---------------------------------------------------------------------------
// Artifact and build
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_toolchain_still_writes_artifact_and_reports_failed_build() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _calls) = pipeline_without_toolchain(dir.path(), None);

    let run = pipeline.process(VESTING).await;

    assert!(run.is_completed());
    assert_eq!(run.build_passed, Some(false));
    assert_eq!(pipeline.last_build_passed(), Some(false));

    let lib_rs = dir.path().join("program/programs/program/src/lib.rs");
    assert_eq!(std::fs::read_to_string(lib_rs).unwrap(), CONTRACT_CODE);
}

#[tokio::test]
async fn rerun_overwrites_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let lib_rs = dir.path().join("program/programs/program/src/lib.rs");
    std::fs::create_dir_all(lib_rs.parent().unwrap()).unwrap();
    std::fs::write(&lib_rs, "stale contents that are longer than the new program").unwrap();

    let (mut pipeline, _calls) = pipeline_without_toolchain(dir.path(), None);
    pipeline.process(VESTING).await;
    pipeline.process(VESTING).await;

    assert_eq!(std::fs::read_to_string(lib_rs).unwrap(), CONTRACT_CODE);
}

#[tokio::test]
async fn working_toolchain_inits_registers_and_builds() {
    let dir = tempfile::tempdir().unwrap();
    // `anchor init` is scripted, so create what it would have created.
    let project_dir = dir.path().join("program");
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(
        project_dir.join("Anchor.toml"),
        "[programs.localnet]\nprogram = \"Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS\"\n",
    )
    .unwrap();

    let toolchain = Arc::new(ScriptedToolchain {
        calls: Mutex::new(Vec::new()),
        fail_on: None,
    });
    let (llm, _calls) = client(None);
    let mut pipeline = ContractPipeline::new(
        standard_agents(llm, &AgentConfig::default()),
        config_in(dir.path()),
        toolchain.clone(),
    )
    .unwrap();

    let run = pipeline.process(VESTING).await;
    assert!(run.is_completed());
    assert_eq!(run.build_passed, Some(true));
    assert_eq!(
        *toolchain.calls.lock().unwrap(),
        vec!["anchor --version", "anchor build", "anchor test"]
    );

    let manifest = std::fs::read_to_string(project_dir.join("Anchor.toml")).unwrap();
    assert!(manifest.contains("smart_contract"));
}

#[tokio::test]
async fn failing_init_stops_before_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(ScriptedToolchain {
        calls: Mutex::new(Vec::new()),
        fail_on: Some("init"),
    });
    let (llm, _calls) = client(None);
    let mut pipeline = ContractPipeline::new(
        standard_agents(llm, &AgentConfig::default()),
        config_in(dir.path()),
        toolchain,
    )
    .unwrap();

    let run = pipeline.process(VESTING).await;
    assert_eq!(run.status.failed_step(), Some(PipelineStep::ProjectInit));
    assert_eq!(run.stages.populated(), StageName::ALL.to_vec());
    assert!(!dir.path().join("program/programs/program/src/lib.rs").exists());
}

#[tokio::test]
async fn failing_build_is_not_a_failed_run() {
    let dir = tempfile::tempdir().unwrap();
    let toolchain = Arc::new(ScriptedToolchain {
        calls: Mutex::new(Vec::new()),
        fail_on: Some("build"),
    });
    let (llm, _calls) = client(None);
    let config = PipelineConfig {
        init_project: false,
        ..config_in(dir.path())
    };
    let mut pipeline =
        ContractPipeline::new(standard_agents(llm, &AgentConfig::default()), config, toolchain)
            .unwrap();

    let run = pipeline.process(VESTING).await;
    assert!(run.is_completed());
    assert_eq!(run.build_passed, Some(false));
    assert!(run.stages.test_cases().is_some());
}

#[tokio::test]
async fn unwritable_artifact_path_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let project_dir = dir.path().join("program");
    std::fs::create_dir_all(&project_dir).unwrap();
    std::fs::write(project_dir.join("programs"), "not a directory").unwrap();

    let (mut pipeline, _calls) = pipeline_without_toolchain(dir.path(), None);
    let run = pipeline.process(VESTING).await;

    assert_eq!(run.status.failed_step(), Some(PipelineStep::WriteArtifact));
    assert_eq!(run.build_passed, None);
}

// ---------------------------------------------------------------------------
// Plan, events, serialization
// ---------------------------------------------------------------------------

#[tokio::test]
async fn custom_plan_can_gate_tester_on_audit() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, calls) = pipeline_without_toolchain(dir.path(), None);

    let mut stages = StagePlan::standard().stages().to_vec();
    stages[4] = StageSpec::new(StageName::TestCases, AgentRole::Tester, StageName::SecurityAudit);
    pipeline = pipeline.with_plan(StagePlan::new(stages).unwrap()).unwrap();

    let run = pipeline.process(VESTING).await;
    let calls = calls.lock().unwrap();
    assert_eq!(calls[4].1, run.stages.security_audit().unwrap());
}

#[tokio::test]
async fn missing_agent_is_rejected_at_construction() {
    let dir = tempfile::tempdir().unwrap();
    let (llm, _calls) = client(None);
    let mut agents = standard_agents(llm, &AgentConfig::default());
    agents.remove(&AgentRole::Auditor);

    let err = ContractPipeline::local(agents, config_in(dir.path())).unwrap_err();
    assert!(matches!(err, SwarmError::InvalidPlan(_)));
}

#[tokio::test]
async fn events_follow_run_progress() {
    let dir = tempfile::tempdir().unwrap();
    let events = EventEmitter::new(64);
    let mut rx = events.subscribe();
    let (pipeline, _calls) = pipeline_without_toolchain(dir.path(), None);
    let mut pipeline = pipeline.with_events(events);

    let run = pipeline.process(VESTING).await;

    let mut received = Vec::new();
    while let Ok(event) = rx.try_recv() {
        received.push(event);
    }
    assert!(matches!(received.first(), Some(PipelineEvent::RunStarted { stage_count: 5, .. })));
    let completed = received
        .iter()
        .filter(|e| matches!(e, PipelineEvent::StageCompleted { .. }))
        .count();
    assert_eq!(completed, 5);
    assert!(received
        .iter()
        .any(|e| matches!(e, PipelineEvent::ArtifactWritten { .. })));
    assert!(received
        .iter()
        .any(|e| matches!(e, PipelineEvent::BuildFinished { passed: false })));
    match received.last() {
        Some(PipelineEvent::RunFinished { run_id, status, .. }) => {
            assert_eq!(run_id, &run.run_id);
            assert!(status.is_completed());
        }
        other => panic!("expected RunFinished last, got {other:?}"),
    }
}

#[tokio::test]
async fn run_serializes_with_stage_keys_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let (mut pipeline, _calls) = pipeline_without_toolchain(dir.path(), Some(AgentRole::Generator));

    let run = pipeline.process(VESTING).await;
    let json = run.to_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["stages"]["requirements"], VESTING);
    assert!(value["stages"]["contract_code"].is_null());
    assert_eq!(value["status"]["status"], "failed");
    assert!(value["build_passed"].is_null());

    let order: Vec<usize> = StageName::ALL
        .iter()
        .map(|n| json.find(&format!("\"{}\"", n.as_str())).unwrap())
        .collect();
    let mut sorted = order.clone();
    sorted.sort_unstable();
    assert_eq!(order, sorted);
}
