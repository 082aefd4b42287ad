//! Shared types, errors, and stage records for the contract swarm pipeline.
//!
//! This crate provides the foundational types used across all other swarm crates:
//! - `SwarmError`: unified error taxonomy
//! - `StageName`: the fixed set of named pipeline stages
//! - `StageResult`: append-only record of generated text per stage
//! - `RunStatus` / `PipelineStep`: how a pipeline run ended

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unified error type for all swarm subsystems.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    // === LLM Provider Errors ===
    #[error("Provider {provider} returned HTTP {status}: {message}")]
    ProviderError {
        provider: String,
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("Rate limited by {provider}, retry after {retry_after_ms}ms")]
    RateLimited {
        provider: String,
        retry_after_ms: u64,
    },

    #[error("Authentication failed for provider {provider}")]
    AuthError { provider: String },

    #[error("Request to {provider} timed out after {timeout_ms}ms")]
    RequestTimeout {
        provider: String,
        timeout_ms: u64,
    },

    // === Toolchain Errors ===
    #[error("Toolchain program '{program}' not found on PATH")]
    ToolNotFound { program: String },

    #[error("'{program} {step}' exited with code {exit_code}: {stderr}")]
    Toolchain {
        program: String,
        step: String,
        exit_code: i32,
        stderr: String,
    },

    // === Pipeline Errors ===
    #[error("Stage '{0}' was already recorded in this run")]
    StageAlreadyRecorded(StageName),

    #[error("Stage '{stage}' needs '{input}', which has not been produced")]
    MissingStageInput { stage: StageName, input: StageName },

    #[error("Invalid stage plan: {0}")]
    InvalidPlan(String),

    // === Wallet / RPC Errors ===
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    // === Configuration ===
    #[error("Configuration error: {0}")]
    Config(String),

    // === Generic ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(String),

    #[error("{0}")]
    Other(String),
}

impl SwarmError {
    /// Returns `true` if the error is transient and the operation may succeed on retry.
    ///
    /// Nothing in the swarm retries automatically; this is for callers that want to.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SwarmError::RateLimited { .. }
                | SwarmError::RequestTimeout { .. }
                | SwarmError::ProviderError { retryable: true, .. }
        )
    }

    /// Returns `true` if the error is permanent and retrying will not help.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwarmError::AuthError { .. }
                | SwarmError::ToolNotFound { .. }
                | SwarmError::InvalidPlan(_)
                | SwarmError::Config(_)
        )
    }
}

/// A convenience alias for `Result<T, SwarmError>`.
pub type Result<T> = std::result::Result<T, SwarmError>;

// ---------------------------------------------------------------------------
// StageName
// ---------------------------------------------------------------------------

/// Named slots of a pipeline run, in pipeline order.
///
/// `Requirements` is the caller's input; every other name is produced by an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Requirements,
    TechnicalSpecs,
    Architecture,
    ContractCode,
    SecurityAudit,
    TestCases,
}

impl StageName {
    /// All stage names in pipeline order.
    pub const ALL: [StageName; 6] = [
        StageName::Requirements,
        StageName::TechnicalSpecs,
        StageName::Architecture,
        StageName::ContractCode,
        StageName::SecurityAudit,
        StageName::TestCases,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Requirements => "requirements",
            StageName::TechnicalSpecs => "technical_specs",
            StageName::Architecture => "architecture",
            StageName::ContractCode => "contract_code",
            StageName::SecurityAudit => "security_audit",
            StageName::TestCases => "test_cases",
        }
    }

    /// Parse a snake_case stage name.
    pub fn parse(s: &str) -> Option<StageName> {
        StageName::ALL.into_iter().find(|n| n.as_str() == s)
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// StageResult: append-only record of a single run
// ---------------------------------------------------------------------------

/// Generated text per stage for one pipeline run.
///
/// Serializes as an object with every stage key in pipeline order; stages
/// that never ran are `null`. A stage can be recorded once and is never
/// overwritten afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageResult {
    requirements: Option<String>,
    technical_specs: Option<String>,
    architecture: Option<String>,
    contract_code: Option<String>,
    security_audit: Option<String>,
    test_cases: Option<String>,
}

impl StageResult {
    /// Start a record seeded with the caller's requirements.
    pub fn new(requirements: impl Into<String>) -> Self {
        Self {
            requirements: Some(requirements.into()),
            technical_specs: None,
            architecture: None,
            contract_code: None,
            security_audit: None,
            test_cases: None,
        }
    }

    fn slot(&self, name: StageName) -> &Option<String> {
        match name {
            StageName::Requirements => &self.requirements,
            StageName::TechnicalSpecs => &self.technical_specs,
            StageName::Architecture => &self.architecture,
            StageName::ContractCode => &self.contract_code,
            StageName::SecurityAudit => &self.security_audit,
            StageName::TestCases => &self.test_cases,
        }
    }

    fn slot_mut(&mut self, name: StageName) -> &mut Option<String> {
        match name {
            StageName::Requirements => &mut self.requirements,
            StageName::TechnicalSpecs => &mut self.technical_specs,
            StageName::Architecture => &mut self.architecture,
            StageName::ContractCode => &mut self.contract_code,
            StageName::SecurityAudit => &mut self.security_audit,
            StageName::TestCases => &mut self.test_cases,
        }
    }

    /// Text recorded for `name`, if that stage has completed.
    pub fn get(&self, name: StageName) -> Option<&str> {
        self.slot(name).as_deref()
    }

    pub fn is_populated(&self, name: StageName) -> bool {
        self.slot(name).is_some()
    }

    /// Record a stage's output. Fails if the stage already has a value.
    pub fn record(&mut self, name: StageName, text: impl Into<String>) -> Result<()> {
        let slot = self.slot_mut(name);
        if slot.is_some() {
            return Err(SwarmError::StageAlreadyRecorded(name));
        }
        *slot = Some(text.into());
        Ok(())
    }

    /// Every stage in pipeline order with its value (or `None`).
    pub fn iter(&self) -> impl Iterator<Item = (StageName, Option<&str>)> + '_ {
        StageName::ALL.into_iter().map(move |n| (n, self.get(n)))
    }

    /// Names of the stages that hold a value, in pipeline order.
    pub fn populated(&self) -> Vec<StageName> {
        self.iter()
            .filter(|(_, v)| v.is_some())
            .map(|(n, _)| n)
            .collect()
    }

    pub fn requirements(&self) -> &str {
        self.requirements.as_deref().unwrap_or_default()
    }

    pub fn technical_specs(&self) -> Option<&str> {
        self.technical_specs.as_deref()
    }

    pub fn architecture(&self) -> Option<&str> {
        self.architecture.as_deref()
    }

    pub fn contract_code(&self) -> Option<&str> {
        self.contract_code.as_deref()
    }

    pub fn security_audit(&self) -> Option<&str> {
        self.security_audit.as_deref()
    }

    pub fn test_cases(&self) -> Option<&str> {
        self.test_cases.as_deref()
    }
}

// ---------------------------------------------------------------------------
// PipelineStep / RunStatus: how a run ended
// ---------------------------------------------------------------------------

/// A step of the pipeline that can stop a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "stage", rename_all = "snake_case")]
pub enum PipelineStep {
    /// An agent stage producing the named output.
    Stage(StageName),
    ProjectInit,
    WriteArtifact,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStep::Stage(name) => write!(f, "stage '{}'", name),
            PipelineStep::ProjectInit => f.write_str("project init"),
            PipelineStep::WriteArtifact => f.write_str("artifact write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Failed { step: PipelineStep, reason: String },
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }

    /// The step that stopped the run, if it failed.
    pub fn failed_step(&self) -> Option<PipelineStep> {
        match self {
            RunStatus::Completed => None,
            RunStatus::Failed { step, .. } => Some(*step),
        }
    }
}
