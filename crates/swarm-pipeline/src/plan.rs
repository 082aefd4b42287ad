use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use swarm_agent::AgentRole;
use swarm_types::{Result, StageName, SwarmError};

/// One agent stage: `role` reads `input` and produces `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: StageName,
    pub role: AgentRole,
    pub input: StageName,
}

impl StageSpec {
    pub const fn new(name: StageName, role: AgentRole, input: StageName) -> Self {
        Self { name, role, input }
    }
}

/// Ordered, validated list of agent stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagePlan {
    stages: Vec<StageSpec>,
}

impl StagePlan {
    /// analyzer → architect → generator → auditor, with the tester reading
    /// the generated code rather than the audit.
    pub fn standard() -> Self {
        Self {
            stages: vec![
                StageSpec::new(StageName::TechnicalSpecs, AgentRole::Analyzer, StageName::Requirements),
                StageSpec::new(StageName::Architecture, AgentRole::Architect, StageName::TechnicalSpecs),
                StageSpec::new(StageName::ContractCode, AgentRole::Generator, StageName::Architecture),
                StageSpec::new(StageName::SecurityAudit, AgentRole::Auditor, StageName::ContractCode),
                StageSpec::new(StageName::TestCases, AgentRole::Tester, StageName::ContractCode),
            ],
        }
    }

    pub fn new(stages: Vec<StageSpec>) -> Result<Self> {
        let plan = Self { stages };
        plan.validate()?;
        Ok(plan)
    }

    /// Every input must be the requirements or an earlier stage's output,
    /// and each stage name may appear once.
    pub fn validate(&self) -> Result<()> {
        let mut produced: HashSet<StageName> = HashSet::from([StageName::Requirements]);
        for spec in &self.stages {
            if spec.name == StageName::Requirements {
                return Err(SwarmError::InvalidPlan(
                    "'requirements' is supplied by the caller and cannot be produced".into(),
                ));
            }
            if !produced.contains(&spec.input) {
                return Err(SwarmError::InvalidPlan(format!(
                    "stage '{}' reads '{}', which is not produced before it",
                    spec.name, spec.input
                )));
            }
            if !produced.insert(spec.name) {
                return Err(SwarmError::InvalidPlan(format!(
                    "stage '{}' appears more than once",
                    spec.name
                )));
            }
        }
        Ok(())
    }

    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Roles used by the plan, in stage order.
    pub fn roles(&self) -> impl Iterator<Item = AgentRole> + '_ {
        self.stages.iter().map(|s| s.role)
    }
}

impl Default for StagePlan {
    fn default() -> Self {
        Self::standard()
    }
}
