use std::fmt;

use serde::{Deserialize, Serialize};

/// The five built-in agents of the contract pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Analyzer,
    Architect,
    Generator,
    Auditor,
    Tester,
}

impl AgentRole {
    pub const ALL: [AgentRole; 5] = [
        AgentRole::Analyzer,
        AgentRole::Architect,
        AgentRole::Generator,
        AgentRole::Auditor,
        AgentRole::Tester,
    ];

    /// Short key used in plans and logs.
    pub fn key(&self) -> &'static str {
        match self {
            AgentRole::Analyzer => "analyzer",
            AgentRole::Architect => "architect",
            AgentRole::Generator => "generator",
            AgentRole::Auditor => "auditor",
            AgentRole::Tester => "tester",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentRole::Analyzer => "Requirement Analyzer",
            AgentRole::Architect => "Contract Architect",
            AgentRole::Generator => "Code Generator",
            AgentRole::Auditor => "Security Auditor",
            AgentRole::Tester => "Test Generator",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            AgentRole::Analyzer => ANALYZER_PROMPT,
            AgentRole::Architect => ARCHITECT_PROMPT,
            AgentRole::Generator => GENERATOR_PROMPT,
            AgentRole::Auditor => AUDITOR_PROMPT,
            AgentRole::Tester => TESTER_PROMPT,
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---- Prompts ----

const ANALYZER_PROMPT: &str = "You are a Solana smart contract requirements analyzer.
Analyze requirements and create detailed technical specifications for Solana blockchain.
Focus on Anchor framework, Rust programming language, and Solana-specific features.
Always include specific time periods (months, days) in the specifications.";

const ARCHITECT_PROMPT: &str = "You are a Solana smart contract architect.
Design smart contract architecture using Anchor framework and Rust.
Include account structures, instructions, and state management following Solana best practices.
Use PDAs (Program Derived Addresses) where appropriate.";

const GENERATOR_PROMPT: &str = "You are a Solana smart contract code generator.
Generate Rust code using the Anchor framework.
Follow Solana programming model and security best practices.
Include all necessary account validations and error handling.";

const AUDITOR_PROMPT: &str = "You are a Solana smart contract security auditor.
Audit code for vulnerabilities specific to Solana blockchain.
Check for proper account validation, signer verification, and PDA usage.
Verify compliance with Anchor framework best practices.";

const TESTER_PROMPT: &str = "You are a Solana smart contract test generator.
Create comprehensive test cases using Anchor's testing framework.
Include tests for account validation, instruction execution, and error cases.
Test PDA derivation and token operations where applicable.";
