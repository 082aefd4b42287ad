//! Role-bound LLM agents.
//!
//! An `Agent` pairs a fixed system prompt with a shared `LlmClient`. Each call
//! to `execute` is independent: no conversation history is kept between calls.

pub mod roles;
pub use roles::AgentRole;

use std::sync::Arc;

use swarm_llm::{LlmClient, Message, Request};
use swarm_types::Result;

// ---------------------------------------------------------------------------
// AgentConfig
// ---------------------------------------------------------------------------

/// Model settings applied to every request an agent makes.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

pub struct Agent {
    name: String,
    system_prompt: String,
    client: Arc<LlmClient>,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        client: Arc<LlmClient>,
        config: AgentConfig,
    ) -> Self {
        Self {
            name: name.into(),
            system_prompt: system_prompt.into(),
            client,
            config,
        }
    }

    /// Build one of the built-in pipeline agents.
    pub fn for_role(role: AgentRole, client: Arc<LlmClient>, config: AgentConfig) -> Self {
        Self::new(role.display_name(), role.system_prompt(), client, config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    fn build_request(&self, input: &str) -> Request {
        let mut request = Request::new(
            self.config.model.clone(),
            vec![
                Message::system(self.system_prompt.clone()),
                Message::user(input),
            ],
        );
        request.temperature = Some(self.config.temperature);
        request.max_tokens = self.config.max_tokens;
        request
    }

    /// Send the system prompt and `input` to the model and return its text.
    ///
    /// Provider errors are returned as-is. The output is not inspected.
    pub async fn execute(&self, input: &str) -> Result<String> {
        let request = self.build_request(input);
        tracing::debug!(agent = %self.name, input_len = input.len(), "Agent executing");

        let response = self.client.complete(&request).await?;

        tracing::info!(
            agent = %self.name,
            output_len = response.text.len(),
            "Agent finished"
        );
        Ok(response.text)
    }
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
