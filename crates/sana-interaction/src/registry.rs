//! Agent registry and role agents.
//!
//! The registry owns the shared Gemini binding and the static profiles.
//! Each turn it materializes the one role agent the task is addressed to,
//! with that turn's knowledge context attached. Dispatch is fully static:
//! the task names its target and the registry resolves it, nothing more.

use crate::gemini_api_agent::GeminiApiAgent;
use crate::profiles::{AgentProfile, profile_for};
use async_trait::async_trait;
use sana_core::agent::{Agent, AgentError, AgentExecutor, AgentReply, TaskSpec};
use sana_core::assessment::extract_json_payload;
use sana_core::knowledge::KnowledgeContext;

/// One role-bound agent for one turn: a profile, the shared binding
/// configured with the profile's system prompt, and the turn's knowledge.
#[derive(Debug)]
pub struct RoleAgent {
    profile: &'static AgentProfile,
    binding: GeminiApiAgent,
    knowledge: KnowledgeContext,
}

impl RoleAgent {
    fn new(
        profile: &'static AgentProfile,
        base: &GeminiApiAgent,
        knowledge: KnowledgeContext,
    ) -> Self {
        let mut binding = base
            .clone()
            .with_system_instruction(profile.system_prompt());
        if profile.can_search {
            binding = binding.with_google_search();
        }
        Self {
            profile,
            binding,
            knowledge,
        }
    }
}

#[async_trait]
impl Agent for RoleAgent {
    fn expertise(&self) -> &str {
        self.profile.goal
    }

    async fn execute(&self, task: &TaskSpec) -> Result<AgentReply, AgentError> {
        let prompt = format!(
            "{description}\n\n# Expected Output\n{expected}",
            description = task.description,
            expected = task.expected_output,
        );

        let raw = self.binding.generate(&prompt, &self.knowledge).await?;

        // When a structured record is demanded, surface the candidate JSON
        // alongside the raw text. Validation is the orchestrator's job.
        let structured = task.output_schema.and_then(|_| {
            extract_json_payload(&raw)
                .and_then(|payload| serde_json::from_str(payload).ok())
        });

        Ok(AgentReply { raw, structured })
    }
}

/// The fixed set of role agents behind one shared LLM binding.
pub struct AgentRegistry {
    binding: GeminiApiAgent,
}

impl AgentRegistry {
    pub fn new(binding: GeminiApiAgent) -> Self {
        Self { binding }
    }

    /// Materializes the role agent a task is addressed to.
    ///
    /// Fails for `System`: fallback messages are authored by the
    /// orchestrator, never executed as tasks.
    pub fn resolve(
        &self,
        task: &TaskSpec,
        knowledge: &KnowledgeContext,
    ) -> Result<RoleAgent, AgentError> {
        let profile = profile_for(task.target).ok_or_else(|| {
            AgentError::ExecutionFailed(format!(
                "no agent profile for target role {}",
                task.target
            ))
        })?;
        Ok(RoleAgent::new(profile, &self.binding, knowledge.clone()))
    }
}

#[async_trait]
impl AgentExecutor for AgentRegistry {
    async fn run(
        &self,
        task: &TaskSpec,
        knowledge: &KnowledgeContext,
    ) -> Result<AgentReply, AgentError> {
        let agent = self.resolve(task, knowledge)?;
        agent.execute(task).await
    }
}
