//! The agent-execution boundary.
//!
//! This module defines the single seam through which the orchestration core
//! talks to the externally-delegated LLM framework: a [`TaskSpec`] goes in,
//! an [`AgentReply`] comes out. Everything behind the [`Agent`] trait -
//! prompt assembly, HTTP, tool use - is a black box to the core.

mod error;

pub use error::AgentError;

use crate::session::AgentRole;
use async_trait::async_trait;
use serde_json::Value;

/// Closed set of structured-output contracts a task may demand.
///
/// Matching on this enum is exhaustive by construction, so a new record
/// type cannot be added without every consumer handling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputSchema {
    /// The terminal screening record, see [`crate::assessment::Assessment`].
    Assessment,
}

/// The fully-specified unit of work for one agent on one turn.
///
/// Built fresh per turn by the task factory and never persisted. The
/// description embeds the serialized conversation transcript - the sole
/// memory mechanism across turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSpec {
    /// Task description, including the conversation context.
    pub description: String,
    /// Expected-output contract, in prose.
    pub expected_output: String,
    /// The agent this task is statically addressed to.
    pub target: AgentRole,
    /// Structured record demanded in addition to the free text, if any.
    pub output_schema: Option<OutputSchema>,
}

/// Output of one agent execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentReply {
    /// The agent's free-text response.
    pub raw: String,
    /// Candidate structured record, extracted (but not validated) when the
    /// task demanded an output schema. Validation happens at the
    /// orchestrator boundary.
    pub structured: Option<Value>,
}

impl AgentReply {
    /// A reply carrying free text only.
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            structured: None,
        }
    }
}

/// A role-bound task executor backed by a language-model call.
#[async_trait]
pub trait Agent: Send + Sync {
    /// One-line description of what this agent is good at.
    fn expertise(&self) -> &str;

    /// Executes the task and returns the reply.
    ///
    /// Implementations must not mutate any session state; the orchestrator
    /// owns the conversation.
    async fn execute(&self, task: &TaskSpec) -> Result<AgentReply, AgentError>;
}

/// Dispatch boundary the orchestrator drives.
///
/// Implementations resolve `task.target` to the matching role agent,
/// attach the turn's knowledge context, and execute. The interaction crate
/// provides the production implementation; tests substitute mocks.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    /// Executes the task with the given knowledge context visible.
    async fn run(
        &self,
        task: &TaskSpec,
        knowledge: &crate::knowledge::KnowledgeContext,
    ) -> Result<AgentReply, AgentError>;
}
