//! Agent implementations for SANA.
//!
//! This crate provides everything behind the core's agent-execution
//! boundary: the Gemini REST binding, the static role profiles, the
//! registry that resolves a task's target to a role agent, and the
//! knowledge-context builder that loads reference documents per turn.

pub mod gemini_api_agent;
pub mod knowledge;
pub mod profiles;
pub mod registry;

pub use gemini_api_agent::GeminiApiAgent;
pub use knowledge::{KnowledgeBuild, KnowledgeContextBuilder};
pub use profiles::{
    ADVISOR_PROFILE, ANALYZER_PROFILE, AgentProfile, INTERVIEWER_PROFILE, default_profiles,
    profile_for,
};
pub use registry::{AgentRegistry, RoleAgent};
