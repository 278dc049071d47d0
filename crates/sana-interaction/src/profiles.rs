//! Static role profiles for the screening agents.
//!
//! Each profile fixes a persona (title, goal, backstory) and the shared
//! capability set. The set of profiles is closed: one per addressable
//! [`AgentRole`], with `System` reserved for fallback messages.

use sana_core::session::AgentRole;

/// Persona and capability profile of one role agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentProfile {
    pub role: AgentRole,
    /// Human-readable role title used in prompts.
    pub title: &'static str,
    pub goal: &'static str,
    pub backstory: &'static str,
    /// Whether the google_search tool is enabled for this agent.
    pub can_search: bool,
}

impl AgentProfile {
    /// Renders the profile as a system prompt.
    pub fn system_prompt(&self) -> String {
        format!(
            "# Agent Profile\n**Role**: {title}\n**Goal**: {goal}\n\n## Background\n{backstory}",
            title = self.title,
            goal = self.goal,
            backstory = self.backstory,
        )
    }
}

/// Interviewer: conducts the PHQ-9 screening and follow-up questions.
pub static INTERVIEWER_PROFILE: AgentProfile = AgentProfile {
    role: AgentRole::Interviewer,
    title: "Mental Health Interviewer",
    goal: "Conduct thorough and empathetic mental health screenings and interviews",
    backstory: "You are a compassionate interviewer trained in mental health assessments. \
You know how to ask questions sensitively to understand a person's emotional state. \
You guide users through the PHQ-9 depression screening and follow up with relevant \
contextual questions. You adapt to their responses and tailor your questions accordingly. \
You are skilled at making people feel comfortable sharing their feelings.",
    can_search: true,
};

/// Analyzer: evaluates responses and quantifies the PHQ-9 score.
pub static ANALYZER_PROFILE: AgentProfile = AgentProfile {
    role: AgentRole::Analyzer,
    title: "Mental Health Analyzer",
    goal: "Accurately evaluate mental health states based on responses and identify patterns",
    backstory: "You are an expert in psychological analysis with years of experience \
interpreting mental health assessments. You can identify patterns in responses \
and determine potential mental health conditions. You're skilled at quantifying \
PHQ-9 scores and analyzing qualitative responses to form comprehensive evaluations. \
You always consider the full context of a person's situation before drawing conclusions.",
    can_search: true,
};

/// Advisor: produces personalized recommendations and the assessment record.
pub static ADVISOR_PROFILE: AgentProfile = AgentProfile {
    role: AgentRole::Advisor,
    title: "Mental Health Advisor",
    goal: "Provide personalized, evidence-based mental health recommendations",
    backstory: "You are a compassionate mental health advisor with expertise in \
various therapeutic approaches. You create personalized recommendations based on \
a person's specific situation and mental health evaluation. You balance professional \
advice with empathy, ensuring your guidance is both helpful and supportive. \
You always include a mix of immediate coping strategies and longer-term approaches. \
You know when to suggest professional intervention and how to communicate this sensitively.",
    can_search: true,
};

/// All addressable profiles, in stage order.
pub fn default_profiles() -> [&'static AgentProfile; 3] {
    [&INTERVIEWER_PROFILE, &ANALYZER_PROFILE, &ADVISOR_PROFILE]
}

/// The profile for a role, if one is addressable.
pub fn profile_for(role: AgentRole) -> Option<&'static AgentProfile> {
    default_profiles()
        .into_iter()
        .find(|profile| profile.role == role)
}
