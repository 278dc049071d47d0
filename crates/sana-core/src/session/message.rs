//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles, agent attribution, and message content.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from an AI agent.
    Assistant,
}

/// The role-specialized agent a message is attributed to.
///
/// Every assistant message names its author. `System` is reserved for
/// fallback messages emitted when a turn fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum AgentRole {
    /// Conducts the PHQ-9 screening and follow-up questions.
    Interviewer,
    /// Evaluates the responses and explains the score.
    Analyzer,
    /// Produces the final recommendations and assessment record.
    Advisor,
    /// Author of fallback messages when a turn could not be processed.
    System,
}

/// A single message in a conversation history.
///
/// Each message has a role, the agent it is attributed to (assistant
/// messages only), content, and a timestamp indicating when it was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The agent that authored the message. `Some` iff `role` is `Assistant`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentRole>,
    /// The content of the message.
    pub content: String,
    /// Timestamp when the message was created (ISO 8601 format).
    pub timestamp: String,
}

impl ConversationMessage {
    /// Creates a user message stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            agent: None,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Creates an assistant message attributed to the given agent.
    pub fn assistant(agent: AgentRole, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            agent: Some(agent),
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The display label for the author of this message.
    pub fn author_label(&self) -> String {
        match (self.role, self.agent) {
            (MessageRole::User, _) => "User".to_string(),
            (MessageRole::Assistant, Some(agent)) => agent.to_string(),
            // An assistant message without attribution should not occur;
            // keep the transcript well-formed anyway.
            (MessageRole::Assistant, None) => "Assistant".to_string(),
        }
    }
}
