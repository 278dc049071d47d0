//! Append-only conversation history.
//!
//! The history is the sole memory mechanism of a screening session: the
//! stage is derived from it and the transcript rendered from it is the only
//! context that carries across turns.

use super::message::{ConversationMessage, MessageRole};
use serde::{Deserialize, Serialize};

/// Ordered, append-only sequence of conversation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationHistory(Vec<ConversationMessage>);

impl ConversationHistory {
    /// Creates an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message. Messages are never mutated or removed.
    pub fn push(&mut self, message: ConversationMessage) {
        self.0.push(message);
    }

    /// Number of messages with role `User`.
    ///
    /// This count is the only input to stage selection.
    pub fn user_turn_count(&self) -> usize {
        self.0
            .iter()
            .filter(|m| m.role == MessageRole::User)
            .count()
    }

    /// Renders the history as a role-labeled transcript in chronological
    /// order, with entries separated by blank lines:
    ///
    /// ```text
    /// Interviewer: Are you ready to begin?
    ///
    /// User: yes
    /// ```
    pub fn to_transcript(&self) -> String {
        let mut transcript = String::new();
        for message in &self.0 {
            transcript.push_str(&message.author_label());
            transcript.push_str(": ");
            transcript.push_str(&message.content);
            transcript.push_str("\n\n");
        }
        transcript
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
