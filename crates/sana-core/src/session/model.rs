//! Session domain model.
//!
//! This module contains the session state record that represents one
//! screening conversation in the application's domain layer.

use super::history::ConversationHistory;
use super::message::{AgentRole, ConversationMessage};
use crate::assessment::Assessment;
use serde::{Deserialize, Serialize};

/// Welcome message seeded into every fresh session.
pub const WELCOME_MESSAGE: &str = "Hi there! I'm your mental health interviewer. \
I'd like to start with a depression screening called PHQ-9, followed by some \
additional questions to better understand your situation. This will help us \
provide personalized recommendations for you. Everything you share is \
confidential. Are you ready to begin?";

/// The complete state of one screening session.
///
/// The state is mutated only by the session orchestrator: the history grows
/// append-only during a session, and `complete`/`result` are written exactly
/// once, when the Recommending stage produces a validated assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Ordered message log, rendered by the UI collaborator.
    pub history: ConversationHistory,
    /// Whether the assessment has been produced.
    pub complete: bool,
    /// The terminal assessment record, present iff `complete` is true.
    pub result: Option<Assessment>,
}

impl SessionState {
    /// Creates a fresh state seeded with the welcome message, using the
    /// given welcome text (the configured override or [`WELCOME_MESSAGE`]).
    pub fn seeded(welcome: &str) -> Self {
        let mut history = ConversationHistory::new();
        history.push(ConversationMessage::assistant(
            AgentRole::Interviewer,
            welcome,
        ));
        Self {
            history,
            complete: false,
            result: None,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::seeded(WELCOME_MESSAGE)
    }
}
