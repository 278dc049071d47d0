//! Session domain types: messages, history, and session state.

mod history;
mod message;
mod model;

pub use history::ConversationHistory;
pub use message::{AgentRole, ConversationMessage, MessageRole};
pub use model::{SessionState, WELCOME_MESSAGE};
