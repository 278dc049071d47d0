//! Error type for the agent-execution boundary.

use std::time::Duration;
use thiserror::Error;

use crate::assessment::AssessmentError;

/// Errors produced by agent execution.
///
/// No variant of this type crosses the orchestrator boundary: every
/// `AgentError` is absorbed there and converted into a System fallback
/// response.
#[derive(Error, Debug)]
pub enum AgentError {
    /// The agent could not carry out the task.
    #[error("Agent execution failed: {0}")]
    ExecutionFailed(String),

    /// An upstream process (HTTP call) failed.
    #[error("Process error (status: {status_code:?}): {message}")]
    Process {
        status_code: Option<u16>,
        message: String,
        is_retryable: bool,
        retry_after: Option<Duration>,
    },

    /// A structured record was required but missing, malformed, or invalid.
    #[error("Malformed structured output: {0}")]
    MalformedOutput(String),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Creates a process error carrying a `Retry-After` delay.
    pub fn process_error_with_retry_after(
        status_code: u16,
        message: impl Into<String>,
        is_retryable: bool,
        retry_after: Duration,
    ) -> Self {
        Self::Process {
            status_code: Some(status_code),
            message: message.into(),
            is_retryable,
            retry_after: Some(retry_after),
        }
    }

    /// Whether a retry might succeed. The orchestrator does not retry;
    /// this is informational for callers that enforce their own policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Process { is_retryable: true, .. })
    }
}

impl From<AssessmentError> for AgentError {
    fn from(err: AssessmentError) -> Self {
        Self::MalformedOutput(err.to_string())
    }
}
