//! Screening stage derivation.
//!
//! The stage is never stored: it is recomputed from the conversation history
//! on every turn, as a pure function of the user-message count. The count
//! staircase is a deliberate simplification carried over from the original
//! turn-budget design; the thresholds are configuration, not policy.

use crate::config::StageThresholds;
use crate::session::{AgentRole, ConversationHistory};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// The discrete phase of a screening session.
///
/// Stages advance in a fixed order as the user-message count grows:
/// Interviewing → FollowUp → Analyzing → Recommending. A stage never
/// regresses within one session because history is append-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display)]
pub enum Stage {
    /// PHQ-9 screening questions.
    Interviewing,
    /// Personalized follow-up questions after the screening.
    FollowUp,
    /// Narrative score and severity analysis.
    Analyzing,
    /// Final recommendations and the structured assessment record.
    Recommending,
}

impl Stage {
    /// Derives the current stage from the history.
    ///
    /// Counts messages with role `User` in the history as it stands at
    /// decision time; the just-submitted user message is expected to have
    /// been appended already (see the orchestrator contract). Reproducible
    /// given identical history: no hidden counters, no randomness.
    pub fn select(history: &ConversationHistory, thresholds: &StageThresholds) -> Self {
        Self::for_user_turns(history.user_turn_count(), thresholds)
    }

    /// Stage for a given user-message count.
    pub fn for_user_turns(count: usize, thresholds: &StageThresholds) -> Self {
        if count <= thresholds.interviewing_max {
            Stage::Interviewing
        } else if count <= thresholds.follow_up_max {
            Stage::FollowUp
        } else if count <= thresholds.analyzing_max {
            Stage::Analyzing
        } else {
            Stage::Recommending
        }
    }

    /// The agent that acts in this stage.
    pub fn target_agent(&self) -> AgentRole {
        match self {
            Stage::Interviewing | Stage::FollowUp => AgentRole::Interviewer,
            Stage::Analyzing => AgentRole::Analyzer,
            Stage::Recommending => AgentRole::Advisor,
        }
    }

    /// Whether this stage produces the terminal structured assessment.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Recommending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ConversationMessage;

    fn history_with_user_turns(count: usize) -> ConversationHistory {
        let mut history = ConversationHistory::new();
        history.push(ConversationMessage::assistant(
            AgentRole::Interviewer,
            "welcome",
        ));
        for i in 0..count {
            history.push(ConversationMessage::user(format!("answer {i}")));
            history.push(ConversationMessage::assistant(
                AgentRole::Interviewer,
                format!("question {i}"),
            ));
        }
        history
    }

    #[test]
    fn stage_depends_only_on_user_turn_count() {
        let thresholds = StageThresholds::default();

        let mut short_content = ConversationHistory::new();
        let mut long_content = ConversationHistory::new();
        for _ in 0..12 {
            short_content.push(ConversationMessage::user("ok"));
            long_content.push(ConversationMessage::user(
                "a much longer answer describing feelings in detail",
            ));
        }

        assert_eq!(
            Stage::select(&short_content, &thresholds),
            Stage::select(&long_content, &thresholds)
        );
    }

    #[test]
    fn boundary_counts() {
        let thresholds = StageThresholds::default();
        assert_eq!(
            Stage::for_user_turns(10, &thresholds),
            Stage::Interviewing
        );
        assert_eq!(Stage::for_user_turns(11, &thresholds), Stage::FollowUp);
        assert_eq!(Stage::for_user_turns(15, &thresholds), Stage::FollowUp);
        assert_eq!(Stage::for_user_turns(16, &thresholds), Stage::Analyzing);
        assert_eq!(Stage::for_user_turns(17, &thresholds), Stage::Recommending);
    }

    #[test]
    fn first_turn_is_interviewing() {
        let thresholds = StageThresholds::default();
        assert_eq!(Stage::for_user_turns(0, &thresholds), Stage::Interviewing);
        assert_eq!(Stage::for_user_turns(1, &thresholds), Stage::Interviewing);
    }

    #[test]
    fn stage_sequence_is_monotone_and_skips_nothing() {
        let thresholds = StageThresholds::default();
        let mut previous = Stage::Interviewing;
        let mut seen = vec![previous];

        for count in 0..=25 {
            let stage = Stage::for_user_turns(count, &thresholds);
            assert!(stage >= previous, "stage regressed at count {count}");
            if stage != previous {
                seen.push(stage);
                previous = stage;
            }
        }

        assert_eq!(
            seen,
            vec![
                Stage::Interviewing,
                Stage::FollowUp,
                Stage::Analyzing,
                Stage::Recommending
            ]
        );
    }

    #[test]
    fn select_reads_the_existing_history() {
        let thresholds = StageThresholds::default();
        let history = history_with_user_turns(16);
        assert_eq!(Stage::select(&history, &thresholds), Stage::Analyzing);
        // Pure: selecting again yields the same stage.
        assert_eq!(Stage::select(&history, &thresholds), Stage::Analyzing);
    }

    #[test]
    fn target_agent_per_stage() {
        assert_eq!(Stage::Interviewing.target_agent(), AgentRole::Interviewer);
        assert_eq!(Stage::FollowUp.target_agent(), AgentRole::Interviewer);
        assert_eq!(Stage::Analyzing.target_agent(), AgentRole::Analyzer);
        assert_eq!(Stage::Recommending.target_agent(), AgentRole::Advisor);
    }
}
