//! Session orchestration.
//!
//! [`ScreeningSession`] drives one turn end-to-end: append the user
//! message, rebuild the knowledge context, derive the stage, build the
//! task, execute the target agent, classify the output, and update the
//! session state. Every call returns a well-formed [`ScreeningTurn`]; no
//! error type crosses this boundary.

use crate::task_factory::TaskFactory;
use sana_core::agent::{AgentError, AgentExecutor, AgentReply};
use sana_core::assessment::Assessment;
use sana_core::config::ScreeningConfig;
use sana_core::knowledge::KnowledgeContext;
use sana_core::session::{
    AgentRole, ConversationHistory, ConversationMessage, SessionState, WELCOME_MESSAGE,
};
use sana_core::stage::Stage;
use sana_interaction::KnowledgeContextBuilder;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Fallback content authored by `System` when a turn fails.
pub const FALLBACK_MESSAGE: &str = "I apologize, but I encountered an error processing \
your response. Could you please try again?";

/// Notice returned when input arrives after the assessment completed.
pub const SESSION_COMPLETE_NOTICE: &str = "This assessment is already complete. \
Start a new assessment if you'd like to begin again.";

/// Result of processing one user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningTurn {
    /// The agent (or System) response to render.
    pub message: ConversationMessage,
    /// Whether the session completed on this turn.
    pub complete: bool,
    /// The validated assessment, present iff `complete` just became true.
    pub assessment: Option<Assessment>,
    /// Knowledge-source warnings to surface to the user, if any.
    pub warnings: Vec<String>,
}

/// One screening conversation, processed strictly turn-by-turn.
///
/// The session owns its [`SessionState`]; the UI collaborator reads
/// snapshots and feeds user input, nothing more. Distinct sessions share
/// no mutable state.
pub struct ScreeningSession {
    id: String,
    config: ScreeningConfig,
    welcome: String,
    factory: TaskFactory,
    executor: Arc<dyn AgentExecutor>,
    knowledge: Arc<KnowledgeContextBuilder>,
    state: RwLock<SessionState>,
}

impl ScreeningSession {
    /// Creates a session seeded with the welcome message.
    pub fn new(
        config: ScreeningConfig,
        executor: Arc<dyn AgentExecutor>,
        knowledge: Arc<KnowledgeContextBuilder>,
    ) -> Self {
        let welcome = config
            .welcome
            .clone()
            .unwrap_or_else(|| WELCOME_MESSAGE.to_string());
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            config,
            welcome: welcome.clone(),
            factory: TaskFactory::new(),
            executor,
            knowledge,
            state: RwLock::new(SessionState::seeded(&welcome)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// A snapshot of the session state for rendering.
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Processes one user turn.
    ///
    /// The input is appended to history *before* stage selection, so the
    /// stage for the upcoming response is derived from a count that
    /// includes the just-submitted message. Any internal failure is
    /// absorbed into a `System` fallback turn; the session state stays
    /// well-formed either way.
    pub async fn process(&self, input: &str) -> ScreeningTurn {
        let history = {
            let mut state = self.state.write().await;
            if state.complete {
                return ScreeningTurn {
                    message: ConversationMessage::assistant(
                        AgentRole::System,
                        SESSION_COMPLETE_NOTICE,
                    ),
                    complete: true,
                    assessment: state.result.clone(),
                    warnings: Vec::new(),
                };
            }
            state.history.push(ConversationMessage::user(input));
            state.history.clone()
        };

        let build = self.knowledge.build().await;

        match self.run_turn(&history, &build.context).await {
            Ok((message, complete, assessment)) => {
                let mut state = self.state.write().await;
                state.history.push(message.clone());
                if complete {
                    state.complete = true;
                    state.result = assessment.clone();
                }
                ScreeningTurn {
                    message,
                    complete,
                    assessment,
                    warnings: build.warnings,
                }
            }
            Err(err) => {
                tracing::error!(session_id = %self.id, error = %err, "turn failed, returning fallback");
                let message =
                    ConversationMessage::assistant(AgentRole::System, FALLBACK_MESSAGE);
                let mut state = self.state.write().await;
                state.history.push(message.clone());
                ScreeningTurn {
                    message,
                    complete: false,
                    assessment: None,
                    warnings: build.warnings,
                }
            }
        }
    }

    /// Clears the session back to a freshly seeded state. Idempotent.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        *state = SessionState::seeded(&self.welcome);
    }

    async fn run_turn(
        &self,
        history: &ConversationHistory,
        knowledge: &KnowledgeContext,
    ) -> Result<(ConversationMessage, bool, Option<Assessment>), AgentError> {
        let stage = Stage::select(history, &self.config.stages);
        tracing::debug!(
            session_id = %self.id,
            %stage,
            user_turns = history.user_turn_count(),
            "running turn"
        );

        let task = self.factory.build(stage, history, knowledge)?;
        let reply = self.executor.run(&task, knowledge).await?;

        match stage {
            Stage::Interviewing | Stage::FollowUp => Ok((
                ConversationMessage::assistant(AgentRole::Interviewer, reply.raw),
                false,
                None,
            )),
            Stage::Analyzing => Ok((
                ConversationMessage::assistant(AgentRole::Analyzer, reply.raw),
                false,
                None,
            )),
            Stage::Recommending => {
                let assessment = validate_assessment(&reply)?;
                Ok((
                    ConversationMessage::assistant(AgentRole::Advisor, reply.raw),
                    true,
                    Some(assessment),
                ))
            }
        }
    }
}

/// Validates the structured record demanded by the Recommending stage.
///
/// Fails closed: a missing, malformed, or invariant-violating record is an
/// execution failure, never a partially-populated assessment.
fn validate_assessment(reply: &AgentReply) -> Result<Assessment, AgentError> {
    let assessment = match &reply.structured {
        Some(value) => serde_json::from_value::<Assessment>(value.clone())
            .map_err(|err| AgentError::MalformedOutput(err.to_string()))?,
        None => Assessment::from_raw_output(&reply.raw)?,
    };
    assessment.validate()?;
    Ok(assessment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sana_core::agent::TaskSpec;
    use sana_core::assessment::Severity;
    use sana_core::session::MessageRole;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted executor in place of the LLM framework: pops one reply per
    /// call and records the tasks it was handed.
    struct ScriptedExecutor {
        replies: Mutex<VecDeque<Result<AgentReply, AgentError>>>,
        tasks: Mutex<Vec<TaskSpec>>,
    }

    impl ScriptedExecutor {
        fn new(replies: Vec<Result<AgentReply, AgentError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                tasks: Mutex::new(Vec::new()),
            })
        }

        fn recorded_tasks(&self) -> Vec<TaskSpec> {
            self.tasks.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AgentExecutor for ScriptedExecutor {
        async fn run(
            &self,
            task: &TaskSpec,
            _knowledge: &KnowledgeContext,
        ) -> Result<AgentReply, AgentError> {
            self.tasks.lock().unwrap().push(task.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AgentError::Other("script exhausted".into())))
        }
    }

    fn session_with(executor: Arc<ScriptedExecutor>) -> ScreeningSession {
        ScreeningSession::new(
            ScreeningConfig::default(),
            executor,
            Arc::new(KnowledgeContextBuilder::new(Vec::new())),
        )
    }

    fn advisor_json(score: u8, severity: &str, follow_up: bool) -> String {
        format!(
            r#"Here are my recommendations. {{"phq9_score": {score}, "severity": "{severity}",
            "key_concerns": ["persistent sadness"], "recommendations": ["talk therapy"],
            "resources": ["988 lifeline"], "follow_up_needed": {follow_up}}}"#
        )
    }

    #[tokio::test]
    async fn first_turn_goes_to_the_interviewer() {
        let executor = ScriptedExecutor::new(vec![Ok(AgentReply::text(
            "Great! Over the last two weeks, how often have you felt down?",
        ))]);
        let session = session_with(executor.clone());

        let turn = session.process("yes").await;

        assert_eq!(turn.message.agent, Some(AgentRole::Interviewer));
        assert!(!turn.complete);
        assert!(turn.assessment.is_none());

        let tasks = executor.recorded_tasks();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].target, AgentRole::Interviewer);
        assert!(tasks[0].description.contains("User: yes"));

        // Welcome + user + response.
        let state = session.state().await;
        assert_eq!(state.history.len(), 3);
        assert!(!state.complete);
    }

    #[tokio::test]
    async fn full_screening_reaches_the_advisor_on_turn_seventeen() {
        let mut replies: Vec<Result<AgentReply, AgentError>> = (0..16)
            .map(|i| Ok(AgentReply::text(format!("question {i}"))))
            .collect();
        replies.push(Ok(AgentReply::text(advisor_json(12, "Moderate", false))));

        let executor = ScriptedExecutor::new(replies);
        let session = session_with(executor.clone());

        let mut last_turn = None;
        for i in 0..17 {
            last_turn = Some(session.process(&format!("answer {i}")).await);
        }
        let final_turn = last_turn.unwrap();

        assert!(final_turn.complete);
        assert_eq!(final_turn.message.agent, Some(AgentRole::Advisor));
        let assessment = final_turn.assessment.unwrap();
        assert_eq!(assessment.phq9_score, 12);
        assert_eq!(assessment.severity, Severity::Moderate);
        assert!(assessment.validate().is_ok());

        let tasks = executor.recorded_tasks();
        assert_eq!(tasks.len(), 17);
        // Turns 1-10 interview, 11-15 follow up, 16 analyzes, 17 recommends.
        assert_eq!(tasks[9].target, AgentRole::Interviewer);
        assert_eq!(tasks[10].target, AgentRole::Interviewer);
        assert_eq!(tasks[15].target, AgentRole::Analyzer);
        assert_eq!(tasks[16].target, AgentRole::Advisor);
        assert!(tasks[16].output_schema.is_some());

        let state = session.state().await;
        assert!(state.complete);
        assert_eq!(state.result, Some(assessment));
    }

    #[tokio::test]
    async fn analyzing_turn_is_attributed_to_the_analyzer() {
        let replies: Vec<Result<AgentReply, AgentError>> = (0..15)
            .map(|i| Ok(AgentReply::text(format!("question {i}"))))
            .chain([Ok(AgentReply::text("Your PHQ-9 score is 12, Moderate."))])
            .collect();
        let session = session_with(ScriptedExecutor::new(replies));

        let mut turn = None;
        for i in 0..16 {
            turn = Some(session.process(&format!("answer {i}")).await);
        }
        let turn = turn.unwrap();

        assert_eq!(turn.message.agent, Some(AgentRole::Analyzer));
        assert!(!turn.complete);
        assert!(turn.assessment.is_none());
    }

    #[tokio::test]
    async fn execution_failure_degrades_to_system_fallback() {
        let executor = ScriptedExecutor::new(vec![
            Err(AgentError::ExecutionFailed("network down".into())),
            Ok(AgentReply::text("back on track - how have you been sleeping?")),
        ]);
        let session = session_with(executor);

        let turn = session.process("hello").await;
        assert_eq!(turn.message.agent, Some(AgentRole::System));
        assert_eq!(turn.message.content, FALLBACK_MESSAGE);
        assert!(!turn.complete);
        assert!(turn.assessment.is_none());

        // State stays well-formed: welcome + user + fallback, and the next
        // turn proceeds normally.
        let state = session.state().await;
        assert_eq!(state.history.len(), 3);
        assert!(!state.complete);
        assert!(state.result.is_none());

        let next = session.process("trying again").await;
        assert_eq!(next.message.agent, Some(AgentRole::Interviewer));
    }

    #[tokio::test]
    async fn malformed_assessment_fails_closed() {
        // Severity contradicts the score band.
        let mut replies: Vec<Result<AgentReply, AgentError>> = (0..16)
            .map(|_| Ok(AgentReply::text("q")))
            .collect();
        replies.push(Ok(AgentReply::text(advisor_json(25, "Mild", false))));

        let session = session_with(ScriptedExecutor::new(replies));
        let mut turn = None;
        for i in 0..17 {
            turn = Some(session.process(&format!("answer {i}")).await);
        }
        let turn = turn.unwrap();

        assert_eq!(turn.message.agent, Some(AgentRole::System));
        assert!(!turn.complete);
        assert!(turn.assessment.is_none());
        assert!(!session.state().await.complete);
    }

    #[tokio::test]
    async fn missing_follow_up_flag_fails_closed_for_severe() {
        let mut replies: Vec<Result<AgentReply, AgentError>> = (0..16)
            .map(|_| Ok(AgentReply::text("q")))
            .collect();
        replies.push(Ok(AgentReply::text(advisor_json(21, "Severe", false))));

        let session = session_with(ScriptedExecutor::new(replies));
        let mut turn = None;
        for i in 0..17 {
            turn = Some(session.process(&format!("answer {i}")).await);
        }
        assert!(!turn.unwrap().complete);
    }

    #[tokio::test]
    async fn pre_extracted_structured_record_is_validated_and_used() {
        let structured = serde_json::json!({
            "phq9_score": 18,
            "severity": "Moderately Severe",
            "key_concerns": ["hopelessness"],
            "recommendations": ["professional support"],
            "resources": ["988 lifeline"],
            "follow_up_needed": true
        });
        let mut replies: Vec<Result<AgentReply, AgentError>> = (0..16)
            .map(|_| Ok(AgentReply::text("q")))
            .collect();
        replies.push(Ok(AgentReply {
            raw: "Please seek support soon.".to_string(),
            structured: Some(structured),
        }));

        let session = session_with(ScriptedExecutor::new(replies));
        let mut turn = None;
        for i in 0..17 {
            turn = Some(session.process(&format!("answer {i}")).await);
        }
        let turn = turn.unwrap();

        assert!(turn.complete);
        let assessment = turn.assessment.unwrap();
        assert_eq!(assessment.severity, Severity::ModeratelySevere);
        assert!(assessment.follow_up_needed);
    }

    #[tokio::test]
    async fn completed_session_refuses_further_turns() {
        let mut replies: Vec<Result<AgentReply, AgentError>> = (0..16)
            .map(|_| Ok(AgentReply::text("q")))
            .collect();
        replies.push(Ok(AgentReply::text(advisor_json(3, "None", false))));

        let session = session_with(ScriptedExecutor::new(replies));
        for i in 0..17 {
            session.process(&format!("answer {i}")).await;
        }
        let len_after_completion = session.state().await.history.len();

        let turn = session.process("one more thing").await;
        assert_eq!(turn.message.agent, Some(AgentRole::System));
        assert_eq!(turn.message.content, SESSION_COMPLETE_NOTICE);
        assert!(turn.complete);
        // History untouched: the extra input is not recorded.
        assert_eq!(session.state().await.history.len(), len_after_completion);
    }

    #[tokio::test]
    async fn reset_is_idempotent() {
        let executor = ScriptedExecutor::new(vec![Ok(AgentReply::text("hi"))]);
        let session = session_with(executor);

        session.process("hello").await;
        session.reset().await;
        let first = session.state().await;

        session.reset().await;
        let second = session.state().await;

        for state in [&first, &second] {
            assert_eq!(state.history.len(), 1);
            assert!(!state.complete);
            assert!(state.result.is_none());

            let welcome = &state.history.messages()[0];
            assert_eq!(welcome.role, MessageRole::Assistant);
            assert_eq!(welcome.agent, Some(AgentRole::Interviewer));
            assert_eq!(welcome.content, WELCOME_MESSAGE);
        }
    }

    #[tokio::test]
    async fn reset_reopens_a_completed_session() {
        let mut replies: Vec<Result<AgentReply, AgentError>> = (0..16)
            .map(|_| Ok(AgentReply::text("q")))
            .collect();
        replies.push(Ok(AgentReply::text(advisor_json(8, "Mild", false))));
        replies.push(Ok(AgentReply::text("Welcome back - ready to begin?")));

        let session = session_with(ScriptedExecutor::new(replies));
        for i in 0..17 {
            session.process(&format!("answer {i}")).await;
        }
        assert!(session.state().await.complete);

        session.reset().await;
        assert!(!session.state().await.complete);

        let turn = session.process("yes").await;
        assert_eq!(turn.message.agent, Some(AgentRole::Interviewer));
    }
}
