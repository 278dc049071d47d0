//! Task construction.
//!
//! The factory turns a stage plus the conversation history into the single
//! task handed to the matching agent. Task descriptions are rendered from
//! Jinja2 templates embedding the role-labeled transcript - the transcript
//! is the entire memory mechanism, so nothing else carries across turns.

use minijinja::{Environment, context};
use once_cell::sync::Lazy;
use sana_core::agent::{AgentError, OutputSchema, TaskSpec};
use sana_core::knowledge::KnowledgeContext;
use sana_core::session::ConversationHistory;
use sana_core::stage::Stage;

const INTERVIEWING_TEMPLATE: &str = r#"Based on the conversation so far:

{{ transcript }}

{% if sources %}You may consult the attached reference documents: {{ sources | join(", ") }}.

{% endif %}Conduct a personalized PHQ-9 depression screening assessment with the user.
If you're just starting, introduce the PHQ-9 screening and ask the first question.
If you're in the middle of the screening, acknowledge their previous response and ask the next appropriate PHQ-9 question.
Tailor your questions based on their previous answers.
Be empathetic and sensitive in your questioning.
Don't use generic or repetitive responses.
Each question should be personalized and contextual to their situation.
Don't remind them of scoring at every question - only mention it if it seems they need guidance.
Your goal is to make this feel like a natural conversation, not a robotic questionnaire."#;

const FOLLOW_UP_TEMPLATE: &str = r#"Based on the conversation so far:

{{ transcript }}

{% if sources %}You may consult the attached reference documents: {{ sources | join(", ") }}.

{% endif %}You're now in the follow-up phase after the PHQ-9 screening. Ask 3-5 follow-up questions
that are deeply personalized to the user's specific situation and responses so far.
Focus on understanding their specific context, challenges, and resources.
Each question should build on their previous answers and help create a comprehensive
picture of their mental health situation.
Be warm, empathetic, and conversational - avoid clinical or generic questions.
If you've already asked enough follow-up questions, let them know you'll now analyze their responses."#;

const ANALYZING_TEMPLATE: &str = r#"Based on the full conversation so far:

{{ transcript }}

{% if sources %}You may consult the attached reference documents: {{ sources | join(", ") }}.

{% endif %}Analyze all the user's responses comprehensively. Calculate a PHQ-9 score based on their
responses to the depression screening questions. Identify key patterns, concerns, and
potential mental health conditions evident in their responses.

Your analysis should be thoughtful, personalized, and consider the full context of the
conversation, not just the screening answers. Identify specific symptoms, triggers,
and patterns that emerged during your conversation with them.

Explain what their PHQ-9 score means in terms of depression severity:
0-4: None/Minimal depression
5-9: Mild depression
10-14: Moderate depression
15-19: Moderately Severe depression
20-27: Severe depression

End by letting them know you'll now pass this analysis to the Advisor who will provide recommendations."#;

const RECOMMENDING_TEMPLATE: &str = r#"Based on the full conversation so far:

{{ transcript }}

{% if sources %}You may consult the attached reference documents: {{ sources | join(", ") }}.

{% endif %}Create highly personalized mental health recommendations for this specific user.
Your recommendations should directly address the concerns, symptoms, and context they've shared.
Include specific actionable advice, helpful resources, and self-care strategies.
If their severity level indicates professional help is needed, clearly state this in a supportive way.

Ensure recommendations are evidence-based and realistic for them to implement based on what
you know about their situation.
Include a mix of immediate coping strategies and longer-term approaches.
Provide specific resources like hotlines, websites, books, or apps that might help.

Your recommendations should be compassionate, non-judgmental, and hope-focused.

After your narrative, output a single JSON object with exactly these fields:
{
  "phq9_score": <total PHQ-9 score, integer 0-27>,
  "severity": "<one of: None, Mild, Moderate, Moderately Severe, Severe>",
  "key_concerns": [<identified mental health concerns>],
  "recommendations": [<personalized recommendations>],
  "resources": [<helpful resources for the user>],
  "follow_up_needed": <boolean>
}
The severity must match the PHQ-9 score band (0-4 None, 5-9 Mild, 10-14 Moderate,
15-19 Moderately Severe, 20-27 Severe). Set "follow_up_needed" to true whenever the
severity is "Moderately Severe" or "Severe".
IMPORTANT: The record must be valid JSON, with no markdown formatting or code blocks around it."#;

static TEMPLATES: Lazy<Environment<'static>> = Lazy::new(|| {
    let mut env = Environment::new();
    env.add_template("interviewing", INTERVIEWING_TEMPLATE)
        .expect("Failed to register interviewing template");
    env.add_template("follow_up", FOLLOW_UP_TEMPLATE)
        .expect("Failed to register follow_up template");
    env.add_template("analyzing", ANALYZING_TEMPLATE)
        .expect("Failed to register analyzing template");
    env.add_template("recommending", RECOMMENDING_TEMPLATE)
        .expect("Failed to register recommending template");
    env
});

/// Builds one [`TaskSpec`] per turn from the stage and conversation context.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskFactory;

impl TaskFactory {
    pub fn new() -> Self {
        Self
    }

    /// Builds the task for the given stage.
    ///
    /// Pure construction: no side effects, no agent execution. A template
    /// rendering failure is reported as an execution failure, since the
    /// turn cannot proceed either way.
    pub fn build(
        &self,
        stage: Stage,
        history: &ConversationHistory,
        knowledge: &KnowledgeContext,
    ) -> Result<TaskSpec, AgentError> {
        let template_name = match stage {
            Stage::Interviewing => "interviewing",
            Stage::FollowUp => "follow_up",
            Stage::Analyzing => "analyzing",
            Stage::Recommending => "recommending",
        };

        let description = TEMPLATES
            .get_template(template_name)
            .and_then(|template| {
                template.render(context! {
                    transcript => history.to_transcript(),
                    sources => knowledge.source_names(),
                })
            })
            .map_err(|err| {
                AgentError::ExecutionFailed(format!("task construction failed: {err}"))
            })?;

        let (expected_output, output_schema) = match stage {
            Stage::Interviewing => (
                "The next personalized question in the PHQ-9 assessment that feels natural and conversational.",
                None,
            ),
            Stage::FollowUp => (
                "A thoughtful, personalized follow-up question or a transition to the analysis phase.",
                None,
            ),
            Stage::Analyzing => (
                "A comprehensive, personalized analysis of the user's mental health state.",
                None,
            ),
            Stage::Recommending => (
                "Comprehensive, personalized recommendations including actionable advice, resources, and clear guidance, followed by the structured assessment record.",
                Some(OutputSchema::Assessment),
            ),
        };

        Ok(TaskSpec {
            description,
            expected_output: expected_output.to_string(),
            target: stage.target_agent(),
            output_schema,
        })
    }
}
