//! The structured assessment record and its invariants.
//!
//! An [`Assessment`] is the terminal artifact of a screening session,
//! produced once by the Advisor in the Recommending stage. The record is
//! validated before it is accepted: a malformed or inconsistent payload is
//! rejected rather than surfaced partially populated.

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

/// Maximum PHQ-9 total score.
pub const MAX_PHQ9_SCORE: u8 = 27;

/// Depression severity band for a PHQ-9 total score.
///
/// Banding: 0-4 None, 5-9 Mild, 10-14 Moderate, 15-19 Moderately Severe,
/// 20-27 Severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
pub enum Severity {
    #[serde(rename = "None")]
    #[strum(serialize = "None")]
    None,
    Mild,
    Moderate,
    #[serde(rename = "Moderately Severe")]
    #[strum(serialize = "Moderately Severe")]
    ModeratelySevere,
    Severe,
}

impl Severity {
    /// Severity band for a score, or `None` if the score exceeds the PHQ-9
    /// maximum of 27.
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            0..=4 => Some(Severity::None),
            5..=9 => Some(Severity::Mild),
            10..=14 => Some(Severity::Moderate),
            15..=19 => Some(Severity::ModeratelySevere),
            20..=27 => Some(Severity::Severe),
            _ => None,
        }
    }

    /// Whether this severity mandates `follow_up_needed` on the record.
    ///
    /// This is the minimum bar: the Advisor may also recommend follow-up
    /// for lower severities in its narrative.
    pub fn requires_follow_up(&self) -> bool {
        matches!(self, Severity::ModeratelySevere | Severity::Severe)
    }
}

/// Validation failures for an assessment payload.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssessmentError {
    #[error("invalid assessment payload: {0}")]
    Parse(String),
    #[error("PHQ-9 score {0} is out of range (0-27)")]
    ScoreOutOfRange(u8),
    #[error("severity {severity} does not match score {score} (expected {expected})")]
    SeverityMismatch {
        score: u8,
        severity: Severity,
        expected: Severity,
    },
    #[error("follow_up_needed must be true for severity {0}")]
    FollowUpRequired(Severity),
}

/// Structured mental health assessment produced in the Recommending stage.
///
/// Immutable once produced and validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// Total PHQ-9 score (0-27).
    pub phq9_score: u8,
    /// Depression severity matching the score band.
    pub severity: Severity,
    /// Identified mental health concerns.
    pub key_concerns: Vec<String>,
    /// Personalized recommendations.
    pub recommendations: Vec<String>,
    /// Helpful resources for the user.
    pub resources: Vec<String>,
    /// Whether professional follow-up is recommended.
    pub follow_up_needed: bool,
}

impl Assessment {
    /// Checks the record's invariants, failing closed on any violation.
    pub fn validate(&self) -> Result<(), AssessmentError> {
        let expected = Severity::from_score(self.phq9_score)
            .ok_or(AssessmentError::ScoreOutOfRange(self.phq9_score))?;

        if self.severity != expected {
            return Err(AssessmentError::SeverityMismatch {
                score: self.phq9_score,
                severity: self.severity,
                expected,
            });
        }

        if self.severity.requires_follow_up() && !self.follow_up_needed {
            return Err(AssessmentError::FollowUpRequired(self.severity));
        }

        Ok(())
    }

    /// Parses and validates an assessment from raw agent output.
    ///
    /// The agent is instructed to emit bare JSON, but replies wrapped in
    /// markdown fences or surrounded by narrative are tolerated: the first
    /// `{` .. last `}` span is taken as the payload.
    pub fn from_raw_output(raw: &str) -> Result<Self, AssessmentError> {
        let payload = extract_json_payload(raw)
            .ok_or_else(|| AssessmentError::Parse("no JSON object in agent output".into()))?;

        let assessment: Assessment = serde_json::from_str(payload)
            .map_err(|err| AssessmentError::Parse(err.to_string()))?;

        assessment.validate()?;
        Ok(assessment)
    }
}

/// The first `{` .. last `}` span of the text, if any.
///
/// Used to pull a candidate JSON record out of agent output that may wrap
/// it in markdown fences or narrative.
pub fn extract_json_payload(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&raw[start..=end])
}
