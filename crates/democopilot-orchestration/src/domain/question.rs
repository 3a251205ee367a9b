//! Customer questions and how they were resolved.

use chrono::{DateTime, Utc};
use democopilot_core::clock::Clock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Spoken when no usable answer could be drafted.
pub const FALLBACK_ANSWER: &str = "I'm sorry, I couldn't come up with a good answer to that \
just now. Let's keep going, and someone from our team will follow up with you.";

/// What the walkthrough does after a question is answered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUp {
    /// Carry on from where the question interrupted.
    #[default]
    Continue,
    /// Redirect the walkthrough to a named step.
    JumpToStep,
    /// Flag the question for a human and carry on.
    EscalateToHuman,
}

impl FollowUp {
    /// Parses a directive leniently: case, `_` and `-` are ignored and
    /// anything unrecognized means `Continue`.
    #[must_use]
    pub fn parse_lenient(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "jumptostep" | "jump" => Self::JumpToStep,
            "escalatetohuman" | "escalate" => Self::EscalateToHuman,
            _ => Self::Continue,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawModelAnswer {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default, alias = "targetStep")]
    target_step: Option<String>,
}

/// A drafted answer parsed out of the language model's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAnswer {
    /// Text to speak.
    pub answer: String,
    /// Requested follow-up.
    pub directive: FollowUp,
    /// Step to jump to, for `JumpToStep`.
    pub target_step: Option<String>,
}

impl ModelAnswer {
    /// Parses a model reply.
    ///
    /// The reply may wrap the JSON object in prose or a code fence. Missing
    /// `action` and `target_step` fields take defaults. Returns `None` when
    /// no object can be found or the answer is blank.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end < start {
            return None;
        }
        let parsed: RawModelAnswer = serde_json::from_str(&raw[start..=end]).ok()?;
        let answer = parsed.answer.map(|a| a.trim().to_owned()).filter(|a| !a.is_empty())?;
        Some(Self {
            answer,
            directive: parsed
                .action
                .as_deref()
                .map_or(FollowUp::Continue, FollowUp::parse_lenient),
            target_step: parsed
                .target_step
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty()),
        })
    }

    /// The canned answer used when drafting fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self {
            answer: FALLBACK_ANSWER.to_owned(),
            directive: FollowUp::Continue,
            target_step: None,
        }
    }
}

/// How a question was resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResolution {
    /// The answer that was spoken.
    pub answer: String,
    /// The follow-up the model asked for.
    pub directive: FollowUp,
    /// Jump target named by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_step: Option<String>,
    /// `true` if the walkthrough was redirected.
    pub jumped: bool,
    /// `true` if the canned fallback answer was used.
    pub fallback: bool,
    /// When the answer finished.
    pub resolved_at: DateTime<Utc>,
}

/// A customer question raised during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionEvent {
    /// Question identifier.
    pub id: Uuid,
    /// The question as asked.
    pub text: String,
    /// When it was asked.
    pub raised_at: DateTime<Utc>,
    /// Set once the answer has been spoken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<QuestionResolution>,
}

impl QuestionEvent {
    /// Creates an unresolved question.
    #[must_use]
    pub fn new(text: impl Into<String>, clock: &dyn Clock) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            raised_at: clock.now(),
            resolution: None,
        }
    }

    /// Returns `true` once the question has been answered.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}
