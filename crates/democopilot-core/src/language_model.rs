//! Language-model collaborator port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a language-model collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LanguageModelError {
    /// The model could not be reached.
    #[error("language model unavailable: {0}")]
    Unavailable(String),

    /// The request was made but failed.
    #[error("language model request failed: {0}")]
    Request(String),
}

/// One earlier question and the answer that was spoken for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionExchange {
    /// The customer's question.
    pub question: String,
    /// The answer that was spoken.
    pub answer: String,
}

/// What the walkthrough is selling. Gives the model something to answer
/// product questions from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductContext {
    /// Product name.
    pub name: String,
    /// One-paragraph overview.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Headline features.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    /// Pricing summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<String>,
}

/// Minimal session context sent along with a question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionContext {
    /// Name of the step most recently executed.
    pub current_step: Option<String>,
    /// 1-based number of that step.
    pub step_number: Option<usize>,
    /// Number of steps in the script.
    pub total_steps: usize,
    /// Completion percentage at the time of the question.
    pub percent_complete: f64,
    /// Customer name, for personalised answers.
    pub customer_name: Option<String>,
    /// Step names the model may ask to jump to.
    pub available_steps: Vec<String>,
    /// The product being demonstrated, when the script describes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductContext>,
    /// Recent exchanges in this session, oldest first.
    pub history: Vec<QuestionExchange>,
}

/// Drafts answers to customer questions.
///
/// The returned text is expected to be a JSON object of the form
/// `{"answer": "...", "action": "continue" | "jump_to_step" |
/// "escalate_to_human", "target_step": "..."}`. The engine tolerates
/// missing fields and falls back to a fixed answer when the text cannot be
/// parsed.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Answers `question` given the session `context`.
    async fn answer_question(
        &self,
        question: &str,
        context: &QuestionContext,
    ) -> Result<String, LanguageModelError>;
}
