//! Test language models — `LanguageModel` implementations for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use democopilot_core::language_model::{LanguageModel, LanguageModelError, QuestionContext};

/// A model that returns the same raw response to every question and records
/// the questions and contexts it received.
#[derive(Debug)]
pub struct ScriptedLanguageModel {
    response: String,
    latency: Duration,
    received: Mutex<Vec<(String, QuestionContext)>>,
}

impl ScriptedLanguageModel {
    /// Returns `response` verbatim for every question.
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            latency: Duration::ZERO,
            received: Mutex::new(Vec::new()),
        }
    }

    /// Answers `{"answer": answer, "action": "continue"}`.
    #[must_use]
    pub fn answering(answer: &str) -> Self {
        Self::new(format!(r#"{{"answer": "{answer}", "action": "continue"}}"#))
    }

    /// Answers and asks for a jump to `target_step`.
    #[must_use]
    pub fn jumping_to(answer: &str, target_step: &str) -> Self {
        Self::new(format!(
            r#"{{"answer": "{answer}", "action": "jump_to_step", "target_step": "{target_step}"}}"#
        ))
    }

    /// Makes each call take `latency` before returning.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns every question received so far with its context.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn received(&self) -> Vec<(String, QuestionContext)> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedLanguageModel {
    async fn answer_question(
        &self,
        question: &str,
        context: &QuestionContext,
    ) -> Result<String, LanguageModelError> {
        self.received
            .lock()
            .unwrap()
            .push((question.to_owned(), context.clone()));
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.response.clone())
    }
}

/// A model that always fails. Useful for testing the fallback answer.
#[derive(Debug, Default)]
pub struct FailingLanguageModel;

#[async_trait]
impl LanguageModel for FailingLanguageModel {
    async fn answer_question(
        &self,
        _question: &str,
        _context: &QuestionContext,
    ) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::Unavailable("connection refused".into()))
    }
}
