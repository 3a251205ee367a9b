//! Answers customer questions raised mid-walkthrough.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use democopilot_core::clock::Clock;
use democopilot_core::error::DomainError;
use democopilot_core::language_model::{LanguageModel, QuestionContext, QuestionExchange};
use democopilot_core::speech::SpeechSynthesizer;
use tokio::time::{Instant, sleep, timeout};
use tracing::{info, warn};

use super::observers::ObserverSet;
use crate::config::EngineConfig;
use crate::domain::question::{FollowUp, ModelAnswer, QuestionEvent, QuestionResolution};

const ANSWER_PREFIX: &str = "Great question. ";

struct Drafted {
    answer: ModelAnswer,
    fallback: bool,
}

/// Drafts, speaks and applies the answer to one question at a time.
///
/// Answering never fails: an unreachable, slow or incoherent model yields a
/// canned answer and the walkthrough continues.
pub struct QuestionInterruptHandler {
    model: Arc<dyn LanguageModel>,
    speech: Arc<dyn SpeechSynthesizer>,
    question_timeout: Duration,
    narration_timeout: Duration,
    history_limit: usize,
    history: Mutex<VecDeque<QuestionExchange>>,
}

impl QuestionInterruptHandler {
    /// Creates a handler for one session.
    #[must_use]
    pub fn new(
        model: Arc<dyn LanguageModel>,
        speech: Arc<dyn SpeechSynthesizer>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            model,
            speech,
            question_timeout: config.question_timeout,
            narration_timeout: config.narration_timeout,
            history_limit: config.question_history_limit,
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Answers `event` and returns it resolved.
    ///
    /// Speaks exactly one answer, then calls `jump` if the model asked to
    /// redirect the walkthrough. A rejected jump is logged and the
    /// walkthrough continues where it was.
    pub async fn handle<F>(
        &self,
        mut event: QuestionEvent,
        mut context: QuestionContext,
        observers: &ObserverSet,
        clock: &dyn Clock,
        jump: F,
    ) -> QuestionEvent
    where
        F: FnOnce(&str) -> Result<usize, DomainError> + Send,
    {
        info!(question_id = %event.id, "answering question");
        context.history = self.recent_history();

        let drafted = self.draft(&event.text, &context).await;
        self.speak(&drafted, observers).await;
        if !drafted.fallback {
            self.remember(&event.text, &drafted.answer.answer);
        }
        let jumped = Self::redirect(&drafted.answer, jump);

        event.resolution = Some(QuestionResolution {
            answer: drafted.answer.answer,
            directive: drafted.answer.directive,
            target_step: drafted.answer.target_step,
            jumped,
            fallback: drafted.fallback,
            resolved_at: clock.now(),
        });
        event
    }

    /// Earlier exchanges, oldest first.
    #[must_use]
    pub fn recent_history(&self) -> Vec<QuestionExchange> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    async fn draft(&self, question: &str, context: &QuestionContext) -> Drafted {
        let reply = timeout(
            self.question_timeout,
            self.model.answer_question(question, context),
        )
        .await;
        let raw = match reply {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(error = %e, "language model failed, using fallback answer");
                return Self::fallback();
            }
            Err(_) => {
                warn!("language model timed out, using fallback answer");
                return Self::fallback();
            }
        };
        match ModelAnswer::parse(&raw) {
            Some(answer) => Drafted {
                answer,
                fallback: false,
            },
            None => {
                warn!(
                    reply_len = raw.len(),
                    "unusable language model reply, using fallback answer"
                );
                Self::fallback()
            }
        }
    }

    fn fallback() -> Drafted {
        Drafted {
            answer: ModelAnswer::fallback(),
            fallback: true,
        }
    }

    async fn speak(&self, drafted: &Drafted, observers: &ObserverSet) {
        if !self.speech.is_available() {
            return;
        }
        let text = if drafted.fallback {
            drafted.answer.answer.clone()
        } else {
            format!("{ANSWER_PREFIX}{}", drafted.answer.answer)
        };
        let started = Instant::now();
        match timeout(self.narration_timeout, self.speech.speak(&text)).await {
            Ok(Ok(output)) => {
                observers.audio(&output.audio);
                let remaining = output.duration.saturating_sub(started.elapsed());
                if !remaining.is_zero() {
                    sleep(remaining).await;
                }
            }
            Ok(Err(e)) => warn!(error = %e, "could not speak answer"),
            Err(_) => warn!("speaking the answer timed out"),
        }
    }

    fn remember(&self, question: &str, answer: &str) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.push_back(QuestionExchange {
            question: question.to_owned(),
            answer: answer.to_owned(),
        });
        while history.len() > self.history_limit {
            history.pop_front();
        }
    }

    fn redirect<F>(answer: &ModelAnswer, jump: F) -> bool
    where
        F: FnOnce(&str) -> Result<usize, DomainError>,
    {
        match (answer.directive, answer.target_step.as_deref()) {
            (FollowUp::JumpToStep, Some(target)) => match jump(target) {
                Ok(index) => {
                    info!(target_step = target, index, "redirecting walkthrough");
                    true
                }
                Err(e) => {
                    warn!(error = %e, "ignoring jump to unknown step");
                    false
                }
            },
            (FollowUp::JumpToStep, None) => {
                warn!("jump requested without a target step");
                false
            }
            (FollowUp::EscalateToHuman, _) => {
                info!("question escalated to a human");
                false
            }
            (FollowUp::Continue, _) => false,
        }
    }
}
