//! Runs a step's narration and actions together.

use std::sync::Arc;
use std::time::Duration;

use democopilot_core::browser::BrowserAutomation;
use democopilot_core::error::FatalCollaboratorFailure;
use democopilot_core::speech::SpeechSynthesizer;
use tokio::sync::oneshot;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

use super::gate::PauseGate;
use super::observers::ObserverSet;
use super::pacer::{ActionPacer, PacingBudget};
use crate::config::EngineConfig;
use crate::domain::narration::{NarrationResult, StepResult};
use crate::domain::script::DemoStep;

/// Executes one step as two concurrent units.
///
/// The narration unit synthesizes the step's text and holds while it plays.
/// The action unit waits until synthesis settles. If there is audio it
/// waits out the rest of a short lead, then paces the actions across most
/// of the estimated narration. The step is done when both units are.
pub struct NarrationActionSynchronizer {
    speech: Arc<dyn SpeechSynthesizer>,
    pacer: ActionPacer,
    config: EngineConfig,
}

impl NarrationActionSynchronizer {
    /// Creates a synchronizer for one session's collaborators.
    #[must_use]
    pub fn new(
        speech: Arc<dyn SpeechSynthesizer>,
        browser: Arc<dyn BrowserAutomation>,
        config: EngineConfig,
    ) -> Self {
        Self {
            speech,
            pacer: ActionPacer::new(browser, config.action_timeout),
            config,
        }
    }

    /// Runs `step` to completion.
    ///
    /// Narration problems never fail a step. When synthesis errors, times
    /// out, or comes back silent, the step runs silently with actions paced
    /// only by their explicit delays.
    ///
    /// # Errors
    ///
    /// Returns `FatalCollaboratorFailure` if the browser becomes unusable.
    pub async fn run_step(
        &self,
        step: &DemoStep,
        gate: &PauseGate,
        observers: &ObserverSet,
    ) -> Result<StepResult, FatalCollaboratorFailure> {
        let estimated = self.config.estimate_narration(&step.narration);
        let attempted = self.speech.is_available() && !estimated.is_zero();

        info!(
            step = %step.name,
            position = step.position,
            actions = step.actions.len(),
            estimated_ms = u64::try_from(estimated.as_millis()).unwrap_or(u64::MAX),
            attempted,
            "executing step"
        );

        let started = Instant::now();
        let (audible_tx, audible_rx) = oneshot::channel();
        let narration = async {
            Ok::<_, FatalCollaboratorFailure>(
                self.narrate(&step.narration, estimated, attempted, audible_tx, observers)
                    .await,
            )
        };
        let actions = async {
            // A dropped sender means narration never produced audio.
            let budget = if audible_rx.await.unwrap_or(false) {
                let lead = self
                    .config
                    .lead_delay(estimated)
                    .saturating_sub(started.elapsed());
                if !lead.is_zero() {
                    sleep(lead).await;
                }
                PacingBudget::Proportional(self.config.pacing_budget(estimated))
            } else {
                PacingBudget::ExplicitOnly
            };
            self.pacer.run(&step.actions, budget, gate).await
        };
        let (narration, outcomes) = tokio::try_join!(narration, actions)?;

        let drift_ms = narration.drift_ms();
        debug!(step = %step.name, drift_ms, available = narration.available, "narration drift");

        Ok(StepResult {
            step_name: step.name.clone(),
            position: step.position,
            narration,
            outcomes,
            drift_ms,
        })
    }

    /// Speaks `text` on its own, holding while it plays. Failures and blank
    /// text are silent.
    pub async fn announce(&self, text: &str, observers: &ObserverSet) -> NarrationResult {
        let estimated = self.config.estimate_narration(text);
        let attempted = self.speech.is_available() && !estimated.is_zero();
        let (audible, _) = oneshot::channel();
        self.narrate(text, estimated, attempted, audible, observers)
            .await
    }

    /// Synthesizes and plays `text`, reporting on `audible` whether there is
    /// anything to play as soon as synthesis settles.
    async fn narrate(
        &self,
        text: &str,
        estimated: Duration,
        attempted: bool,
        audible: oneshot::Sender<bool>,
        observers: &ObserverSet,
    ) -> NarrationResult {
        if !attempted {
            let _ = audible.send(false);
            return NarrationResult::silent(text, estimated);
        }

        let started = Instant::now();
        let output = match timeout(self.config.narration_timeout, self.speech.speak(text)).await {
            Ok(Ok(output)) if output.is_silent() => {
                warn!("narration came back empty, continuing silently");
                None
            }
            Ok(Ok(output)) => Some(output),
            Ok(Err(e)) => {
                warn!(error = %e, "narration failed, continuing silently");
                None
            }
            Err(_) => {
                warn!(
                    timeout_ms = u64::try_from(self.config.narration_timeout.as_millis())
                        .unwrap_or(u64::MAX),
                    "narration timed out, continuing silently"
                );
                None
            }
        };
        let _ = audible.send(output.is_some());
        let Some(output) = output else {
            return NarrationResult::silent(text, estimated);
        };

        observers.audio(&output.audio);
        let remaining = output.duration.saturating_sub(started.elapsed());
        if !remaining.is_zero() {
            sleep(remaining).await;
        }
        NarrationResult::spoken(text, output, estimated)
    }
}
