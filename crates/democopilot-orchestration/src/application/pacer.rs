//! Paced, sequential execution of a step's actions.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use democopilot_core::action::{ActionOutcome, ActionSpec, ScrollTarget};
use democopilot_core::browser::{BrowserAutomation, BrowserError};
use democopilot_core::error::FatalCollaboratorFailure;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, error, warn};

use super::gate::PauseGate;

/// How much time a step's actions are spread across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingBudget {
    /// Split the duration evenly across actions without an explicit delay.
    Proportional(Duration),
    /// No narration to pace against. Only explicit delays and waits apply.
    ExplicitOnly,
}

impl PacingBudget {
    /// Even share of the budget for one of `actions` actions.
    #[must_use]
    pub fn share(self, actions: usize) -> Duration {
        match self {
            Self::Proportional(total) if actions > 0 => {
                total / u32::try_from(actions).unwrap_or(u32::MAX)
            }
            _ => Duration::ZERO,
        }
    }
}

enum Dispatch {
    Performed,
    Skipped,
}

/// Runs actions one at a time against the browser.
///
/// Each action is held for its allotment: the explicit delay if the script
/// set one, else an even share of the budget. Execution time counts toward
/// the allotment. The pause gate is checked before every action.
pub struct ActionPacer {
    browser: Arc<dyn BrowserAutomation>,
    action_timeout: Duration,
}

impl ActionPacer {
    /// Creates a pacer bounding each browser call by `action_timeout`.
    #[must_use]
    pub fn new(browser: Arc<dyn BrowserAutomation>, action_timeout: Duration) -> Self {
        Self {
            browser,
            action_timeout,
        }
    }

    /// Runs `actions` in order and returns one outcome per action.
    ///
    /// An ordinary failure or timeout is recorded and the next action runs.
    ///
    /// # Errors
    ///
    /// Returns `FatalCollaboratorFailure` as soon as the browser reports
    /// that its session is gone. Later actions are not attempted.
    pub async fn run(
        &self,
        actions: &[ActionSpec],
        budget: PacingBudget,
        gate: &PauseGate,
    ) -> Result<Vec<ActionOutcome>, FatalCollaboratorFailure> {
        let share = budget.share(actions.len());
        let mut outcomes = Vec::with_capacity(actions.len());

        for (index, action) in actions.iter().enumerate() {
            gate.wait_open().await;

            let kind = action.kind();
            let started = Instant::now();
            let outcome = match self.dispatch(action).await {
                Ok(Dispatch::Performed) => {
                    ActionOutcome::succeeded(index, kind, started.elapsed())
                }
                Ok(Dispatch::Skipped) => {
                    outcomes.push(ActionOutcome::skipped(index, kind));
                    continue;
                }
                Err(e) if e.is_fatal() => {
                    error!(action_index = index, kind, error = %e, "browser session lost");
                    return Err(FatalCollaboratorFailure::browser(e.to_string()));
                }
                Err(e) => {
                    warn!(action_index = index, kind, error = %e, "action failed, continuing");
                    ActionOutcome::failed(index, kind, e.to_string(), started.elapsed())
                }
            };
            outcomes.push(outcome);

            let allotted = action.explicit_delay().unwrap_or(share);
            let remaining = allotted.saturating_sub(started.elapsed());
            if !remaining.is_zero() {
                sleep(remaining).await;
            }
        }

        Ok(outcomes)
    }

    async fn dispatch(&self, action: &ActionSpec) -> Result<Dispatch, BrowserError> {
        let browser = self.browser.as_ref();
        match action {
            ActionSpec::Click {
                selector,
                description,
                ..
            } => {
                debug!(selector = %selector, description = description.as_deref(), "click");
                self.bounded(browser.click(selector)).await?;
            }
            ActionSpec::TypeText { selector, text, .. } => {
                debug!(selector = %selector, chars = text.chars().count(), "type text");
                self.bounded(browser.type_text(selector, text)).await?;
            }
            ActionSpec::Navigate { url, .. } => {
                debug!(url = %url, "navigate");
                self.bounded(browser.navigate(url)).await?;
            }
            ActionSpec::Upload { selector, path, .. } => {
                debug!(selector = %selector, path = %path, "upload");
                self.bounded(browser.upload(selector, path)).await?;
            }
            ActionSpec::Wait { duration_ms } => {
                sleep(Duration::from_millis(*duration_ms)).await;
            }
            ActionSpec::Highlight {
                selector,
                duration_ms,
                ..
            } => {
                debug!(selector = %selector, duration_ms, "highlight");
                self.bounded(browser.highlight(selector, *duration_ms))
                    .await?;
            }
            ActionSpec::Scroll {
                selector,
                direction,
                pixels,
                ..
            } => {
                let target = match selector {
                    Some(selector) => ScrollTarget::Element(selector.clone()),
                    None => ScrollTarget::Page(*direction),
                };
                debug!(?target, pixels, "scroll");
                self.bounded(browser.scroll(&target, *pixels)).await?;
            }
            ActionSpec::Unsupported => {
                warn!("skipping action of unsupported kind");
                return Ok(Dispatch::Skipped);
            }
        }
        Ok(Dispatch::Performed)
    }

    async fn bounded(
        &self,
        call: impl Future<Output = Result<(), BrowserError>>,
    ) -> Result<(), BrowserError> {
        timeout(self.action_timeout, call)
            .await
            .unwrap_or(Err(BrowserError::Timeout(self.action_timeout)))
    }
}
