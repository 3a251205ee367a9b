//! Narration and step results.

use std::time::Duration;

use democopilot_core::action::ActionOutcome;
use democopilot_core::progress::StepSummary;
use democopilot_core::speech::SpeechOutput;

/// What the narration unit produced for one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationResult {
    /// The narrated text.
    pub text: String,
    /// Encoded audio. Empty when narration was unavailable.
    pub audio: Vec<u8>,
    /// Duration estimated from the word count.
    pub estimated: Duration,
    /// Duration reported by the speech backend.
    pub measured: Duration,
    /// `false` when the step ran without narration.
    pub available: bool,
}

impl NarrationResult {
    /// A result for a step that ran silently.
    #[must_use]
    pub fn silent(text: &str, estimated: Duration) -> Self {
        Self {
            text: text.to_owned(),
            audio: Vec::new(),
            estimated,
            measured: Duration::ZERO,
            available: false,
        }
    }

    /// A result for narration that was synthesized and played.
    #[must_use]
    pub fn spoken(text: &str, output: SpeechOutput, estimated: Duration) -> Self {
        Self {
            text: text.to_owned(),
            audio: output.audio,
            estimated,
            measured: output.duration,
            available: true,
        }
    }

    /// Measured minus estimated duration, in milliseconds. Zero when silent.
    #[must_use]
    pub fn drift_ms(&self) -> i64 {
        if !self.available {
            return 0;
        }
        millis(self.measured) - millis(self.estimated)
    }
}

fn millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Everything a finished step produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResult {
    /// Step name.
    pub step_name: String,
    /// Zero-based position in the script.
    pub position: usize,
    /// Narration outcome.
    pub narration: NarrationResult,
    /// One outcome per action, in order.
    pub outcomes: Vec<ActionOutcome>,
    /// Narration drift in milliseconds. Informational only.
    pub drift_ms: i64,
}

impl StepResult {
    /// Number of actions that failed.
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Compact summary for progress snapshots.
    #[must_use]
    pub fn summary(&self) -> StepSummary {
        StepSummary {
            name: self.step_name.clone(),
            actions: self.outcomes.len(),
            failures: self.failures(),
            drift_ms: self.drift_ms,
        }
    }
}
