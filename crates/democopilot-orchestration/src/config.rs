//! Engine tuning parameters.

use std::time::Duration;

/// Timing and pacing parameters shared by every session of a coordinator.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Speaking rate used to estimate narration length.
    pub words_per_minute: u32,
    /// Share of the estimated narration spread across a step's actions.
    pub pacing_fraction: f64,
    /// Share of the estimated narration waited before the first action.
    pub lead_fraction: f64,
    /// Upper bound on the lead delay.
    pub max_lead_delay: Duration,
    /// Bound on launching the browser.
    pub launch_timeout: Duration,
    /// Bound on a single browser action.
    pub action_timeout: Duration,
    /// Bound on synthesizing one piece of narration.
    pub narration_timeout: Duration,
    /// Bound on drafting one answer.
    pub question_timeout: Duration,
    /// Bound on releasing collaborators when a session stops.
    pub shutdown_timeout: Duration,
    /// Number of earlier exchanges sent with each question.
    pub question_history_limit: usize,
    /// Spoken before the first step after a resume. Blank disables it.
    pub resume_cue: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150,
            pacing_fraction: 0.8,
            lead_fraction: 0.1,
            max_lead_delay: Duration::from_secs(2),
            launch_timeout: Duration::from_secs(60),
            action_timeout: Duration::from_secs(30),
            narration_timeout: Duration::from_secs(30),
            question_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(10),
            question_history_limit: 10,
            resume_cue: "Let's continue with the demonstration.".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Estimates how long `text` takes to speak at the configured rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn estimate_narration(&self, text: &str) -> Duration {
        let words = text.split_whitespace().count();
        if words == 0 || self.words_per_minute == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(words as f64 * 60.0 / f64::from(self.words_per_minute))
    }

    /// Delay before the first action of a narrated step.
    #[must_use]
    pub fn lead_delay(&self, estimated: Duration) -> Duration {
        estimated
            .mul_f64(self.lead_fraction.clamp(0.0, 1.0))
            .min(self.max_lead_delay)
    }

    /// Total time spread across a narrated step's actions.
    #[must_use]
    pub fn pacing_budget(&self, estimated: Duration) -> Duration {
        estimated.mul_f64(self.pacing_fraction.clamp(0.0, 1.0))
    }
}
