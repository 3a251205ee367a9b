//! Progress snapshots derived from a session.

use democopilot_core::clock::Clock;
use democopilot_core::progress::{ProgressSnapshot, StepSummary};
use democopilot_core::state::SessionState;

use crate::domain::session::DemoSession;

/// Builds read-only snapshots. Never mutates the session.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressReporter;

impl ProgressReporter {
    /// Completion percentage in `[0, 100]`.
    ///
    /// Counts steps through the highest one completed, so a backward jump
    /// never lowers it. A completed session is always at 100.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn percent_complete(session: &DemoSession, total_steps: usize) -> f64 {
        if session.state() == SessionState::Completed {
            return 100.0;
        }
        if total_steps == 0 {
            return 0.0;
        }
        session.completed_through().map_or(0.0, |index| {
            ((index + 1) as f64 / total_steps as f64 * 100.0).min(100.0)
        })
    }

    /// Snapshot of `session` as of `clock`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn snapshot(
        session: &DemoSession,
        total_steps: usize,
        last_step: Option<&StepSummary>,
        clock: &dyn Clock,
    ) -> ProgressSnapshot {
        ProgressSnapshot {
            session_id: session.id,
            state: session.state(),
            step_number: session.step_cursor().map(|index| index + 1),
            step_name: session.current_step().map(str::to_owned),
            total_steps,
            percent_complete: Self::percent_complete(session, total_steps),
            elapsed_active_seconds: session.elapsed_active(clock).num_milliseconds() as f64
                / 1000.0,
            questions_answered: session.questions_answered(),
            pauses_taken: session.pauses_taken(),
            customer_name: session.customer().name.clone(),
            last_step: last_step.cloned(),
            last_error: session.last_error().map(str::to_owned),
        }
    }
}
