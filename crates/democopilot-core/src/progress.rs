//! Read-only progress projection.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::SessionState;

/// Short summary of the most recently completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Step name.
    pub name: String,
    /// Number of actions in the step.
    pub actions: usize,
    /// Number of actions that failed.
    pub failures: usize,
    /// Narration drift (measured − estimated) in milliseconds.
    pub drift_ms: i64,
}

/// Point-in-time view of a session for external observers.
///
/// Regenerated on demand and never used as the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Session identifier.
    pub session_id: Uuid,
    /// Lifecycle state.
    pub state: SessionState,
    /// 1-based number of the current step, if one has started.
    pub step_number: Option<usize>,
    /// Name of the current step, if one has started.
    pub step_name: Option<String>,
    /// Number of steps in the script.
    pub total_steps: usize,
    /// Completion percentage in `[0, 100]`.
    pub percent_complete: f64,
    /// Wall-clock seconds since start, excluding paused time.
    pub elapsed_active_seconds: f64,
    /// Questions answered so far.
    pub questions_answered: u32,
    /// Pauses taken so far.
    pub pauses_taken: u32,
    /// Customer name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Summary of the most recently completed step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_step: Option<StepSummary>,
    /// Fatal error retained from a failed session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
