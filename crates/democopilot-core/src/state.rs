//! Session lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a demo session.
///
/// `Idle → Starting → Running ⇄ Paused`, `Running ⇄ AnsweringQuestion`,
/// `Running → Completed`, `Running | Starting → Failed`. A stop from any
/// non-terminal state returns the session to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Created (or stopped); no step is executing.
    Idle,
    /// Collaborators are being brought up.
    Starting,
    /// Steps are being executed.
    Running,
    /// Execution is held at the next action or step boundary.
    Paused,
    /// A question is queued or being answered.
    AnsweringQuestion,
    /// The script ran to the end.
    Completed,
    /// A fatal collaborator failure halted the session.
    Failed,
}

impl SessionState {
    /// Returns `true` for states from which no further step will execute.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns the wire name of the state.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::AnsweringQuestion => "answering_question",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
