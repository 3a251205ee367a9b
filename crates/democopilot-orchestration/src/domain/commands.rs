//! Control commands accepted by a running session.

use serde::{Deserialize, Serialize};

/// An out-of-band instruction from the presenter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlCommand {
    /// Freeze at the next action boundary.
    Pause,
    /// Continue after a pause.
    Resume,
    /// Continue from the named step once the current one finishes.
    Skip {
        /// Target step name.
        section: String,
    },
    /// End the session and release its collaborators.
    Stop,
}

impl ControlCommand {
    /// Command name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Skip { .. } => "skip",
            Self::Stop => "stop",
        }
    }
}
