//! Fan-out of session events to HTTP listeners.

use democopilot_core::action::ActionOutcome;
use democopilot_core::observer::SessionObserver;
use democopilot_core::progress::ProgressSnapshot;
use democopilot_core::state::SessionState;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Buffered events per listener before the slowest one starts lagging.
pub const EVENT_BUFFER: usize = 256;

/// An event published to `/api/v1/events` subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DemoEvent {
    /// A session changed state.
    StateChanged {
        /// Session id.
        session_id: Uuid,
        /// New state.
        state: SessionState,
    },
    /// Fresh progress for a session.
    Progress(ProgressSnapshot),
    /// A step finished.
    StepCompleted {
        /// Session id.
        session_id: Uuid,
        /// Step name.
        step_name: String,
        /// Per-action outcomes in order.
        outcomes: Vec<ActionOutcome>,
    },
    /// Audio was produced. Only its size is published.
    Audio {
        /// Session id.
        session_id: Uuid,
        /// Audio length in bytes.
        bytes: usize,
    },
}

impl DemoEvent {
    /// SSE event name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::Progress(_) => "progress",
            Self::StepCompleted { .. } => "step_completed",
            Self::Audio { .. } => "audio",
        }
    }

    /// Session the event belongs to.
    #[must_use]
    pub fn session_id(&self) -> Uuid {
        match self {
            Self::StateChanged { session_id, .. }
            | Self::StepCompleted { session_id, .. }
            | Self::Audio { session_id, .. } => *session_id,
            Self::Progress(snapshot) => snapshot.session_id,
        }
    }
}

/// Observer that republishes every notification on a broadcast channel.
///
/// Sends never block. With no subscribers the event is dropped.
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    sender: broadcast::Sender<DemoEvent>,
}

impl BroadcastObserver {
    /// Wraps `sender`.
    #[must_use]
    pub fn new(sender: broadcast::Sender<DemoEvent>) -> Self {
        Self { sender }
    }

    fn publish(&self, event: DemoEvent) {
        // Err only means nobody is listening.
        let _ = self.sender.send(event);
    }
}

impl SessionObserver for BroadcastObserver {
    fn on_state_changed(&self, session_id: Uuid, state: SessionState) {
        self.publish(DemoEvent::StateChanged { session_id, state });
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.publish(DemoEvent::Progress(snapshot.clone()));
    }

    fn on_step_result(&self, session_id: Uuid, step_name: &str, outcomes: &[ActionOutcome]) {
        self.publish(DemoEvent::StepCompleted {
            session_id,
            step_name: step_name.to_string(),
            outcomes: outcomes.to_vec(),
        });
    }

    fn on_audio(&self, session_id: Uuid, audio: &[u8]) {
        self.publish(DemoEvent::Audio {
            session_id,
            bytes: audio.len(),
        });
    }
}
