//! Observer interface for session events.

use uuid::Uuid;

use crate::action::ActionOutcome;
use crate::progress::ProgressSnapshot;
use crate::state::SessionState;

/// Receives notifications from a running session.
///
/// Delivery is fire-and-forget: calls are made synchronously from the
/// session's driver without holding any session lock, the engine does not
/// wait for acknowledgement, and implementations must not block. A
/// notification may be repeated; observers should treat snapshots as
/// idempotent.
pub trait SessionObserver: Send + Sync {
    /// The session moved to `state`.
    fn on_state_changed(&self, session_id: Uuid, state: SessionState);

    /// A fresh snapshot is available.
    fn on_progress(&self, snapshot: &ProgressSnapshot);

    /// A step finished with the given per-action outcomes.
    fn on_step_result(&self, session_id: Uuid, step_name: &str, outcomes: &[ActionOutcome]);

    /// Synthesized audio is ready to be played to the audience.
    fn on_audio(&self, _session_id: Uuid, _audio: &[u8]) {}
}
