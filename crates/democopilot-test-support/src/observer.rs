//! Test observer — records every notification a session emits.

use std::sync::Mutex;

use democopilot_core::action::ActionOutcome;
use democopilot_core::observer::SessionObserver;
use democopilot_core::progress::ProgressSnapshot;
use democopilot_core::state::SessionState;
use uuid::Uuid;

/// An observer that keeps every state change, snapshot and step result.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    states: Mutex<Vec<SessionState>>,
    snapshots: Mutex<Vec<ProgressSnapshot>>,
    step_results: Mutex<Vec<(String, Vec<ActionOutcome>)>>,
    audio: Mutex<Vec<Vec<u8>>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// States in the order they were reported.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn states(&self) -> Vec<SessionState> {
        self.states.lock().unwrap().clone()
    }

    /// Snapshots in the order they were reported.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn snapshots(&self) -> Vec<ProgressSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    /// Step names and outcomes in the order the steps finished.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn step_results(&self) -> Vec<(String, Vec<ActionOutcome>)> {
        self.step_results.lock().unwrap().clone()
    }

    /// Audio payloads in the order they were delivered.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn audio(&self) -> Vec<Vec<u8>> {
        self.audio.lock().unwrap().clone()
    }

    /// Names of the executed steps, in order.
    pub fn executed_steps(&self) -> Vec<String> {
        self.step_results()
            .into_iter()
            .map(|(name, _)| name)
            .collect()
    }
}

impl SessionObserver for RecordingObserver {
    fn on_state_changed(&self, _session_id: Uuid, state: SessionState) {
        self.states.lock().unwrap().push(state);
    }

    fn on_progress(&self, snapshot: &ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn on_step_result(&self, _session_id: Uuid, step_name: &str, outcomes: &[ActionOutcome]) {
        self.step_results
            .lock()
            .unwrap()
            .push((step_name.to_owned(), outcomes.to_vec()));
    }

    fn on_audio(&self, _session_id: Uuid, audio: &[u8]) {
        self.audio.lock().unwrap().push(audio.to_vec());
    }
}
