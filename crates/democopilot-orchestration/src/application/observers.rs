//! Fan-out of session notifications.

use std::sync::Arc;

use democopilot_core::action::ActionOutcome;
use democopilot_core::observer::SessionObserver;
use democopilot_core::progress::ProgressSnapshot;
use democopilot_core::state::SessionState;
use uuid::Uuid;

/// The observers registered for one session.
#[derive(Clone)]
pub struct ObserverSet {
    session_id: Uuid,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl ObserverSet {
    /// Creates an empty set for `session_id`.
    #[must_use]
    pub fn new(session_id: Uuid) -> Self {
        Self {
            session_id,
            observers: Vec::new(),
        }
    }

    /// Registers another observer.
    pub fn push(&mut self, observer: Arc<dyn SessionObserver>) {
        self.observers.push(observer);
    }

    /// Number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    /// Returns `true` if nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub(crate) fn state_changed(&self, state: SessionState) {
        for observer in &self.observers {
            observer.on_state_changed(self.session_id, state);
        }
    }

    pub(crate) fn progress(&self, snapshot: &ProgressSnapshot) {
        for observer in &self.observers {
            observer.on_progress(snapshot);
        }
    }

    pub(crate) fn step_result(&self, step_name: &str, outcomes: &[ActionOutcome]) {
        for observer in &self.observers {
            observer.on_step_result(self.session_id, step_name, outcomes);
        }
    }

    pub(crate) fn audio(&self, audio: &[u8]) {
        if audio.is_empty() {
            return;
        }
        for observer in &self.observers {
            observer.on_audio(self.session_id, audio);
        }
    }
}

impl std::fmt::Debug for ObserverSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverSet")
            .field("session_id", &self.session_id)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use democopilot_test_support::RecordingObserver;

    use super::*;

    #[test]
    fn test_notifications_reach_every_observer() {
        // Arrange
        let first = Arc::new(RecordingObserver::new());
        let second = Arc::new(RecordingObserver::new());
        let mut set = ObserverSet::new(Uuid::new_v4());
        set.push(first.clone());
        set.push(second.clone());

        // Act
        set.state_changed(SessionState::Running);
        set.step_result("intro", &[]);

        // Assert
        assert_eq!(set.len(), 2);
        assert_eq!(first.states(), vec![SessionState::Running]);
        assert_eq!(second.states(), vec![SessionState::Running]);
        assert_eq!(second.executed_steps(), vec!["intro".to_owned()]);
    }

    #[test]
    fn test_empty_audio_is_not_forwarded() {
        let observer = Arc::new(RecordingObserver::new());
        let mut set = ObserverSet::new(Uuid::new_v4());
        set.push(observer.clone());

        set.audio(&[]);
        set.audio(b"pcm");

        assert_eq!(observer.audio(), vec![b"pcm".to_vec()]);
    }
}
