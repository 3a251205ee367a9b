//! Pause gate checked at every action boundary.

use tokio::sync::watch;

/// A latch that is open while the session may proceed.
///
/// Closing the gate never interrupts work already in flight; it only holds
/// the next caller of [`PauseGate::wait_open`].
#[derive(Debug)]
pub struct PauseGate {
    closed: watch::Sender<bool>,
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseGate {
    /// Creates an open gate.
    #[must_use]
    pub fn new() -> Self {
        let (closed, _) = watch::channel(false);
        Self { closed }
    }

    /// Holds subsequent boundaries.
    pub fn close(&self) {
        self.closed.send_replace(true);
    }

    /// Releases every waiter.
    pub fn open(&self) {
        self.closed.send_replace(false);
    }

    /// Returns `true` if boundaries pass without waiting.
    #[must_use]
    pub fn is_open(&self) -> bool {
        !*self.closed.borrow()
    }

    /// Waits until the gate is open.
    pub async fn wait_open(&self) {
        let mut rx = self.closed.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|closed| !*closed).await;
    }
}
