//! Test browser — a `BrowserAutomation` that records every call.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use democopilot_core::action::ScrollTarget;
use democopilot_core::browser::{BrowserAutomation, BrowserError};

/// A call received by [`RecordingBrowser`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserCall {
    /// `launch()`
    Launch,
    /// `click(selector)`
    Click(String),
    /// `type_text(selector, text)`
    TypeText(String, String),
    /// `navigate(url)`
    Navigate(String),
    /// `upload(selector, path)`
    Upload(String, String),
    /// `scroll(target, pixels)`
    Scroll(ScrollTarget, u32),
    /// `highlight(selector, duration_ms)`
    Highlight(String, u64),
    /// `shutdown()`
    Shutdown,
}

impl BrowserCall {
    /// Returns `true` for calls made on behalf of a script action.
    #[must_use]
    pub fn is_action(&self) -> bool {
        !matches!(self, Self::Launch | Self::Shutdown)
    }
}

/// A browser that records calls and returns configured results.
///
/// Failures and extra latency are keyed by selector (or URL for
/// `navigate`). Every action call also sleeps for the base latency, which
/// works with tokio's paused test clock.
#[derive(Debug, Default)]
pub struct RecordingBrowser {
    calls: Mutex<Vec<BrowserCall>>,
    failures: HashMap<String, BrowserError>,
    slow: HashMap<String, Duration>,
    latency: Duration,
    launch_error: Option<BrowserError>,
}

impl RecordingBrowser {
    /// Creates a browser where every call succeeds instantly.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every action call take `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes calls on `target` return `error`.
    #[must_use]
    pub fn failing_on(mut self, target: &str, error: BrowserError) -> Self {
        self.failures.insert(target.to_owned(), error);
        self
    }

    /// Makes calls on `target` take `duration` instead of the base latency.
    #[must_use]
    pub fn slow_on(mut self, target: &str, duration: Duration) -> Self {
        self.slow.insert(target.to_owned(), duration);
        self
    }

    /// Makes `launch()` return `error`.
    #[must_use]
    pub fn failing_launch(mut self, error: BrowserError) -> Self {
        self.launch_error = Some(error);
        self
    }

    /// Returns every call received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<BrowserCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns only the calls made for script actions.
    pub fn action_calls(&self) -> Vec<BrowserCall> {
        self.calls().into_iter().filter(BrowserCall::is_action).collect()
    }

    /// Number of `shutdown()` calls received.
    pub fn shutdown_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == BrowserCall::Shutdown)
            .count()
    }

    async fn perform(&self, call: BrowserCall, target: &str) -> Result<(), BrowserError> {
        self.calls.lock().unwrap().push(call);
        let delay = self.slow.get(target).copied().unwrap_or(self.latency);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match self.failures.get(target) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BrowserAutomation for RecordingBrowser {
    async fn launch(&self) -> Result<(), BrowserError> {
        self.calls.lock().unwrap().push(BrowserCall::Launch);
        match &self.launch_error {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.perform(BrowserCall::Click(selector.to_owned()), selector)
            .await
    }

    async fn type_text(&self, selector: &str, text: &str) -> Result<(), BrowserError> {
        self.perform(
            BrowserCall::TypeText(selector.to_owned(), text.to_owned()),
            selector,
        )
        .await
    }

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.perform(BrowserCall::Navigate(url.to_owned()), url).await
    }

    async fn upload(&self, selector: &str, path: &str) -> Result<(), BrowserError> {
        self.perform(
            BrowserCall::Upload(selector.to_owned(), path.to_owned()),
            selector,
        )
        .await
    }

    async fn scroll(&self, target: &ScrollTarget, pixels: u32) -> Result<(), BrowserError> {
        let key = match target {
            ScrollTarget::Element(selector) => selector.as_str(),
            ScrollTarget::Page(_) => "",
        };
        self.perform(BrowserCall::Scroll(target.clone(), pixels), key)
            .await
    }

    async fn highlight(&self, selector: &str, duration_ms: u64) -> Result<(), BrowserError> {
        self.perform(
            BrowserCall::Highlight(selector.to_owned(), duration_ms),
            selector,
        )
        .await
    }

    async fn shutdown(&self) {
        self.calls.lock().unwrap().push(BrowserCall::Shutdown);
    }
}
