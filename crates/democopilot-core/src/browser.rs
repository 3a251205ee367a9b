//! Browser-automation collaborator port.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::action::ScrollTarget;

/// Errors reported by a browser-automation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowserError {
    /// The selector matched nothing on the page.
    #[error("element not found: {0}")]
    ElementNotFound(String),

    /// The operation ran but did not succeed.
    #[error("action failed: {0}")]
    ActionFailed(String),

    /// The operation did not finish within its bound.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The automation session itself is gone (browser crashed, page closed).
    #[error("browser session lost: {0}")]
    SessionLost(String),
}

impl BrowserError {
    /// Returns `true` if the browser can no longer be used at all.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SessionLost(_))
    }
}

/// Drives a browser on behalf of one demo session.
///
/// Selectors, URLs and paths are opaque strings owned by the script author.
#[async_trait]
pub trait BrowserAutomation: Send + Sync {
    /// Brings the browser up. Any error here is fatal for the session.
    async fn launch(&self) -> Result<(), BrowserError>;

    /// Clicks the element matching `selector`.
    async fn click(&self, selector: &str) -> Result<(), BrowserError>;

    /// Fills `text` into the element matching `selector`.
    async fn type_text(&self, selector: &str, text: &str) -> Result<(), BrowserError>;

    /// Loads `url` and waits for it to settle.
    async fn navigate(&self, url: &str) -> Result<(), BrowserError>;

    /// Attaches the file at `path` to the file input matching `selector`.
    async fn upload(&self, selector: &str, path: &str) -> Result<(), BrowserError>;

    /// Scrolls an element into view or the page by `pixels`.
    async fn scroll(&self, target: &ScrollTarget, pixels: u32) -> Result<(), BrowserError>;

    /// Outlines the element matching `selector` for `duration_ms`.
    async fn highlight(&self, selector: &str, duration_ms: u64) -> Result<(), BrowserError>;

    /// Releases the browser. Must be safe to call more than once.
    async fn shutdown(&self);
}
