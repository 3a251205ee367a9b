//! UI actions and their per-action outcomes.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Page scroll direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    /// Towards the top of the page.
    Up,
    /// Towards the bottom of the page.
    #[default]
    Down,
}

/// What a scroll action moves: a specific element or the whole page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollTarget {
    /// Scroll the element matching the selector into view.
    Element(String),
    /// Scroll the page in the given direction.
    Page(ScrollDirection),
}

fn default_scroll_pixels() -> u32 {
    500
}

fn default_highlight_ms() -> u64 {
    1000
}

/// One UI operation within a step.
///
/// The set of kinds is closed. A script entry with an unknown `kind`
/// deserializes into [`ActionSpec::Unsupported`], which the pacer skips.
/// Every variant except `Wait` accepts an optional `delay_ms` that replaces
/// the action's share of the step's pacing budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Click an element.
    Click {
        /// CSS selector of the element.
        selector: String,
        /// Label used in logs.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Explicit pacing allotment in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// Fill text into an input.
    TypeText {
        /// CSS selector of the input.
        selector: String,
        /// Text to enter.
        text: String,
        /// Explicit pacing allotment in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// Load a URL.
    Navigate {
        /// Target URL.
        url: String,
        /// Explicit pacing allotment in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// Attach a file to a file input.
    Upload {
        /// CSS selector of the file input.
        selector: String,
        /// Path of the file to upload.
        path: String,
        /// Explicit pacing allotment in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// Hold for a fixed duration. The duration is never shortened by pacing.
    Wait {
        /// How long to hold, in milliseconds.
        duration_ms: u64,
    },
    /// Outline an element for a while.
    Highlight {
        /// CSS selector of the element.
        selector: String,
        /// How long the highlight stays visible, in milliseconds.
        #[serde(default = "default_highlight_ms")]
        duration_ms: u64,
        /// Explicit pacing allotment in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// Scroll an element into view, or the page by a number of pixels.
    Scroll {
        /// Element to scroll to. Takes precedence over `direction`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selector: Option<String>,
        /// Page scroll direction when no selector is given.
        #[serde(default)]
        direction: ScrollDirection,
        /// Distance in pixels for page scrolls.
        #[serde(default = "default_scroll_pixels")]
        pixels: u32,
        /// Explicit pacing allotment in milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delay_ms: Option<u64>,
    },
    /// An action kind this engine does not know.
    #[serde(other)]
    Unsupported,
}

impl ActionSpec {
    /// Returns the kind name used in scripts and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::TypeText { .. } => "type_text",
            Self::Navigate { .. } => "navigate",
            Self::Upload { .. } => "upload",
            Self::Wait { .. } => "wait",
            Self::Highlight { .. } => "highlight",
            Self::Scroll { .. } => "scroll",
            Self::Unsupported => "unsupported",
        }
    }

    /// Returns the explicit pacing allotment, if the script set one.
    ///
    /// For `Wait` this is the wait duration itself.
    #[must_use]
    pub fn explicit_delay(&self) -> Option<Duration> {
        match self {
            Self::Wait { duration_ms } => Some(Duration::from_millis(*duration_ms)),
            Self::Click { delay_ms, .. }
            | Self::TypeText { delay_ms, .. }
            | Self::Navigate { delay_ms, .. }
            | Self::Upload { delay_ms, .. }
            | Self::Highlight { delay_ms, .. }
            | Self::Scroll { delay_ms, .. } => delay_ms.map(Duration::from_millis),
            Self::Unsupported => None,
        }
    }
}

/// Result of a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// The collaborator reported success.
    Succeeded,
    /// The collaborator reported a failure or timed out.
    Failed,
    /// The action was not dispatched (unsupported kind).
    Skipped,
}

/// Outcome of one action within a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Position of the action within its step.
    pub index: usize,
    /// Action kind name.
    pub kind: String,
    /// Whether the action succeeded.
    pub status: ActionStatus,
    /// Failure detail, present only when `status` is `Failed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution time, excluding pacing sleep.
    pub elapsed_ms: u64,
}

impl ActionOutcome {
    /// Outcome of a successful action.
    #[must_use]
    pub fn succeeded(index: usize, kind: &str, elapsed: Duration) -> Self {
        Self::new(index, kind, ActionStatus::Succeeded, None, elapsed)
    }

    /// Outcome of a failed action.
    #[must_use]
    pub fn failed(index: usize, kind: &str, error: impl Into<String>, elapsed: Duration) -> Self {
        Self::new(index, kind, ActionStatus::Failed, Some(error.into()), elapsed)
    }

    /// Outcome of an action that was not dispatched.
    #[must_use]
    pub fn skipped(index: usize, kind: &str) -> Self {
        Self::new(index, kind, ActionStatus::Skipped, None, Duration::ZERO)
    }

    /// Returns `true` if the action failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status == ActionStatus::Failed
    }

    fn new(
        index: usize,
        kind: &str,
        status: ActionStatus,
        error: Option<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            index,
            kind: kind.to_owned(),
            status,
            error,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_tagged_actions_with_defaults() {
        // Arrange
        let yaml = r##"
- kind: click
  selector: "#login"
- kind: scroll
- kind: highlight
  selector: ".card"
  delay_ms: 300
"##;

        // Act
        let actions: Vec<ActionSpec> = serde_yaml::from_str(yaml).unwrap();

        // Assert
        assert_eq!(
            actions[0],
            ActionSpec::Click {
                selector: "#login".to_owned(),
                description: None,
                delay_ms: None,
            }
        );
        assert_eq!(
            actions[1],
            ActionSpec::Scroll {
                selector: None,
                direction: ScrollDirection::Down,
                pixels: 500,
                delay_ms: None,
            }
        );
        assert_eq!(actions[2].explicit_delay(), Some(Duration::from_millis(300)));
    }

    #[test]
    fn test_unknown_kind_deserializes_as_unsupported() {
        let action: ActionSpec =
            serde_json::from_value(serde_json::json!({ "kind": "hover", "selector": "#x" }))
                .unwrap();

        assert_eq!(action, ActionSpec::Unsupported);
        assert_eq!(action.kind(), "unsupported");
    }

    #[test]
    fn test_wait_duration_is_its_explicit_delay() {
        let action = ActionSpec::Wait { duration_ms: 1500 };

        assert_eq!(action.explicit_delay(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_failed_outcome_carries_error_detail() {
        let outcome = ActionOutcome::failed(2, "click", "element not found", Duration::from_millis(40));

        assert!(outcome.is_failure());
        assert_eq!(outcome.error.as_deref(), Some("element not found"));
        assert_eq!(outcome.elapsed_ms, 40);
    }
}
