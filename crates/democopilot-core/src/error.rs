//! Domain error types.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::state::SessionState;

/// External systems the engine depends on but does not implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    /// Browser automation.
    Browser,
    /// Speech synthesis.
    Speech,
    /// Language model used for question answering.
    LanguageModel,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Browser => "browser",
            Self::Speech => "speech",
            Self::LanguageModel => "language_model",
        };
        f.write_str(name)
    }
}

/// An unrecoverable collaborator failure. Drives a session to `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{collaborator} collaborator is unusable: {message}")]
pub struct FatalCollaboratorFailure {
    /// Which collaborator failed.
    pub collaborator: Collaborator,
    /// Human-readable cause.
    pub message: String,
}

impl FatalCollaboratorFailure {
    /// Creates a fatal browser failure.
    #[must_use]
    pub fn browser(message: impl Into<String>) -> Self {
        Self {
            collaborator: Collaborator::Browser,
            message: message.into(),
        }
    }
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No session is registered under the given id.
    #[error("session not found: {0}")]
    SessionNotFound(Uuid),

    /// A control operation was called in a state that does not allow it.
    #[error("cannot {operation} while session is {state}")]
    InvalidTransition {
        /// The rejected operation.
        operation: &'static str,
        /// The state the session was in.
        state: SessionState,
    },

    /// A jump named a step that does not exist in the script.
    #[error("step not found: {0}")]
    StepNotFound(String),

    /// A validation error in domain input (scripts, requests).
    #[error("validation error: {0}")]
    Validation(String),

    /// A collaborator became unusable and the session was halted.
    #[error(transparent)]
    FatalCollaborator(#[from] FatalCollaboratorFailure),

    /// An infrastructure error (I/O, task join).
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}
