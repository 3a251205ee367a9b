//! Speech-synthesis collaborator port.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a speech collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpeechError {
    /// The backend could not be reached.
    #[error("speech backend unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected or failed the request.
    #[error("speech synthesis failed: {0}")]
    Synthesis(String),
}

/// Audio produced for one piece of text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechOutput {
    /// Encoded audio. Empty when the backend is silent.
    pub audio: Vec<u8>,
    /// Playback duration reported by the backend.
    pub duration: Duration,
}

impl SpeechOutput {
    /// An empty, zero-duration output.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Returns `true` if there is nothing to play.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        self.audio.is_empty() && self.duration.is_zero()
    }
}

/// Turns text into spoken audio.
///
/// Implementations should return [`SpeechOutput::silent`] rather than an
/// error when the backend is known to be absent, so the walkthrough can
/// always run without narration.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Identity of the voice, used as part of the narration cache key.
    fn voice_id(&self) -> &str;

    /// Returns `false` when narration is known to be unavailable up front.
    fn is_available(&self) -> bool {
        true
    }

    /// Synthesizes `text`. The engine forwards the audio to observers and
    /// holds for the reported duration while it plays.
    async fn speak(&self, text: &str) -> Result<SpeechOutput, SpeechError>;
}
