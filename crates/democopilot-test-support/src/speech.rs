//! Test speech — `SpeechSynthesizer` implementations for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use democopilot_core::speech::{SpeechError, SpeechOutput, SpeechSynthesizer};

/// A synthesizer that returns a scripted duration for every text and
/// records what it was asked to say.
///
/// The duration is `per_word × word count` plus `fixed`. The call itself
/// returns after `latency`.
#[derive(Debug, Default)]
pub struct ScriptedSpeech {
    per_word: Duration,
    fixed: Duration,
    latency: Duration,
    spoken: Mutex<Vec<String>>,
}

impl ScriptedSpeech {
    /// Reports `duration` for every text.
    #[must_use]
    pub fn fixed(duration: Duration) -> Self {
        Self {
            fixed: duration,
            ..Self::default()
        }
    }

    /// Reports `per_word` for each whitespace-separated word.
    #[must_use]
    pub fn per_word(per_word: Duration) -> Self {
        Self {
            per_word,
            ..Self::default()
        }
    }

    /// Makes each `speak` call take `latency` before returning.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Returns every text spoken so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for ScriptedSpeech {
    fn voice_id(&self) -> &str {
        "scripted"
    }

    async fn speak(&self, text: &str) -> Result<SpeechOutput, SpeechError> {
        self.spoken.lock().unwrap().push(text.to_owned());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let words = u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX);
        Ok(SpeechOutput {
            audio: text.as_bytes().to_vec(),
            duration: self.fixed + self.per_word * words,
        })
    }
}

/// A synthesizer that reports itself unavailable and returns silence.
#[derive(Debug, Default)]
pub struct SilentSpeech {
    calls: Mutex<usize>,
}

impl SilentSpeech {
    /// Number of `speak` calls received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SpeechSynthesizer for SilentSpeech {
    fn voice_id(&self) -> &str {
        "silent"
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn speak(&self, _text: &str) -> Result<SpeechOutput, SpeechError> {
        *self.calls.lock().unwrap() += 1;
        Ok(SpeechOutput::silent())
    }
}

/// A synthesizer that claims to be available but fails every request.
#[derive(Debug, Default)]
pub struct FailingSpeech;

#[async_trait]
impl SpeechSynthesizer for FailingSpeech {
    fn voice_id(&self) -> &str {
        "failing"
    }

    async fn speak(&self, _text: &str) -> Result<SpeechOutput, SpeechError> {
        Err(SpeechError::Unavailable("connection refused".into()))
    }
}

/// A synthesizer that claims to be available but returns an empty,
/// zero-length output for every text.
#[derive(Debug, Default)]
pub struct MutedSpeech {
    calls: Mutex<usize>,
}

impl MutedSpeech {
    /// Number of `speak` calls received.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SpeechSynthesizer for MutedSpeech {
    fn voice_id(&self) -> &str {
        "muted"
    }

    async fn speak(&self, _text: &str) -> Result<SpeechOutput, SpeechError> {
        *self.calls.lock().unwrap() += 1;
        Ok(SpeechOutput::silent())
    }
}
