//! Rehearsal collaborators.
//!
//! The server ships without real browser, speech or language model
//! backends. These stand-ins let a script author dry-run a walkthrough's
//! pacing: actions are logged and take a fixed latency, narration takes as
//! long as it would to speak, and every question gets the fallback answer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use democopilot_core::action::ScrollTarget;
use democopilot_core::browser::{BrowserAutomation, BrowserError};
use democopilot_core::language_model::{LanguageModel, LanguageModelError, QuestionContext};
use democopilot_core::provider::CollaboratorProvider;
use democopilot_core::speech::{SpeechError, SpeechOutput, SpeechSynthesizer};
use democopilot_orchestration::config::EngineConfig;
use tracing::info;
use uuid::Uuid;

/// Browser that logs each action and waits a fixed latency.
#[derive(Debug, Clone)]
pub struct RehearsalBrowser {
    session_id: Uuid,
    latency: Duration,
}

impl RehearsalBrowser {
    /// Creates a browser for one session.
    #[must_use]
    pub fn new(session_id: Uuid, latency: Duration) -> Self {
        Self {
            session_id,
            latency,
        }
    }

    async fn act(&self, action: &'static str, target: &str) -> Result<(), BrowserError> {
        info!(session_id = %self.session_id, action, element = target, "rehearsal browser action");
        tokio::time::sleep(self.latency).await;
        Ok(())
    }
}

#[async_trait]
impl BrowserAutomation for RehearsalBrowser {
    async fn launch(&self) -> Result<(), BrowserError> {
        info!(session_id = %self.session_id, "rehearsal browser launched");
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<(), BrowserError> {
        self.act("click", selector).await
    }

    async fn type_text(&self, selector: &str, _text: &str) -> Result<(), BrowserError> {
        self.act("type_text", selector).await
    }

    async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.act("navigate", url).await
    }

    async fn upload(&self, selector: &str, _path: &str) -> Result<(), BrowserError> {
        self.act("upload", selector).await
    }

    async fn scroll(&self, target: &ScrollTarget, _pixels: u32) -> Result<(), BrowserError> {
        match target {
            ScrollTarget::Element(selector) => self.act("scroll", selector).await,
            ScrollTarget::Page(_) => self.act("scroll", "page").await,
        }
    }

    async fn highlight(&self, selector: &str, _duration_ms: u64) -> Result<(), BrowserError> {
        self.act("highlight", selector).await
    }

    async fn shutdown(&self) {
        info!(session_id = %self.session_id, "rehearsal browser closed");
    }
}

/// Synthesizer that produces no audio but takes as long as the text would
/// to speak.
#[derive(Debug, Clone)]
pub struct RehearsalSpeech {
    voice_id: String,
    engine: EngineConfig,
}

impl RehearsalSpeech {
    /// Creates a synthesizer for `voice_id` timed with `engine`'s speaking rate.
    #[must_use]
    pub fn new(voice_id: impl Into<String>, engine: EngineConfig) -> Self {
        Self {
            voice_id: voice_id.into(),
            engine,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for RehearsalSpeech {
    fn voice_id(&self) -> &str {
        &self.voice_id
    }

    async fn speak(&self, text: &str) -> Result<SpeechOutput, SpeechError> {
        Ok(SpeechOutput {
            audio: Vec::new(),
            duration: self.engine.estimate_narration(text),
        })
    }
}

/// Language model placeholder. Always unavailable.
#[derive(Debug, Clone, Copy, Default)]
pub struct RehearsalLanguageModel;

#[async_trait]
impl LanguageModel for RehearsalLanguageModel {
    async fn answer_question(
        &self,
        _question: &str,
        _context: &QuestionContext,
    ) -> Result<String, LanguageModelError> {
        Err(LanguageModelError::Unavailable(
            "no language model in rehearsal mode".to_string(),
        ))
    }
}

/// Hands out rehearsal collaborators.
#[derive(Debug, Clone)]
pub struct RehearsalProvider {
    action_latency: Duration,
    engine: EngineConfig,
}

impl RehearsalProvider {
    /// Creates a provider.
    #[must_use]
    pub fn new(action_latency: Duration, engine: EngineConfig) -> Self {
        Self {
            action_latency,
            engine,
        }
    }
}

impl CollaboratorProvider for RehearsalProvider {
    fn browser(&self, session_id: Uuid) -> Arc<dyn BrowserAutomation> {
        Arc::new(RehearsalBrowser::new(session_id, self.action_latency))
    }

    fn speech(&self, voice_id: &str) -> Arc<dyn SpeechSynthesizer> {
        Arc::new(RehearsalSpeech::new(voice_id, self.engine.clone()))
    }

    fn language_model(&self) -> Arc<dyn LanguageModel> {
        Arc::new(RehearsalLanguageModel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_browser_actions_take_the_configured_latency() {
        // Arrange
        let browser = RehearsalBrowser::new(Uuid::new_v4(), Duration::from_millis(300));
        let started = tokio::time::Instant::now();

        // Act
        browser.click("#save").await.unwrap();
        browser
            .scroll(&ScrollTarget::Element("#footer".into()), 500)
            .await
            .unwrap();

        // Assert
        assert_eq!(started.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_speech_duration_follows_word_count() {
        // Arrange
        let speech = RehearsalSpeech::new("alloy", EngineConfig::default());

        // Act
        let output = speech.speak("one two three four five").await.unwrap();

        // Assert
        assert!(output.audio.is_empty());
        assert_eq!(output.duration, Duration::from_secs(2));
        assert!(!output.is_silent());
        assert_eq!(speech.voice_id(), "alloy");
    }

    #[tokio::test]
    async fn test_language_model_is_unavailable() {
        let model = RehearsalLanguageModel;

        let result = model
            .answer_question("How much?", &QuestionContext::default())
            .await;

        assert!(matches!(result, Err(LanguageModelError::Unavailable(_))));
    }
}
