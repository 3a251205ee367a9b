//! Test provider — hands out pre-built collaborators.

use std::sync::Arc;

use democopilot_core::browser::BrowserAutomation;
use democopilot_core::language_model::LanguageModel;
use democopilot_core::provider::CollaboratorProvider;
use democopilot_core::speech::SpeechSynthesizer;
use uuid::Uuid;

/// A provider that returns the same collaborator instances for every
/// session, so tests can inspect what was called.
pub struct StaticProvider {
    /// Browser handed to every session.
    pub browser: Arc<dyn BrowserAutomation>,
    /// Synthesizer handed out for every voice.
    pub speech: Arc<dyn SpeechSynthesizer>,
    /// Shared language model.
    pub model: Arc<dyn LanguageModel>,
}

impl CollaboratorProvider for StaticProvider {
    fn browser(&self, _session_id: Uuid) -> Arc<dyn BrowserAutomation> {
        Arc::clone(&self.browser)
    }

    fn speech(&self, _voice_id: &str) -> Arc<dyn SpeechSynthesizer> {
        Arc::clone(&self.speech)
    }

    fn language_model(&self) -> Arc<dyn LanguageModel> {
        Arc::clone(&self.model)
    }
}
