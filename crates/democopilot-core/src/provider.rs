//! Collaborator provider abstraction.

use std::sync::Arc;

use uuid::Uuid;

use crate::browser::BrowserAutomation;
use crate::language_model::LanguageModel;
use crate::speech::SpeechSynthesizer;

/// Builds the collaborators a new session needs.
///
/// Browsers are per session, speech is per voice, and the language model is
/// shared by every session.
pub trait CollaboratorProvider: Send + Sync {
    /// Returns a browser dedicated to `session_id`.
    fn browser(&self, session_id: Uuid) -> Arc<dyn BrowserAutomation>;

    /// Returns a speech synthesizer speaking with `voice_id`.
    fn speech(&self, voice_id: &str) -> Arc<dyn SpeechSynthesizer>;

    /// Returns the language model used to answer questions.
    fn language_model(&self) -> Arc<dyn LanguageModel>;
}
