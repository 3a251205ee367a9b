//! Shared test mocks and utilities for the Demo Copilot engine.

mod browser;
mod clock;
mod language_model;
mod observer;
mod provider;
mod speech;

pub use browser::{BrowserCall, RecordingBrowser};
pub use clock::{FixedClock, ManualClock, TokioClock};
pub use language_model::{FailingLanguageModel, ScriptedLanguageModel};
pub use observer::RecordingObserver;
pub use provider::StaticProvider;
pub use speech::{FailingSpeech, MutedSpeech, ScriptedSpeech, SilentSpeech};
