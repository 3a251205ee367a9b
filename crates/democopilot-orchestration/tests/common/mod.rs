//! Shared fixtures for walkthrough tests.

#![allow(dead_code)]

use std::sync::Arc;

use democopilot_core::action::ActionSpec;
use democopilot_core::browser::BrowserAutomation;
use democopilot_core::language_model::LanguageModel;
use democopilot_core::speech::SpeechSynthesizer;
use democopilot_orchestration::application::session_machine::{
    SessionCollaborators, SessionOutcome, SessionStateMachine,
};
use democopilot_orchestration::config::EngineConfig;
use democopilot_orchestration::domain::script::{DemoScript, DemoStep};
use democopilot_orchestration::domain::session::{CustomerInfo, DemoSession};
use democopilot_core::error::DomainError;
use democopilot_test_support::{RecordingObserver, TokioClock};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Ten words: 4 seconds at 150 words per minute.
pub const TEN_WORDS: &str = "Here is the overview of everything your team can see";

/// Five words: 2 seconds at 150 words per minute.
pub const FIVE_WORDS: &str = "Let's look at this next";

pub fn click(selector: &str) -> ActionSpec {
    ActionSpec::Click {
        selector: selector.to_owned(),
        description: None,
        delay_ms: None,
    }
}

pub fn step(name: &str, narration: &str, actions: Vec<ActionSpec>) -> DemoStep {
    DemoStep::new(name, narration, actions)
}

/// One step per name, each narrated with `narration` and clicking `#<name>`.
pub fn script_of(names: &[&str], narration: &str) -> DemoScript {
    let steps = names
        .iter()
        .map(|name| step(name, narration, vec![click(&format!("#{name}"))]))
        .collect();
    DemoScript::new("walkthrough", steps).unwrap()
}

pub struct Harness {
    pub machine: Arc<SessionStateMachine>,
    pub observer: Arc<RecordingObserver>,
}

impl Harness {
    pub fn new(
        script: DemoScript,
        browser: Arc<dyn BrowserAutomation>,
        speech: Arc<dyn SpeechSynthesizer>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        let clock = Arc::new(TokioClock::new());
        let customer = CustomerInfo {
            name: Some("Grace".to_owned()),
            email: Some("grace@example.com".to_owned()),
            company: Some("Example Corp".to_owned()),
        };
        let session = DemoSession::new(Uuid::new_v4(), customer, clock.as_ref());
        let observer = Arc::new(RecordingObserver::new());
        let machine = SessionStateMachine::new(
            session,
            script,
            SessionCollaborators {
                browser,
                speech,
                model,
            },
            clock,
            EngineConfig::default(),
        )
        .with_observer(observer.clone());
        Self {
            machine: Arc::new(machine),
            observer,
        }
    }

    /// Starts the driver on its own task.
    pub fn spawn(&self) -> JoinHandle<Result<SessionOutcome, DomainError>> {
        let machine = Arc::clone(&self.machine);
        tokio::spawn(async move { machine.start().await })
    }
}
