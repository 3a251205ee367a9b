//! Registry of live sessions.

use std::collections::HashMap;
use std::sync::Arc;

use democopilot_core::clock::Clock;
use democopilot_core::error::DomainError;
use democopilot_core::observer::SessionObserver;
use democopilot_core::progress::ProgressSnapshot;
use democopilot_core::provider::CollaboratorProvider;
use democopilot_core::speech::SpeechSynthesizer;
use democopilot_core::state::SessionState;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use super::narration_cache::{CachedSpeech, NarrationCache};
use super::session_machine::{SessionCollaborators, SessionOutcome, SessionStateMachine};
use crate::config::EngineConfig;
use crate::domain::script::DemoScript;
use crate::domain::session::{CustomerInfo, DemoSession};

/// Parameters for a new session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Script to run.
    pub script: DemoScript,
    /// Who the walkthrough is for.
    pub customer: CustomerInfo,
    /// Voice used for narration and answers.
    pub voice_id: String,
}

/// Creates, tracks and tears down sessions. Sessions share nothing mutable
/// except the narration cache.
pub struct SessionCoordinator {
    sessions: RwLock<HashMap<Uuid, Arc<SessionStateMachine>>>,
    provider: Arc<dyn CollaboratorProvider>,
    narration_cache: Arc<NarrationCache>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl SessionCoordinator {
    /// Creates an empty coordinator.
    #[must_use]
    pub fn new(
        provider: Arc<dyn CollaboratorProvider>,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            provider,
            narration_cache: Arc::new(NarrationCache::new()),
            clock,
            config,
            observers: Vec::new(),
        }
    }

    /// Registers an observer attached to every session created afterwards.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// The cache shared by every session's speech.
    #[must_use]
    pub fn narration_cache(&self) -> &Arc<NarrationCache> {
        &self.narration_cache
    }

    /// Engine parameters applied to new sessions.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Creates an idle session.
    pub async fn create(&self, request: NewSession) -> Arc<SessionStateMachine> {
        let id = Uuid::new_v4();
        let speech: Arc<dyn SpeechSynthesizer> = Arc::new(CachedSpeech::new(
            self.provider.speech(&request.voice_id),
            Arc::clone(&self.narration_cache),
        ));
        let collaborators = SessionCollaborators {
            browser: self.provider.browser(id),
            speech,
            model: self.provider.language_model(),
        };
        let session = DemoSession::new(id, request.customer, self.clock.as_ref());
        let steps = request.script.steps.len();
        let script_name = request.script.name.clone();

        let mut machine = SessionStateMachine::new(
            session,
            request.script,
            collaborators,
            Arc::clone(&self.clock),
            self.config.clone(),
        );
        for observer in &self.observers {
            machine = machine.with_observer(Arc::clone(observer));
        }
        let machine = Arc::new(machine);

        self.sessions.write().await.insert(id, Arc::clone(&machine));
        info!(session_id = %id, script = %script_name, steps, "session created");
        machine
    }

    /// Looks up a session.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` for an unknown id.
    pub async fn get(&self, id: Uuid) -> Result<Arc<SessionStateMachine>, DomainError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(DomainError::SessionNotFound(id))
    }

    /// Snapshots of every session.
    pub async fn list(&self) -> Vec<ProgressSnapshot> {
        let machines: Vec<Arc<SessionStateMachine>> =
            self.sessions.read().await.values().cloned().collect();
        machines.iter().map(|machine| machine.snapshot()).collect()
    }

    /// Spawns the driver for an idle session and returns its handle.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` for an unknown id and
    /// `DomainError::InvalidTransition` if the session is not idle.
    pub async fn start(
        &self,
        id: Uuid,
    ) -> Result<JoinHandle<Result<SessionOutcome, DomainError>>, DomainError> {
        let machine = self.get(id).await?;
        let state = machine.state();
        if state != SessionState::Idle {
            return Err(DomainError::InvalidTransition {
                operation: "start",
                state,
            });
        }
        Ok(tokio::spawn(async move {
            let result = machine.start().await;
            if let Err(e) = &result {
                error!(session_id = %id, error = %e, "session driver ended with error");
            }
            result
        }))
    }

    /// Stops a session, forgets it and returns its final snapshot.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::SessionNotFound` for an unknown id.
    pub async fn remove(&self, id: Uuid) -> Result<ProgressSnapshot, DomainError> {
        let machine = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(DomainError::SessionNotFound(id))?;
        machine.stop().await;
        info!(session_id = %id, "session removed");
        Ok(machine.snapshot())
    }

    /// Stops every session. Used on process shutdown.
    pub async fn shutdown(&self) {
        let machines: Vec<Arc<SessionStateMachine>> =
            self.sessions.write().await.drain().map(|(_, m)| m).collect();
        for machine in machines {
            machine.stop().await;
        }
    }
}
