//! Lifecycle owner for one demo session.
//!
//! A single driver task runs the walkthrough through [`SessionStateMachine::start`].
//! Control operations (`pause`, `resume`, `skip_to`, `ask_question`, `stop`)
//! may be called from any other task at any time. All mutable state lives
//! behind one mutex that is never held across an await, so a control call
//! observes either the state before or after any transition, never a mix.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use democopilot_core::browser::BrowserAutomation;
use democopilot_core::clock::Clock;
use democopilot_core::error::{DomainError, FatalCollaboratorFailure};
use democopilot_core::language_model::{LanguageModel, ProductContext, QuestionContext};
use democopilot_core::observer::SessionObserver;
use democopilot_core::progress::{ProgressSnapshot, StepSummary};
use democopilot_core::speech::SpeechSynthesizer;
use democopilot_core::state::SessionState;
use serde::{Deserialize, Serialize};
use tokio::sync::{oneshot, watch};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::gate::PauseGate;
use super::interrupt::QuestionInterruptHandler;
use super::observers::ObserverSet;
use super::progress::ProgressReporter;
use super::sequencer::StepSequencer;
use super::synchronizer::NarrationActionSynchronizer;
use crate::config::EngineConfig;
use crate::domain::commands::ControlCommand;
use crate::domain::narration::StepResult;
use crate::domain::question::QuestionEvent;
use crate::domain::script::{DemoScript, DemoStep};
use crate::domain::session::DemoSession;

/// The external systems one session talks to.
#[derive(Clone)]
pub struct SessionCollaborators {
    /// Browser dedicated to this session.
    pub browser: Arc<dyn BrowserAutomation>,
    /// Speech synthesizer for narration and answers.
    pub speech: Arc<dyn SpeechSynthesizer>,
    /// Language model for answering questions.
    pub model: Arc<dyn LanguageModel>,
}

/// How a driver run ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    /// Every step ran.
    Completed,
    /// The session was stopped.
    Stopped,
}

/// Handle for a queued question.
#[derive(Debug)]
pub struct QuestionTicket {
    /// Identifier of the queued question.
    pub question_id: Uuid,
    receiver: oneshot::Receiver<QuestionEvent>,
}

impl QuestionTicket {
    /// Waits for the question to be answered.
    ///
    /// Returns `None` if the session stopped or failed first.
    pub async fn resolved(self) -> Option<QuestionEvent> {
        self.receiver.await.ok()
    }
}

struct PendingQuestion {
    event: QuestionEvent,
    reply: oneshot::Sender<QuestionEvent>,
}

struct Shared {
    session: DemoSession,
    sequencer: StepSequencer,
    pending_question: Option<PendingQuestion>,
    last_step: Option<StepSummary>,
    /// Set by `resume`, cleared when the next step begins.
    resume_cue_pending: bool,
}

enum Boundary {
    Hold,
    Question(PendingQuestion),
    Step { step: DemoStep, resume_cue: bool },
    Completed,
    Halted,
}

/// Owns a [`DemoSession`] and drives it through its lifecycle.
pub struct SessionStateMachine {
    id: Uuid,
    shared: Mutex<Shared>,
    synchronizer: NarrationActionSynchronizer,
    interrupts: QuestionInterruptHandler,
    browser: Arc<dyn BrowserAutomation>,
    clock: Arc<dyn Clock>,
    config: EngineConfig,
    product: Option<ProductContext>,
    observers: ObserverSet,
    gate: PauseGate,
    cancel: CancellationToken,
    /// `true` while no driver holds the collaborators.
    released: watch::Sender<bool>,
}

impl SessionStateMachine {
    /// Creates a machine for an idle `session` running `script`.
    #[must_use]
    pub fn new(
        session: DemoSession,
        script: DemoScript,
        collaborators: SessionCollaborators,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> Self {
        let id = session.id;
        let (released, _) = watch::channel(true);
        let product = script.product.clone();
        Self {
            id,
            shared: Mutex::new(Shared {
                session,
                sequencer: StepSequencer::new(script),
                pending_question: None,
                last_step: None,
                resume_cue_pending: false,
            }),
            synchronizer: NarrationActionSynchronizer::new(
                Arc::clone(&collaborators.speech),
                Arc::clone(&collaborators.browser),
                config.clone(),
            ),
            interrupts: QuestionInterruptHandler::new(
                collaborators.model,
                collaborators.speech,
                &config,
            ),
            browser: collaborators.browser,
            clock,
            config,
            product,
            observers: ObserverSet::new(id),
            gate: PauseGate::new(),
            cancel: CancellationToken::new(),
            released,
        }
    }

    /// Registers an observer. Observers are fixed once the session starts.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().session.state()
    }

    /// Current progress.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        let shared = self.lock();
        self.snapshot_of(&shared)
    }

    /// Step names in script order.
    #[must_use]
    pub fn step_names(&self) -> Vec<String> {
        self.lock().sequencer.step_names()
    }

    /// Runs the walkthrough to the end. Call once, from the driver task.
    ///
    /// Launches the browser, executes steps until the script is exhausted
    /// or the session is stopped, and always releases the browser before
    /// returning.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` if the session is not idle
    /// or was stopped, and `DomainError::FatalCollaborator` if a
    /// collaborator became unusable (the session is then `Failed`).
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn start(&self) -> Result<SessionOutcome, DomainError> {
        {
            let mut shared = self.lock();
            if let Err(e) = shared.session.begin() {
                warn!(error = %e, "start rejected");
                return Err(e);
            }
            self.released.send_replace(false);
        }
        info!("session starting");
        self.publish_state();

        let outcome = self.drive().await;
        self.release().await;

        match &outcome {
            Ok(SessionOutcome::Completed) => info!("walkthrough completed"),
            Ok(SessionOutcome::Stopped) => info!("walkthrough stopped"),
            Err(e) => error!(error = %e, "walkthrough failed"),
        }
        outcome
    }

    /// Freezes the walkthrough at the next action boundary.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the session is running.
    pub fn pause(&self) -> Result<(), DomainError> {
        let result = {
            let mut shared = self.lock();
            let result = shared.session.pause(self.clock.as_ref());
            if result.is_ok() {
                self.gate.close();
            }
            result
        };
        match result {
            Ok(()) => {
                info!(session_id = %self.id, "session paused");
                self.publish_state();
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "pause rejected");
                Err(e)
            }
        }
    }

    /// Continues a paused walkthrough.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the session is paused.
    pub fn resume(&self) -> Result<(), DomainError> {
        let result = {
            let mut shared = self.lock();
            let result = shared.session.resume(self.clock.as_ref());
            if result.is_ok() {
                shared.resume_cue_pending = true;
                self.gate.open();
            }
            result
        };
        match result {
            Ok(()) => {
                info!(session_id = %self.id, "session resumed");
                self.publish_state();
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "resume rejected");
                Err(e)
            }
        }
    }

    /// Continues from `section` once the current step finishes.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the session is running
    /// or paused, and `DomainError::StepNotFound` for an unknown step.
    pub fn skip_to(&self, section: &str) -> Result<(), DomainError> {
        let mut shared = self.lock();
        let state = shared.session.state();
        if !matches!(state, SessionState::Running | SessionState::Paused) {
            warn!(session_id = %self.id, %state, "skip rejected");
            return Err(DomainError::InvalidTransition {
                operation: "skip",
                state,
            });
        }
        match shared.sequencer.jump_to(section) {
            Ok(index) => {
                info!(session_id = %self.id, section, index, "skipping ahead");
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "skip rejected");
                Err(e)
            }
        }
    }

    /// Queues a question to be answered at the next step boundary.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for a blank question and
    /// `DomainError::InvalidTransition` unless the session is running. A
    /// second question while one is being answered is rejected.
    pub fn ask_question(&self, text: &str) -> Result<QuestionTicket, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::Validation(
                "question must not be empty".to_owned(),
            ));
        }
        let ticket = {
            let mut shared = self.lock();
            if let Err(e) = shared.session.raise_question() {
                warn!(session_id = %self.id, error = %e, "question rejected");
                return Err(e);
            }
            let event = QuestionEvent::new(text, self.clock.as_ref());
            let (reply, receiver) = oneshot::channel();
            let question_id = event.id;
            shared.pending_question = Some(PendingQuestion { event, reply });
            QuestionTicket {
                question_id,
                receiver,
            }
        };
        info!(session_id = %self.id, question_id = %ticket.question_id, "question queued");
        self.publish_state();
        Ok(ticket)
    }

    /// Ends the session and waits for its collaborators to be released.
    ///
    /// Safe to call any number of times and in any state.
    pub async fn stop(&self) {
        let changed = {
            let mut shared = self.lock();
            shared.pending_question = None;
            shared.session.stop(self.clock.as_ref())
        };
        self.cancel.cancel();
        if changed {
            info!(session_id = %self.id, "session stopped");
            self.publish_state();
        }

        let mut released = self.released.subscribe();
        let finished = timeout(
            self.config.shutdown_timeout,
            released.wait_for(|done| *done),
        )
        .await
        .is_ok();
        if !finished {
            warn!(session_id = %self.id, "collaborators were not released in time");
        }
    }

    /// Applies a presenter command.
    ///
    /// # Errors
    ///
    /// Returns whatever the underlying operation returns.
    pub async fn apply(&self, command: &ControlCommand) -> Result<(), DomainError> {
        match command {
            ControlCommand::Pause => self.pause(),
            ControlCommand::Resume => self.resume(),
            ControlCommand::Skip { section } => self.skip_to(section),
            ControlCommand::Stop => {
                self.stop().await;
                Ok(())
            }
        }
    }

    async fn drive(&self) -> Result<SessionOutcome, DomainError> {
        info!("launching browser");
        let launched = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return Ok(SessionOutcome::Stopped),
            result = timeout(self.config.launch_timeout, self.browser.launch()) => result,
        };
        let launch_error = match launched {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!(
                "browser launch timed out after {}s",
                self.config.launch_timeout.as_secs()
            )),
        };
        if let Some(message) = launch_error {
            return Err(self.fail(FatalCollaboratorFailure::browser(message)));
        }

        let running = self.lock().session.mark_running(self.clock.as_ref());
        if !running {
            return Ok(SessionOutcome::Stopped);
        }
        self.publish_state();

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Ok(SessionOutcome::Stopped),
                () = self.gate.wait_open() => {}
            }

            match self.next_boundary() {
                Boundary::Hold => {}
                Boundary::Halted => return Ok(SessionOutcome::Stopped),
                Boundary::Completed => {
                    self.publish_state();
                    return Ok(SessionOutcome::Completed);
                }
                Boundary::Question(pending) => {
                    if !self.answer(pending).await {
                        return Ok(SessionOutcome::Stopped);
                    }
                }
                Boundary::Step { step, resume_cue } => {
                    self.publish_progress();
                    if resume_cue {
                        tokio::select! {
                            biased;
                            () = self.cancel.cancelled() => return Ok(SessionOutcome::Stopped),
                            _ = self.synchronizer.announce(&self.config.resume_cue, &self.observers) => {}
                        }
                    }
                    let result = tokio::select! {
                        biased;
                        () = self.cancel.cancelled() => return Ok(SessionOutcome::Stopped),
                        result = self
                            .synchronizer
                            .run_step(&step, &self.gate, &self.observers) => result,
                    };
                    match result {
                        Ok(step_result) => self.record_step(&step_result),
                        Err(failure) => return Err(self.fail(failure)),
                    }
                }
            }
        }
    }

    /// Decides what the driver does next, atomically with respect to
    /// control calls.
    fn next_boundary(&self) -> Boundary {
        let mut guard = self.lock();
        let shared = &mut *guard;
        match shared.session.state() {
            SessionState::Paused => Boundary::Hold,
            SessionState::Running | SessionState::AnsweringQuestion => {
                if let Some(pending) = shared.pending_question.take() {
                    return Boundary::Question(pending);
                }
                let Some(step) = shared.sequencer.advance().cloned() else {
                    shared.session.complete(self.clock.as_ref());
                    return Boundary::Completed;
                };
                shared.session.enter_step(step.position, &step.name);
                Boundary::Step {
                    step,
                    resume_cue: std::mem::take(&mut shared.resume_cue_pending),
                }
            }
            SessionState::Idle
            | SessionState::Starting
            | SessionState::Completed
            | SessionState::Failed => Boundary::Halted,
        }
    }

    /// Answers a pending question. Returns `false` if the session was
    /// stopped meanwhile.
    async fn answer(&self, pending: PendingQuestion) -> bool {
        let PendingQuestion { event, reply } = pending;
        let context = self.question_context();
        let jump = |target: &str| self.lock().sequencer.jump_to(target);

        let resolved = tokio::select! {
            biased;
            () = self.cancel.cancelled() => return false,
            resolved = self.interrupts.handle(
                event,
                context,
                &self.observers,
                self.clock.as_ref(),
                jump,
            ) => resolved,
        };

        let resumed = self.lock().session.finish_question();
        // The asker may have stopped waiting.
        let _ = reply.send(resolved);
        if resumed {
            self.publish_state();
        }
        true
    }

    fn question_context(&self) -> QuestionContext {
        let shared = self.lock();
        let total_steps = shared.sequencer.len();
        QuestionContext {
            current_step: shared.session.current_step().map(str::to_owned),
            step_number: shared.session.step_cursor().map(|index| index + 1),
            total_steps,
            percent_complete: ProgressReporter::percent_complete(&shared.session, total_steps),
            customer_name: shared.session.customer().name.clone(),
            available_steps: shared.sequencer.step_names(),
            product: self.product.clone(),
            history: Vec::new(),
        }
    }

    fn record_step(&self, result: &StepResult) {
        let snapshot = {
            let mut shared = self.lock();
            shared.session.complete_step(result.position);
            shared.last_step = Some(result.summary());
            self.snapshot_of(&shared)
        };
        info!(
            step = %result.step_name,
            failures = result.failures(),
            drift_ms = result.drift_ms,
            "step finished"
        );
        self.observers.step_result(&result.step_name, &result.outcomes);
        self.observers.progress(&snapshot);
    }

    fn fail(&self, failure: FatalCollaboratorFailure) -> DomainError {
        let changed = self
            .lock()
            .session
            .fail(&failure, self.clock.as_ref());
        error!(error = %failure, "collaborator failure, halting session");
        if changed {
            self.publish_state();
        }
        DomainError::FatalCollaborator(failure)
    }

    async fn release(&self) {
        self.lock().pending_question = None;
        if timeout(self.config.shutdown_timeout, self.browser.shutdown())
            .await
            .is_err()
        {
            warn!("browser shutdown timed out");
        }
        self.released.send_replace(true);
    }

    fn publish_state(&self) {
        let (state, snapshot) = {
            let shared = self.lock();
            (shared.session.state(), self.snapshot_of(&shared))
        };
        self.observers.state_changed(state);
        self.observers.progress(&snapshot);
    }

    fn publish_progress(&self) {
        let snapshot = self.snapshot();
        self.observers.progress(&snapshot);
    }

    fn snapshot_of(&self, shared: &Shared) -> ProgressSnapshot {
        ProgressReporter::snapshot(
            &shared.session,
            shared.sequencer.len(),
            shared.last_step.as_ref(),
            self.clock.as_ref(),
        )
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use democopilot_core::action::ActionSpec;
    use democopilot_core::browser::BrowserError;
    use democopilot_test_support::{
        BrowserCall, ManualClock, RecordingBrowser, RecordingObserver, ScriptedLanguageModel,
        ScriptedSpeech,
    };

    use super::*;
    use crate::domain::session::CustomerInfo;

    fn script(names: &[&str]) -> DemoScript {
        let steps = names
            .iter()
            .map(|name| {
                DemoStep::new(
                    *name,
                    "",
                    vec![ActionSpec::Click {
                        selector: format!("#{name}"),
                        description: None,
                        delay_ms: None,
                    }],
                )
            })
            .collect();
        DemoScript::new("test", steps).unwrap()
    }

    fn machine(
        browser: Arc<RecordingBrowser>,
        names: &[&str],
    ) -> (SessionStateMachine, Arc<RecordingObserver>) {
        let clock = Arc::new(ManualClock::at_default_start());
        let session = DemoSession::new(Uuid::new_v4(), CustomerInfo::default(), clock.as_ref());
        let observer = Arc::new(RecordingObserver::new());
        let collaborators = SessionCollaborators {
            browser,
            speech: Arc::new(ScriptedSpeech::fixed(std::time::Duration::ZERO)),
            model: Arc::new(ScriptedLanguageModel::answering("Sure.")),
        };
        let machine = SessionStateMachine::new(
            session,
            script(names),
            collaborators,
            clock,
            EngineConfig::default(),
        )
        .with_observer(observer.clone());
        (machine, observer)
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_runs_every_step_and_completes() {
        // Arrange
        let browser = Arc::new(RecordingBrowser::new());
        let (machine, observer) = machine(browser.clone(), &["a", "b", "c"]);

        // Act
        let outcome = machine.start().await.unwrap();

        // Assert
        assert_eq!(outcome, SessionOutcome::Completed);
        assert_eq!(machine.state(), SessionState::Completed);
        assert_eq!(observer.executed_steps(), vec!["a", "b", "c"]);
        assert_eq!(
            observer.states(),
            vec![
                SessionState::Starting,
                SessionState::Running,
                SessionState::Completed
            ]
        );
        assert_eq!(browser.calls().first(), Some(&BrowserCall::Launch));
        assert_eq!(browser.shutdown_count(), 1);
        let snapshot = machine.snapshot();
        assert!((snapshot.percent_complete - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_twice_is_rejected() {
        let (machine, _) = machine(Arc::new(RecordingBrowser::new()), &["a"]);
        machine.start().await.unwrap();

        let result = machine.start().await;

        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition {
                operation: "start",
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_launch_failure_fails_session_and_releases_browser() {
        // Arrange
        let browser = Arc::new(
            RecordingBrowser::new().failing_launch(BrowserError::SessionLost("no display".into())),
        );
        let (machine, observer) = machine(browser.clone(), &["a"]);

        // Act
        let result = machine.start().await;

        // Assert
        assert!(matches!(result, Err(DomainError::FatalCollaborator(_))));
        assert_eq!(machine.state(), SessionState::Failed);
        assert!(machine.snapshot().last_error.unwrap().contains("no display"));
        assert_eq!(observer.states().last(), Some(&SessionState::Failed));
        assert!(browser.action_calls().is_empty());
        assert_eq!(browser.shutdown_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_controls_are_rejected_before_start() {
        let (machine, _) = machine(Arc::new(RecordingBrowser::new()), &["a"]);

        assert!(machine.pause().is_err());
        assert!(machine.resume().is_err());
        assert!(machine.skip_to("a").is_err());
        assert!(machine.ask_question("hello?").is_err());
        assert_eq!(machine.state(), SessionState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_question_is_a_validation_error() {
        let (machine, _) = machine(Arc::new(RecordingBrowser::new()), &["a"]);

        assert!(matches!(
            machine.ask_question("   "),
            Err(DomainError::Validation(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_start_prevents_starting() {
        let browser = Arc::new(RecordingBrowser::new());
        let (machine, _) = machine(browser.clone(), &["a"]);

        machine.stop().await;
        let result = machine.start().await;

        assert!(result.is_err());
        assert!(browser.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_apply_dispatches_commands() {
        let (machine, _) = machine(Arc::new(RecordingBrowser::new()), &["a"]);

        let result = machine.apply(&ControlCommand::Pause).await;
        machine.apply(&ControlCommand::Stop).await.unwrap();

        assert!(matches!(
            result,
            Err(DomainError::InvalidTransition {
                operation: "pause",
                ..
            })
        ));
    }
}
