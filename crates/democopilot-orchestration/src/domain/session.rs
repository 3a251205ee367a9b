//! The demo session aggregate.

use chrono::{DateTime, TimeDelta, Utc};
use democopilot_core::clock::Clock;
use democopilot_core::error::{DomainError, FatalCollaboratorFailure};
use democopilot_core::state::SessionState;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who the walkthrough is being given to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Customer's name.
    #[serde(default)]
    pub name: Option<String>,
    /// Customer's email address.
    #[serde(default)]
    pub email: Option<String>,
    /// Customer's company.
    #[serde(default)]
    pub company: Option<String>,
}

/// One customer's run of a demo script.
///
/// Holds the lifecycle state and the counters progress is computed from.
/// Every transition is validated here; callers serialize access.
#[derive(Debug, Clone)]
pub struct DemoSession {
    /// Session identifier.
    pub id: Uuid,
    pub(crate) state: SessionState,
    /// Zero-based index of the step most recently entered.
    pub(crate) step_cursor: Option<usize>,
    pub(crate) current_step: Option<String>,
    /// Highest index of a step that ran to completion.
    pub(crate) completed_through: Option<usize>,
    pub(crate) accumulated_paused: TimeDelta,
    pub(crate) paused_at: Option<DateTime<Utc>>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) ended_at: Option<DateTime<Utc>>,
    /// Set once `stop` has been called. A stopped session never starts.
    pub(crate) stopped: bool,
    pub(crate) questions_answered: u32,
    pub(crate) pauses_taken: u32,
    pub(crate) customer: CustomerInfo,
    pub(crate) last_error: Option<String>,
}

impl DemoSession {
    /// Creates an idle session.
    #[must_use]
    pub fn new(id: Uuid, customer: CustomerInfo, clock: &dyn Clock) -> Self {
        Self {
            id,
            state: SessionState::Idle,
            step_cursor: None,
            current_step: None,
            completed_through: None,
            accumulated_paused: TimeDelta::zero(),
            paused_at: None,
            created_at: clock.now(),
            started_at: None,
            ended_at: None,
            stopped: false,
            questions_answered: 0,
            pauses_taken: 0,
            customer,
            last_error: None,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Zero-based index of the step most recently entered.
    #[must_use]
    pub fn step_cursor(&self) -> Option<usize> {
        self.step_cursor
    }

    /// Name of the step most recently entered.
    #[must_use]
    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    /// Highest index of a step that ran to completion.
    #[must_use]
    pub fn completed_through(&self) -> Option<usize> {
        self.completed_through
    }

    /// Total time spent in completed pauses.
    #[must_use]
    pub fn accumulated_paused(&self) -> TimeDelta {
        self.accumulated_paused
    }

    /// When the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Questions answered so far.
    #[must_use]
    pub fn questions_answered(&self) -> u32 {
        self.questions_answered
    }

    /// Pauses taken so far.
    #[must_use]
    pub fn pauses_taken(&self) -> u32 {
        self.pauses_taken
    }

    /// Customer details.
    #[must_use]
    pub fn customer(&self) -> &CustomerInfo {
        &self.customer
    }

    /// The fatal error that failed the session, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Returns `true` once `stop` has been called.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// `Idle` → `Starting`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the session is idle
    /// and has never been started or stopped.
    pub fn begin(&mut self) -> Result<(), DomainError> {
        if self.state != SessionState::Idle || self.stopped || self.started_at.is_some() {
            return Err(self.rejected("start"));
        }
        self.state = SessionState::Starting;
        Ok(())
    }

    /// `Starting` → `Running`. Returns `false` if the session left
    /// `Starting` in the meantime.
    pub fn mark_running(&mut self, clock: &dyn Clock) -> bool {
        if self.state != SessionState::Starting {
            return false;
        }
        self.state = SessionState::Running;
        self.started_at = Some(clock.now());
        true
    }

    /// `Running` → `Paused`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the session is running.
    pub fn pause(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        if self.state != SessionState::Running {
            return Err(self.rejected("pause"));
        }
        self.state = SessionState::Paused;
        self.paused_at = Some(clock.now());
        self.pauses_taken += 1;
        Ok(())
    }

    /// `Paused` → `Running`, folding the pause into the paused total.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the session is paused.
    pub fn resume(&mut self, clock: &dyn Clock) -> Result<(), DomainError> {
        if self.state != SessionState::Paused {
            return Err(self.rejected("resume"));
        }
        self.fold_pause(clock);
        self.state = SessionState::Running;
        Ok(())
    }

    /// `Running` → `AnsweringQuestion`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidTransition` unless the session is running.
    pub fn raise_question(&mut self) -> Result<(), DomainError> {
        if self.state != SessionState::Running {
            return Err(self.rejected("ask a question"));
        }
        self.state = SessionState::AnsweringQuestion;
        Ok(())
    }

    /// Records an answered question and returns to `Running`. Returns
    /// `false` if the session was no longer answering.
    pub fn finish_question(&mut self) -> bool {
        self.questions_answered += 1;
        if self.state != SessionState::AnsweringQuestion {
            return false;
        }
        self.state = SessionState::Running;
        true
    }

    /// Moves the cursor onto the step at `index`.
    pub fn enter_step(&mut self, index: usize, name: &str) {
        self.step_cursor = Some(index);
        self.current_step = Some(name.to_owned());
    }

    /// Marks the step at `index` as completed.
    ///
    /// After a backward jump a step may complete below an index already
    /// reached; the high-water mark is kept.
    pub fn complete_step(&mut self, index: usize) {
        self.completed_through = Some(self.completed_through.map_or(index, |done| done.max(index)));
    }

    /// `Running` → `Completed`. Returns `false` if the session was not running.
    pub fn complete(&mut self, clock: &dyn Clock) -> bool {
        if self.state != SessionState::Running {
            return false;
        }
        self.state = SessionState::Completed;
        self.ended_at = Some(clock.now());
        true
    }

    /// Any active state → `Failed`, retaining the cause. Returns `false` if
    /// the session was already idle or terminal.
    pub fn fail(&mut self, failure: &FatalCollaboratorFailure, clock: &dyn Clock) -> bool {
        if !self.is_active() {
            return false;
        }
        self.fold_pause(clock);
        self.state = SessionState::Failed;
        self.last_error = Some(failure.to_string());
        self.ended_at = Some(clock.now());
        true
    }

    /// Any active state → `Idle`. Returns `true` if the state changed.
    ///
    /// Stopping an idle or terminal session changes nothing, but an idle
    /// session that was never started can no longer be started afterwards.
    pub fn stop(&mut self, clock: &dyn Clock) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.stopped = true;
        if !self.is_active() {
            return false;
        }
        self.fold_pause(clock);
        self.state = SessionState::Idle;
        self.ended_at = Some(clock.now());
        true
    }

    /// Wall-clock time since the session started running, excluding every
    /// pause including one still in progress.
    #[must_use]
    pub fn elapsed_active(&self, clock: &dyn Clock) -> TimeDelta {
        let Some(started_at) = self.started_at else {
            return TimeDelta::zero();
        };
        let end = self.ended_at.unwrap_or_else(|| clock.now());
        let ongoing = self
            .paused_at
            .map_or(TimeDelta::zero(), |paused_at| (end - paused_at).max(TimeDelta::zero()));
        (end - started_at - self.accumulated_paused - ongoing).max(TimeDelta::zero())
    }

    fn is_active(&self) -> bool {
        matches!(
            self.state,
            SessionState::Starting
                | SessionState::Running
                | SessionState::Paused
                | SessionState::AnsweringQuestion
        )
    }

    fn fold_pause(&mut self, clock: &dyn Clock) {
        if let Some(paused_at) = self.paused_at.take() {
            self.accumulated_paused += clock.since(paused_at);
        }
    }

    fn rejected(&self, operation: &'static str) -> DomainError {
        DomainError::InvalidTransition {
            operation,
            state: self.state,
        }
    }
}
