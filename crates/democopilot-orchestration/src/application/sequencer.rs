//! Step cursor over a demo script.

use democopilot_core::error::DomainError;

use crate::domain::script::{DemoScript, DemoStep};

/// Walks a script's steps in order and supports redirection by name.
///
/// A jump never interrupts the step in flight; it only changes which step
/// [`StepSequencer::advance`] returns.
#[derive(Debug, Clone)]
pub struct StepSequencer {
    steps: Vec<DemoStep>,
    cursor: Option<usize>,
    next_index: usize,
}

impl StepSequencer {
    /// Creates a sequencer positioned before the first step.
    #[must_use]
    pub fn new(script: DemoScript) -> Self {
        Self {
            steps: script.steps,
            cursor: None,
            next_index: 0,
        }
    }

    /// Advances to the next step, or returns `None` once the script is
    /// exhausted.
    pub fn advance(&mut self) -> Option<&DemoStep> {
        let index = self.next_index;
        let step = self.steps.get(index)?;
        self.cursor = Some(index);
        self.next_index = index + 1;
        Some(step)
    }

    /// Makes `name` the next step returned by [`StepSequencer::advance`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::StepNotFound` if no step has that name. The
    /// cursor is left unchanged.
    pub fn jump_to(&mut self, name: &str) -> Result<usize, DomainError> {
        let index = self
            .position_of(name)
            .ok_or_else(|| DomainError::StepNotFound(name.to_owned()))?;
        self.next_index = index;
        Ok(index)
    }

    /// Position of the step called `name`.
    #[must_use]
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|step| step.name == name)
    }

    /// Returns `true` if a step called `name` exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position_of(name).is_some()
    }

    /// The step most recently returned by [`StepSequencer::advance`].
    #[must_use]
    pub fn current(&self) -> Option<&DemoStep> {
        self.cursor.and_then(|index| self.steps.get(index))
    }

    /// Index of the step most recently returned by [`StepSequencer::advance`].
    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Number of steps in the script.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if the script has no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in script order.
    #[must_use]
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|step| step.name.clone()).collect()
    }
}
