//! Demo scripts and their steps.

use std::collections::HashSet;

use democopilot_core::action::ActionSpec;
use democopilot_core::error::DomainError;
use democopilot_core::language_model::ProductContext;
use serde::{Deserialize, Serialize};

/// One narrated unit of a walkthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoStep {
    /// Zero-based position in the script. Assigned when the script is built.
    #[serde(skip)]
    pub position: usize,
    /// Unique name, used as a jump target.
    pub name: String,
    /// Text spoken while the actions run.
    #[serde(default)]
    pub narration: String,
    /// Ordered UI actions.
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
}

impl DemoStep {
    /// Creates a step. Its position is set by [`DemoScript::new`].
    #[must_use]
    pub fn new(name: impl Into<String>, narration: impl Into<String>, actions: Vec<ActionSpec>) -> Self {
        Self {
            position: 0,
            name: name.into(),
            narration: narration.into(),
            actions,
        }
    }
}

/// An ordered, validated sequence of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoScript {
    /// Script title.
    pub name: String,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Product facts forwarded with every question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductContext>,
    /// Steps in execution order.
    pub steps: Vec<DemoStep>,
}

impl DemoScript {
    /// Builds a script, numbering the steps in order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if a step name is blank or used twice.
    pub fn new(name: impl Into<String>, steps: Vec<DemoStep>) -> Result<Self, DomainError> {
        let mut script = Self {
            name: name.into(),
            description: None,
            product: None,
            steps,
        };
        script.validate()?;
        Ok(script)
    }

    /// Parses and validates a YAML script.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the YAML is malformed or a step
    /// name is blank or duplicated.
    pub fn from_yaml(source: &str) -> Result<Self, DomainError> {
        let mut script: Self = serde_yaml::from_str(source)
            .map_err(|e| DomainError::Validation(format!("invalid demo script: {e}")))?;
        script.validate()?;
        Ok(script)
    }

    /// Attaches product facts.
    #[must_use]
    pub fn with_product(mut self, product: ProductContext) -> Self {
        self.product = Some(product);
        self
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<String> {
        self.steps.iter().map(|step| step.name.clone()).collect()
    }

    fn validate(&mut self) -> Result<(), DomainError> {
        let mut seen = HashSet::new();
        for (position, step) in self.steps.iter_mut().enumerate() {
            if step.name.trim().is_empty() {
                return Err(DomainError::Validation(format!(
                    "step {} has no name",
                    position + 1
                )));
            }
            if !seen.insert(step.name.clone()) {
                return Err(DomainError::Validation(format!(
                    "duplicate step name: {}",
                    step.name
                )));
            }
            step.position = position;
        }
        Ok(())
    }
}
