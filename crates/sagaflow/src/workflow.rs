use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::definition::StepDefinition;
use crate::error::DefinitionError;
use crate::validator::InputValidator;

/// Declaration of a workflow input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputDeclaration {
    pub optional: bool,
}

impl InputDeclaration {
    #[must_use]
    pub fn required() -> Self {
        Self { optional: false }
    }

    #[must_use]
    pub fn optional() -> Self {
        Self { optional: true }
    }
}

/// Immutable definition of a workflow type, shared by all of its runs.
#[derive(Clone)]
pub struct WorkflowDefinition {
    name: String,
    inputs: IndexMap<String, InputDeclaration>,
    steps: IndexMap<String, StepDefinition>,
    return_step: Option<String>,
    validator: Option<Arc<dyn InputValidator>>,
}

impl WorkflowDefinition {
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn inputs(&self) -> &IndexMap<String, InputDeclaration> {
        &self.inputs
    }

    /// Steps in definition order.
    #[must_use]
    pub fn steps(&self) -> &IndexMap<String, StepDefinition> {
        &self.steps
    }

    #[must_use]
    pub fn step(&self, name: &str) -> Option<&StepDefinition> {
        self.steps.get(name)
    }

    #[must_use]
    pub fn return_step(&self) -> Option<&str> {
        self.return_step.as_deref()
    }

    #[must_use]
    pub fn validator(&self) -> Option<&dyn InputValidator> {
        self.validator.as_deref()
    }
}

impl fmt::Debug for WorkflowDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowDefinition")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .field("return_step", &self.return_step)
            .field("validator", &self.validator.is_some())
            .finish()
    }
}

/// Builder for [`WorkflowDefinition`].
pub struct WorkflowBuilder {
    name: String,
    inputs: Vec<(String, InputDeclaration)>,
    steps: Vec<StepDefinition>,
    return_step: Option<String>,
    validator: Option<Arc<dyn InputValidator>>,
}

impl WorkflowBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            steps: Vec::new(),
            return_step: None,
            validator: None,
        }
    }

    /// Declare a required input.
    #[must_use]
    pub fn input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push((name.into(), InputDeclaration::required()));
        self
    }

    #[must_use]
    pub fn optional_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push((name.into(), InputDeclaration::optional()));
        self
    }

    #[must_use]
    pub fn step(mut self, step: StepDefinition) -> Self {
        self.steps.push(step);
        self
    }

    /// Make the run's success value this step's result instead of all
    /// results.
    #[must_use]
    pub fn return_step(mut self, name: impl Into<String>) -> Self {
        self.return_step = Some(name.into());
        self
    }

    #[must_use]
    pub fn validator<V>(mut self, validator: V) -> Self
    where
        V: InputValidator + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// # Errors
    ///
    /// Returns an error for duplicate step or input names, or a return step
    /// that is not declared.
    pub fn build(self) -> Result<WorkflowDefinition, DefinitionError> {
        let mut inputs = IndexMap::with_capacity(self.inputs.len());
        for (name, declaration) in self.inputs {
            if inputs.contains_key(&name) {
                return Err(DefinitionError::DuplicateInput { name });
            }
            inputs.insert(name, declaration);
        }

        let mut steps = IndexMap::with_capacity(self.steps.len());
        for step in self.steps {
            if steps.contains_key(step.name()) {
                return Err(DefinitionError::DuplicateStep {
                    name: step.name().to_string(),
                });
            }
            steps.insert(step.name().to_string(), step);
        }

        if let Some(name) = &self.return_step {
            if !steps.contains_key(name) {
                return Err(DefinitionError::UnknownReturnStep { name: name.clone() });
            }
        }

        Ok(WorkflowDefinition {
            name: self.name,
            inputs,
            steps,
            return_step: self.return_step,
            validator: self.validator,
        })
    }
}
