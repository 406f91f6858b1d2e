use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use sagaflow_graph::GraphNode;
use serde_json::Value;

use crate::arguments::Arguments;
use crate::behavior::{InlineStep, StepBehavior};
use crate::context::Context;
use crate::outcome::{IntoStepOutcome, StepError};
use crate::source::ArgumentSource;
use crate::step::StepImplementation;

/// A condition or guard evaluated before a step runs.
pub type Predicate = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Post-processing applied to a resolved argument value.
pub type Transform = Arc<dyn Fn(Value) -> Result<Value, StepError> + Send + Sync>;

/// A declared argument: its source plus an optional transform.
#[derive(Clone)]
pub struct Argument {
    source: ArgumentSource,
    transform: Option<Transform>,
}

impl Argument {
    #[must_use]
    pub fn new(source: ArgumentSource) -> Self {
        Self {
            source,
            transform: None,
        }
    }

    #[must_use]
    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(Value) -> Result<Value, StepError> + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    #[must_use]
    pub fn source(&self) -> &ArgumentSource {
        &self.source
    }

    #[must_use]
    pub fn has_transform(&self) -> bool {
        self.transform.is_some()
    }

    /// Resolve the source, then apply the transform.
    ///
    /// # Errors
    ///
    /// Returns the transform's error. Resolution itself never fails.
    pub fn resolve(&self, context: &Context) -> Result<Value, StepError> {
        let value = self.source.resolve(context);
        match &self.transform {
            Some(transform) => transform(value),
            None => Ok(value),
        }
    }
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("source", &self.source)
            .field("transform", &self.has_transform())
            .finish()
    }
}

/// Immutable description of one workflow step.
#[derive(Clone)]
pub struct StepDefinition {
    name: String,
    arguments: IndexMap<String, Argument>,
    dependencies: Vec<String>,
    conditions: Vec<Predicate>,
    guards: Vec<Predicate>,
    behavior: StepBehavior,
}

impl StepDefinition {
    pub fn builder(name: impl Into<String>) -> StepBuilder {
        StepBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn arguments(&self) -> &IndexMap<String, Argument> {
        &self.arguments
    }

    /// Explicitly declared dependencies, without the ones implied by
    /// argument sources.
    #[must_use]
    pub fn explicit_dependencies(&self) -> &[String] {
        &self.dependencies
    }

    #[must_use]
    pub fn conditions(&self) -> &[Predicate] {
        &self.conditions
    }

    #[must_use]
    pub fn guards(&self) -> &[Predicate] {
        &self.guards
    }

    #[must_use]
    pub fn behavior(&self) -> &StepBehavior {
        &self.behavior
    }

    #[must_use]
    pub fn is_runnable(&self) -> bool {
        self.behavior.is_runnable()
    }
}

impl GraphNode for StepDefinition {
    fn name(&self) -> &str {
        &self.name
    }

    fn dependencies(&self) -> Vec<&str> {
        self.arguments
            .values()
            .filter_map(|argument| argument.source.dependency())
            .chain(self.dependencies.iter().map(String::as_str))
            .collect()
    }
}

impl fmt::Debug for StepDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDefinition")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .field("dependencies", &self.dependencies)
            .field("conditions", &self.conditions.len())
            .field("guards", &self.guards.len())
            .field("behavior", &self.behavior)
            .finish()
    }
}

/// Builder for [`StepDefinition`].
///
/// Setting an [`implementation`](StepBuilder::implementation) replaces any
/// closures given so far, and vice versa.
pub struct StepBuilder {
    name: String,
    arguments: IndexMap<String, Argument>,
    dependencies: Vec<String>,
    conditions: Vec<Predicate>,
    guards: Vec<Predicate>,
    inline: InlineStep,
    delegated: Option<Arc<dyn StepImplementation>>,
}

impl StepBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: IndexMap::new(),
            dependencies: Vec::new(),
            conditions: Vec::new(),
            guards: Vec::new(),
            inline: InlineStep::default(),
            delegated: None,
        }
    }

    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, source: ArgumentSource) -> Self {
        self.arguments.insert(name.into(), Argument::new(source));
        self
    }

    #[must_use]
    pub fn argument_with<F>(
        mut self,
        name: impl Into<String>,
        source: ArgumentSource,
        transform: F,
    ) -> Self
    where
        F: Fn(Value) -> Result<Value, StepError> + Send + Sync + 'static,
    {
        self.arguments
            .insert(name.into(), Argument::new(source).with_transform(transform));
        self
    }

    /// Require `step` to complete first even though no argument reads it.
    #[must_use]
    pub fn depends_on(mut self, step: impl Into<String>) -> Self {
        let step = step.into();
        if !self.dependencies.contains(&step) {
            self.dependencies.push(step);
        }
        self
    }

    /// Only run when `predicate` holds; otherwise the step completes as a
    /// no-op.
    #[must_use]
    pub fn condition<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.conditions.push(Arc::new(predicate));
        self
    }

    /// Like [`condition`](StepBuilder::condition), evaluated after all
    /// conditions.
    #[must_use]
    pub fn guard<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.guards.push(Arc::new(predicate));
        self
    }

    #[must_use]
    pub fn run<F, R>(mut self, run: F) -> Self
    where
        F: Fn(&Arguments, &Context) -> R + Send + Sync + 'static,
        R: IntoStepOutcome,
    {
        self.inline().run = Some(Arc::new(move |arguments: &Arguments, context: &Context| {
            run(arguments, context).into_step_outcome()
        }));
        self
    }

    #[must_use]
    pub fn compensate<F>(mut self, compensate: F) -> Self
    where
        F: Fn(&StepError, &Arguments, &Context) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.inline().compensate = Some(Arc::new(compensate));
        self
    }

    #[must_use]
    pub fn undo<F>(mut self, undo: F) -> Self
    where
        F: Fn(&Value, &Arguments, &Context) -> Result<(), StepError> + Send + Sync + 'static,
    {
        self.inline().undo = Some(Arc::new(undo));
        self
    }

    /// Delegate run, compensate and undo to a named implementation.
    #[must_use]
    pub fn implementation<S>(mut self, implementation: S) -> Self
    where
        S: StepImplementation + 'static,
    {
        self.inline = InlineStep::default();
        self.delegated = Some(Arc::new(implementation));
        self
    }

    #[must_use]
    pub fn build(self) -> StepDefinition {
        StepDefinition {
            name: self.name,
            arguments: self.arguments,
            dependencies: self.dependencies,
            conditions: self.conditions,
            guards: self.guards,
            behavior: match self.delegated {
                Some(implementation) => StepBehavior::Delegated(implementation),
                None => StepBehavior::Inline(self.inline),
            },
        }
    }

    fn inline(&mut self) -> &mut InlineStep {
        self.delegated = None;
        &mut self.inline
    }
}
