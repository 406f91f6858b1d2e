use serde_json::Value;

use crate::context::Context;
use crate::path::ValuePath;

/// Where a step argument's value comes from.
#[derive(Debug, Clone)]
pub enum ArgumentSource {
    /// A workflow input, optionally drilled into.
    FromInput {
        name: String,
        path: Option<ValuePath>,
    },
    /// Another step's recorded result, optionally drilled into. Creates a
    /// dependency on that step.
    FromResult {
        step: String,
        path: Option<ValuePath>,
    },
    /// A fixed value.
    Literal(Value),
}

impl ArgumentSource {
    pub fn input(name: impl Into<String>) -> Self {
        Self::FromInput {
            name: name.into(),
            path: None,
        }
    }

    pub fn result(step: impl Into<String>) -> Self {
        Self::FromResult {
            step: step.into(),
            path: None,
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Drill into the referenced value. Has no effect on literals.
    #[must_use]
    pub fn at(mut self, path: impl Into<ValuePath>) -> Self {
        match &mut self {
            Self::FromInput { path: slot, .. } | Self::FromResult { path: slot, .. } => {
                *slot = Some(path.into());
            }
            Self::Literal(_) => {}
        }
        self
    }

    /// The step this source reads from, if any.
    #[must_use]
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Self::FromResult { step, .. } => Some(step.as_str()),
            Self::FromInput { .. } | Self::Literal(_) => None,
        }
    }

    /// Resolve against the run's context. Absent inputs, absent results and
    /// misses along the path all resolve to `null`.
    #[must_use]
    pub fn resolve(&self, context: &Context) -> Value {
        match self {
            Self::FromInput { name, path } => extract(context.input(name), path.as_ref()),
            Self::FromResult { step, path } => extract(context.result(step), path.as_ref()),
            Self::Literal(value) => value.clone(),
        }
    }
}

fn extract(value: &Value, path: Option<&ValuePath>) -> Value {
    match path {
        Some(path) => path.extract(value),
        None => value.clone(),
    }
}
