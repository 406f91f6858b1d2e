use thiserror::Error;

use crate::outcome::StepError;
use crate::validator::FieldErrors;

/// Inputs were rejected before any step ran.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("missing required input '{name}'")]
    MissingInput { name: String },

    /// The configured input validator rejected the inputs. Its field errors
    /// are passed through untouched.
    #[error("input validation failed: {0}")]
    Rejected(FieldErrors),
}

/// The dependency graph cannot be executed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DependencyError {
    #[error("dependency cycle detected: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("step '{step}' depends on unknown step '{dependency}'")]
    UnknownDependency { step: String, dependency: String },

    #[error("step '{step}' has neither a run behavior nor an implementation")]
    MissingBehavior { step: String },

    #[error("no steps are ready but {} remain pending: {}", pending.len(), pending.join(", "))]
    Stalled { pending: Vec<String> },

    #[error("run loop exceeded {limit} iterations")]
    IterationLimit { limit: usize },
}

/// A workflow definition could not be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DefinitionError {
    #[error("step '{name}' is declared more than once")]
    DuplicateStep { name: String },

    #[error("input '{name}' is declared more than once")]
    DuplicateInput { name: String },

    #[error("return step '{name}' is not a declared step")]
    UnknownReturnStep { name: String },
}

/// An undo failed during rollback.
///
/// Never fatal: the rollback carries on with earlier steps and the run's
/// outcome is still the failure that triggered the rollback.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("undo of step '{step}' failed: {source}")]
pub struct UndoError {
    pub step: String,
    #[source]
    pub source: StepError,
}

/// Severity class of a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    Dependency,
    StepFailure,
    Compensation,
    Execution,
}

/// Error from a workflow run.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Dependency(#[from] DependencyError),

    /// A step failed and its compensation succeeded.
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: StepError,
    },

    /// A step failed and its compensation failed as well.
    #[error("Step '{step}' failed: {step_error}; compensation also failed: {compensation_error}")]
    CompensationFailed {
        step: String,
        step_error: StepError,
        compensation_error: StepError,
    },

    /// Something other than a step failure went wrong, e.g. a panic inside a
    /// step behavior or the input validator.
    #[error("execution failed: {message}")]
    Execution {
        step: Option<String>,
        message: String,
    },
}

impl WorkflowError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Validation(_) => FailureKind::Validation,
            Self::Dependency(_) => FailureKind::Dependency,
            Self::StepFailed { .. } => FailureKind::StepFailure,
            Self::CompensationFailed { .. } => FailureKind::Compensation,
            Self::Execution { .. } => FailureKind::Execution,
        }
    }

    /// Name of the step the failure originated in, if any.
    #[must_use]
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step, .. } | Self::CompensationFailed { step, .. } => {
                Some(step.as_str())
            }
            Self::Execution { step, .. } => step.as_deref(),
            Self::Validation(_) | Self::Dependency(_) => None,
        }
    }
}
