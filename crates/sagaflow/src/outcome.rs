use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error reported by a step behavior, a transform, or a compensation/undo.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct StepError {
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

impl StepError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured data to the error, e.g. the offending value.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }
}

impl From<String> for StepError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for StepError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for StepError {
    fn from(error: serde_json::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// What a step's run behavior produced.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Explicit success carrying the step's result.
    Success(Value),
    /// Explicit failure; triggers compensation and rollback.
    Failure(StepError),
    /// A plain value returned without a success/failure wrapper.
    ///
    /// Treated exactly like [`StepOutcome::Success`].
    Raw(Value),
}

impl StepOutcome {
    pub fn success(value: impl Into<Value>) -> Self {
        Self::Success(value.into())
    }

    pub fn failure(error: impl Into<StepError>) -> Self {
        Self::Failure(error.into())
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }

    /// Collapse into a `Result`, treating a raw value as success.
    ///
    /// # Errors
    ///
    /// Returns the step error for [`StepOutcome::Failure`].
    pub fn into_result(self) -> Result<Value, StepError> {
        match self {
            Self::Success(value) | Self::Raw(value) => Ok(value),
            Self::Failure(error) => Err(error),
        }
    }
}

/// Conversion from whatever a run behavior returns into a [`StepOutcome`].
pub trait IntoStepOutcome {
    fn into_step_outcome(self) -> StepOutcome;
}

impl IntoStepOutcome for StepOutcome {
    fn into_step_outcome(self) -> StepOutcome {
        self
    }
}

impl<E> IntoStepOutcome for Result<Value, E>
where
    E: Into<StepError>,
{
    fn into_step_outcome(self) -> StepOutcome {
        match self {
            Ok(value) => StepOutcome::Success(value),
            Err(error) => StepOutcome::Failure(error.into()),
        }
    }
}

impl IntoStepOutcome for Value {
    fn into_step_outcome(self) -> StepOutcome {
        StepOutcome::Raw(self)
    }
}

impl IntoStepOutcome for () {
    fn into_step_outcome(self) -> StepOutcome {
        StepOutcome::Raw(Value::Null)
    }
}
