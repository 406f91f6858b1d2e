use serde_json::Value;

use crate::arguments::Arguments;
use crate::context::Context;
use crate::outcome::{StepError, StepOutcome};

/// A named step implementation that can run, compensate and undo.
///
/// Implement this for steps that carry their own state or dependencies;
/// closures set on [`StepBuilder`](crate::StepBuilder) are wrapped into the
/// same trait.
pub trait StepImplementation: Send + Sync {
    /// Perform the step.
    fn run(&self, arguments: &Arguments, context: &Context) -> StepOutcome;

    /// Handle this step's own failure, e.g. release a partially acquired
    /// resource.
    ///
    /// The default accepts the failure and lets rollback proceed.
    ///
    /// # Errors
    ///
    /// Returns an error if compensation fails; the run then reports a
    /// compensation failure instead of a plain step failure.
    fn compensate(
        &self,
        error: &StepError,
        arguments: &Arguments,
        context: &Context,
    ) -> Result<(), StepError> {
        let _ = (error, arguments, context);
        Ok(())
    }

    /// Reverse the effect of a previous successful run because a later step
    /// failed. Receives the result the run produced.
    ///
    /// The default is a no-op, suitable for read-only steps.
    ///
    /// # Errors
    ///
    /// Returns an error if the undo fails. Rollback continues regardless.
    fn undo(
        &self,
        result: &Value,
        arguments: &Arguments,
        context: &Context,
    ) -> Result<(), StepError> {
        let _ = (result, arguments, context);
        Ok(())
    }

    /// Human-readable description of what undo will do.
    fn undo_description(&self, step: &str) -> String {
        format!("undo {step}")
    }
}
