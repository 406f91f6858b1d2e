use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::arguments::Arguments;
use crate::context::Context;
use crate::outcome::{StepError, StepOutcome};
use crate::step::StepImplementation;

pub(crate) type RunFn = Arc<dyn Fn(&Arguments, &Context) -> StepOutcome + Send + Sync>;
pub(crate) type CompensateFn =
    Arc<dyn Fn(&StepError, &Arguments, &Context) -> Result<(), StepError> + Send + Sync>;
pub(crate) type UndoFn =
    Arc<dyn Fn(&Value, &Arguments, &Context) -> Result<(), StepError> + Send + Sync>;

/// Run, compensate and undo given as closures.
#[derive(Clone, Default)]
pub struct InlineStep {
    pub(crate) run: Option<RunFn>,
    pub(crate) compensate: Option<CompensateFn>,
    pub(crate) undo: Option<UndoFn>,
}

impl InlineStep {
    #[must_use]
    pub fn has_run(&self) -> bool {
        self.run.is_some()
    }

    #[must_use]
    pub fn has_compensate(&self) -> bool {
        self.compensate.is_some()
    }

    #[must_use]
    pub fn has_undo(&self) -> bool {
        self.undo.is_some()
    }
}

impl StepImplementation for InlineStep {
    fn run(&self, arguments: &Arguments, context: &Context) -> StepOutcome {
        match &self.run {
            Some(run) => run(arguments, context),
            None => StepOutcome::failure("step has no run behavior"),
        }
    }

    fn compensate(
        &self,
        error: &StepError,
        arguments: &Arguments,
        context: &Context,
    ) -> Result<(), StepError> {
        match &self.compensate {
            Some(compensate) => compensate(error, arguments, context),
            None => Ok(()),
        }
    }

    fn undo(
        &self,
        result: &Value,
        arguments: &Arguments,
        context: &Context,
    ) -> Result<(), StepError> {
        match &self.undo {
            Some(undo) => undo(result, arguments, context),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for InlineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineStep")
            .field("run", &self.has_run())
            .field("compensate", &self.has_compensate())
            .field("undo", &self.has_undo())
            .finish()
    }
}

/// Where a step's behavior comes from.
#[derive(Clone)]
pub enum StepBehavior {
    Inline(InlineStep),
    Delegated(Arc<dyn StepImplementation>),
}

impl StepBehavior {
    /// Whether the step can actually run.
    #[must_use]
    pub fn is_runnable(&self) -> bool {
        match self {
            Self::Inline(inline) => inline.has_run(),
            Self::Delegated(_) => true,
        }
    }

    #[must_use]
    pub fn implementation(&self) -> &dyn StepImplementation {
        match self {
            Self::Inline(inline) => inline,
            Self::Delegated(implementation) => implementation.as_ref(),
        }
    }
}

impl Default for StepBehavior {
    fn default() -> Self {
        Self::Inline(InlineStep::default())
    }
}

impl fmt::Debug for StepBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(inline) => f.debug_tuple("Inline").field(inline).finish(),
            Self::Delegated(_) => f.write_str("Delegated"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct Echo;

    impl StepImplementation for Echo {
        fn run(&self, arguments: &Arguments, _context: &Context) -> StepOutcome {
            StepOutcome::success(arguments.get("value").clone())
        }

        fn undo_description(&self, step: &str) -> String {
            format!("forget {step}")
        }
    }

    #[test]
    fn inline_without_run_is_not_runnable() {
        let behavior = StepBehavior::default();
        assert!(!behavior.is_runnable());
    }

    #[test]
    fn inline_defaults_accept_compensation_and_undo() {
        let inline = InlineStep {
            run: Some(Arc::new(|_: &Arguments, _: &Context| {
                StepOutcome::success(json!(1))
            })),
            ..InlineStep::default()
        };
        let ctx = Context::default();
        let args = Arguments::new();

        assert!(inline.compensate(&StepError::new("x"), &args, &ctx).is_ok());
        assert!(inline.undo(&json!(1), &args, &ctx).is_ok());
        assert_eq!(inline.run(&args, &ctx), StepOutcome::Success(json!(1)));
    }

    #[test]
    fn delegated_implementation_is_used() {
        let behavior = StepBehavior::Delegated(Arc::new(Echo));
        let args: Arguments = [("value", json!("hi"))].into_iter().collect();

        assert!(behavior.is_runnable());
        assert_eq!(
            behavior.implementation().run(&args, &Context::default()),
            StepOutcome::Success(json!("hi"))
        );
        assert_eq!(behavior.implementation().undo_description("x"), "forget x");
    }
}
