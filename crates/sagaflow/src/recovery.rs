use tracing::{debug, warn};

use crate::arguments::Arguments;
use crate::audit::AuditLog;
use crate::context::Context;
use crate::definition::StepDefinition;
use crate::error::UndoError;
use crate::outcome::StepError;
use crate::unwind::guarded;
use crate::workflow::WorkflowDefinition;

/// Run the failed step's own compensation.
///
/// A panic inside compensation counts as a failed compensation.
pub(crate) fn compensate(
    step: &StepDefinition,
    error: &StepError,
    arguments: &Arguments,
    context: &Context,
    audit: &mut AuditLog,
) -> Result<(), StepError> {
    let implementation = step.behavior().implementation();
    let result = guarded(|| implementation.compensate(error, arguments, context))
        .unwrap_or_else(|panic| Err(StepError::new(format!("compensation panicked: {panic}"))));

    match result {
        Ok(()) => {
            debug!(step = step.name(), "compensation succeeded");
            audit.record_compensated(step.name());
            Ok(())
        }
        Err(compensation_error) => {
            warn!(
                step = step.name(),
                error = %error,
                compensation_error = %compensation_error,
                "compensation failed"
            );
            audit.record_compensation_failed(step.name(), compensation_error.message());
            Err(compensation_error)
        }
    }
}

/// Undo every ledger entry, newest first, then drop all recorded progress
/// from the context.
///
/// Undo failures are collected and never stop the rollback.
pub(crate) fn roll_back(
    definition: &WorkflowDefinition,
    context: &mut Context,
    audit: &mut AuditLog,
) -> Vec<UndoError> {
    let entries = context.take_ledger_for_rollback();
    let mut undo_errors = Vec::new();

    for entry in entries {
        let Some(step) = definition.step(&entry.step) else {
            warn!(step = %entry.step, "cannot undo step missing from the workflow definition");
            undo_errors.push(UndoError {
                step: entry.step.clone(),
                source: StepError::new("step is not part of the workflow definition"),
            });
            continue;
        };

        let implementation = step.behavior().implementation();
        let result = guarded(|| implementation.undo(&entry.result, &entry.arguments, context))
            .unwrap_or_else(|panic| Err(StepError::new(format!("undo panicked: {panic}"))));

        match result {
            Ok(()) => {
                debug!(step = %entry.step, sequence = entry.sequence, "step undone");
                audit.record_undone(&entry.step);
            }
            Err(source) => {
                warn!(step = %entry.step, error = %source, "undo failed, continuing rollback");
                audit.record_undo_failed(&entry.step, source.message());
                undo_errors.push(UndoError {
                    step: entry.step.clone(),
                    source,
                });
            }
        }
    }

    context.discard_progress();
    undo_errors
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use serde_json::json;

    use super::*;
    use crate::audit::StepStatus;

    fn recording_step(
        name: &'static str,
        log: &Arc<Mutex<Vec<String>>>,
        fail_undo: bool,
    ) -> StepDefinition {
        let log = Arc::clone(log);
        StepDefinition::builder(name)
            .run(|_, _| json!(null))
            .undo(move |result, _, _| {
                log.lock().expect("log lock").push(format!("undo {name} {result}"));
                if fail_undo {
                    Err(StepError::new(format!("{name} cannot be undone")))
                } else {
                    Ok(())
                }
            })
            .build()
    }

    #[test]
    fn rollback_runs_newest_first_and_survives_undo_failure() -> anyhow::Result<()> {
        let log = Arc::new(Mutex::new(Vec::new()));
        let workflow = WorkflowDefinition::builder("rollback")
            .step(recording_step("a", &log, false))
            .step(recording_step("b", &log, true))
            .step(recording_step("c", &log, false))
            .build()?;

        let mut context = Context::default();
        context.record_success("a", Arguments::new(), json!(1));
        context.record_success("b", Arguments::new(), json!(2));
        context.record_success("c", Arguments::new(), json!(3));
        let mut audit = AuditLog::new();
        for name in ["a", "b", "c"] {
            audit.record_start(name);
        }

        let undo_errors = roll_back(&workflow, &mut context, &mut audit);

        let log = log.lock().expect("log lock");
        assert_eq!(*log, vec!["undo c 3", "undo b 2", "undo a 1"]);
        assert_eq!(undo_errors.len(), 1);
        assert_eq!(undo_errors[0].step, "b");
        assert!(context.ledger().is_empty());
        assert!(!context.has_result("a"));
        assert_eq!(context.completed_steps().count(), 0);
        assert_eq!(audit.records()[1].status, StepStatus::UndoFailed);
        assert_eq!(audit.records()[0].status, StepStatus::Undone);
        Ok(())
    }

    #[test]
    fn panicking_compensation_is_a_compensation_failure() {
        let step = StepDefinition::builder("explosive")
            .run(|_, _| json!(null))
            .compensate(|_, _, _| panic!("kaboom"))
            .build();
        let mut audit = AuditLog::new();
        audit.record_start("explosive");

        let error = compensate(
            &step,
            &StepError::new("run failed"),
            &Arguments::new(),
            &Context::default(),
            &mut audit,
        )
        .expect_err("compensation panicked");

        assert_eq!(error.message(), "compensation panicked: kaboom");
        assert_eq!(audit.records()[0].status, StepStatus::CompensationFailed);
    }

    #[test]
    fn missing_compensation_is_accepted() {
        let step = StepDefinition::builder("plain")
            .run(|_, _| json!(null))
            .build();
        let mut audit = AuditLog::new();

        assert!(
            compensate(
                &step,
                &StepError::new("run failed"),
                &Arguments::new(),
                &Context::default(),
                &mut audit,
            )
            .is_ok()
        );
    }
}
