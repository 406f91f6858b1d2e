use std::sync::Arc;

use sagaflow_graph::DependencyGraph;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::arguments::Arguments;
use crate::audit::AuditLog;
use crate::config::ExecutorConfig;
use crate::context::{Context, Inputs};
use crate::definition::StepDefinition;
use crate::error::{DependencyError, UndoError, ValidationError, WorkflowError};
use crate::outcome::StepError;
use crate::recovery::{compensate, roll_back};
use crate::report::{RunReport, RunState};
use crate::unwind::guarded;
use crate::workflow::WorkflowDefinition;

/// Final result of a run: the return step's result (or all results), or the
/// error that ended the run.
pub type ExecutionOutcome = Result<Value, WorkflowError>;

/// Why the run loop stopped early.
enum Failure {
    /// A step's run (or one of its transforms) failed. Goes through
    /// compensation, then rollback.
    Step {
        step: String,
        error: StepError,
        arguments: Arguments,
    },
    /// Anything else. Goes straight to rollback.
    Fatal(WorkflowError),
}

impl From<WorkflowError> for Failure {
    fn from(error: WorkflowError) -> Self {
        Self::Fatal(error)
    }
}

impl From<DependencyError> for Failure {
    fn from(error: DependencyError) -> Self {
        Self::Fatal(error.into())
    }
}

/// Drives exactly one run of one workflow.
///
/// Steps run one at a time. Whenever several steps are ready they run in
/// definition order.
pub struct Executor {
    definition: Arc<WorkflowDefinition>,
    config: ExecutorConfig,
    context: Context,
    state: RunState,
    audit: AuditLog,
    undo_errors: Vec<UndoError>,
    resumed: bool,
}

impl Executor {
    /// Prepare a fresh run against `inputs`.
    #[must_use]
    pub fn new<I, K>(definition: Arc<WorkflowDefinition>, inputs: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let inputs: Inputs = inputs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::with_context(definition, Context::new(inputs), false)
    }

    /// Continue a run from a previously captured context.
    ///
    /// Inputs are not validated again. Steps the context records as completed
    /// are not run again, and its ledger is rolled back if the continued run
    /// fails.
    #[must_use]
    pub fn resume(definition: Arc<WorkflowDefinition>, context: Context) -> Self {
        Self::with_context(definition, context, true)
    }

    fn with_context(definition: Arc<WorkflowDefinition>, context: Context, resumed: bool) -> Self {
        let config = ExecutorConfig::default();
        Self {
            definition,
            audit: audit_log(&config),
            config,
            context,
            state: RunState::Pending,
            undo_errors: Vec::new(),
            resumed,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ExecutorConfig) -> Self {
        self.audit = audit_log(&config);
        self.config = config;
        self
    }

    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Run the workflow to completion or failure.
    pub fn execute(self) -> ExecutionOutcome {
        self.execute_with_report().outcome
    }

    /// Run the workflow and keep the audit log, undo errors and final context.
    #[must_use]
    pub fn execute_with_report(mut self) -> RunReport {
        info!(
            workflow = self.definition.name(),
            resumed = self.resumed,
            "workflow run started"
        );

        let outcome = match self.run() {
            Ok(value) => {
                self.transition(RunState::Completed);
                info!(workflow = self.definition.name(), "workflow run completed");
                Ok(value)
            }
            Err(failure) => {
                let error = self.recover(failure);
                warn!(
                    workflow = self.definition.name(),
                    error = %error,
                    undo_errors = self.undo_errors.len(),
                    "workflow run failed"
                );
                Err(error)
            }
        };

        RunReport {
            outcome,
            state: self.state,
            audit: self.audit,
            undo_errors: self.undo_errors,
            context: self.context,
        }
    }

    fn run(&mut self) -> Result<Value, Failure> {
        if !self.resumed {
            self.transition(RunState::Validating);
            self.validate_inputs()?;
        }

        self.transition(RunState::BuildingGraph);
        let mut graph = self.build_graph()?;

        self.transition(RunState::Executing);
        self.run_loop(&mut graph)?;

        Ok(self.final_value())
    }

    fn validate_inputs(&mut self) -> Result<(), WorkflowError> {
        let definition = Arc::clone(&self.definition);

        for (name, declaration) in definition.inputs() {
            if !declaration.optional && !self.context.inputs().contains_key(name) {
                return Err(ValidationError::MissingInput { name: name.clone() }.into());
            }
        }

        if let Some(validator) = definition.validator() {
            let validated = guarded(|| validator.validate(self.context.inputs())).map_err(
                |panic| WorkflowError::Execution {
                    step: None,
                    message: format!("input validator panicked: {panic}"),
                },
            )?;
            let inputs = validated.map_err(ValidationError::Rejected)?;
            self.context.replace_inputs(inputs);
        }

        Ok(())
    }

    fn build_graph(&self) -> Result<DependencyGraph, DependencyError> {
        let mut graph = DependencyGraph::new();
        for step in self.definition.steps().values() {
            graph.add_step(step);
        }

        if let Some(step) = self.definition.steps().values().find(|s| !s.is_runnable()) {
            return Err(DependencyError::MissingBehavior {
                step: step.name().to_string(),
            });
        }
        if let Some(path) = graph.find_cycle() {
            return Err(DependencyError::Cycle { path });
        }
        if let Some((step, dependency)) = graph.missing_dependencies().first() {
            return Err(DependencyError::UnknownDependency {
                step: (*step).to_string(),
                dependency: (*dependency).to_string(),
            });
        }

        if self.resumed {
            for step in self.context.completed_steps() {
                if !graph.complete_step(step) {
                    warn!(step, "resumed context names a step outside the workflow");
                }
            }
        }

        Ok(graph)
    }

    fn run_loop(&mut self, graph: &mut DependencyGraph) -> Result<(), Failure> {
        let definition = Arc::clone(&self.definition);
        let mut iterations = 0_usize;

        while !graph.all_completed() {
            iterations += 1;
            if let Some(limit) = self.config.max_iterations() {
                if iterations > limit {
                    return Err(DependencyError::IterationLimit { limit }.into());
                }
            }

            let ready: Vec<String> = graph.ready_steps().into_iter().map(String::from).collect();
            if ready.is_empty() {
                let pending = graph.pending_steps().into_iter().map(String::from).collect();
                return Err(DependencyError::Stalled { pending }.into());
            }

            for name in ready {
                let Some(step) = definition.step(&name) else {
                    return Err(WorkflowError::Execution {
                        step: Some(name),
                        message: "ready step is missing from the workflow definition".to_string(),
                    }
                    .into());
                };
                self.execute_step(step)?;
                graph.complete_step(&name);
            }
        }

        Ok(())
    }

    /// Execute one step with the current-step marker set for its duration.
    fn execute_step(&mut self, step: &StepDefinition) -> Result<(), Failure> {
        let previous = self.context.enter_step(step.name());
        let result = self.execute_marked_step(step);
        self.context.leave_step(previous);
        result
    }

    fn execute_marked_step(&mut self, step: &StepDefinition) -> Result<(), Failure> {
        let name = step.name();
        self.audit.record_start(name);
        debug!(step = name, "step started");

        if let Some(reason) = self.skip_reason(step)? {
            debug!(step = name, reason, "step skipped");
            self.audit.record_skipped(name, reason);
            self.context.record_skip(name);
            return Ok(());
        }

        let arguments = self.resolve_arguments(step)?;
        if self.config.log_arguments() {
            let shown = Value::from(arguments.clone());
            debug!(step = name, arguments = %shown, "arguments resolved");
        }

        let implementation = step.behavior().implementation();
        let outcome = guarded(|| implementation.run(&arguments, &self.context))
            .map_err(|panic| self.panicked(name, &panic))?;

        match outcome.into_result() {
            Ok(result) => {
                self.context.record_success(name, arguments, result);
                self.audit
                    .record_completed(name, implementation.undo_description(name));
                debug!(step = name, "step completed");
                Ok(())
            }
            Err(error) => {
                warn!(step = name, error = %error, "step failed");
                self.audit.record_failure(name, error.message());
                Err(Failure::Step {
                    step: name.to_string(),
                    error,
                    arguments,
                })
            }
        }
    }

    /// First reason to skip the step: a false condition, then a false guard.
    fn skip_reason(&mut self, step: &StepDefinition) -> Result<Option<&'static str>, Failure> {
        let checks = step
            .conditions()
            .iter()
            .map(|predicate| (predicate, "condition not met"))
            .chain(
                step.guards()
                    .iter()
                    .map(|predicate| (predicate, "guard rejected")),
            );

        for (predicate, reason) in checks {
            let allowed = guarded(|| predicate(&self.context))
                .map_err(|panic| self.panicked(step.name(), &panic))?;
            if !allowed {
                return Ok(Some(reason));
            }
        }
        Ok(None)
    }

    /// Resolve every argument independently, then apply its transform.
    fn resolve_arguments(&mut self, step: &StepDefinition) -> Result<Arguments, Failure> {
        let mut arguments = Arguments::new();

        for (argument_name, argument) in step.arguments() {
            let resolved = guarded(|| argument.resolve(&self.context))
                .map_err(|panic| self.panicked(step.name(), &panic))?;
            match resolved {
                Ok(value) => arguments.insert(argument_name.clone(), value),
                Err(error) => {
                    let error = StepError::new(format!(
                        "argument '{argument_name}' could not be transformed: {error}"
                    ));
                    warn!(step = step.name(), error = %error, "argument transform failed");
                    self.audit.record_failure(step.name(), error.message());
                    return Err(Failure::Step {
                        step: step.name().to_string(),
                        error,
                        arguments,
                    });
                }
            }
        }

        Ok(arguments)
    }

    fn panicked(&mut self, step: &str, panic: &str) -> Failure {
        warn!(step, panic, "step panicked");
        self.audit.record_failure(step, panic);
        Failure::Fatal(WorkflowError::Execution {
            step: Some(step.to_string()),
            message: format!("step '{step}' panicked: {panic}"),
        })
    }

    /// Compensate (for step failures), roll back, and produce the run error.
    fn recover(&mut self, failure: Failure) -> WorkflowError {
        let definition = Arc::clone(&self.definition);

        let error = match failure {
            Failure::Step {
                step,
                error,
                arguments,
            } => {
                self.transition(RunState::Compensating);
                let compensation = definition.step(&step).map_or(Ok(()), |failed| {
                    compensate(failed, &error, &arguments, &self.context, &mut self.audit)
                });
                match compensation {
                    Ok(()) => WorkflowError::StepFailed {
                        step,
                        source: error,
                    },
                    Err(compensation_error) => WorkflowError::CompensationFailed {
                        step,
                        step_error: error,
                        compensation_error,
                    },
                }
            }
            Failure::Fatal(error) => error,
        };

        self.transition(RunState::RollingBack);
        let undo_errors = roll_back(&definition, &mut self.context, &mut self.audit);
        self.undo_errors.extend(undo_errors);

        self.transition(RunState::Failed);
        error
    }

    fn final_value(&self) -> Value {
        match self.definition.return_step() {
            Some(step) => self.context.result(step).clone(),
            None => self.context.results_value(),
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!(
            workflow = self.definition.name(),
            from = %self.state,
            to = %next,
            "run state changed"
        );
        self.state = next;
    }
}

fn audit_log(config: &ExecutorConfig) -> AuditLog {
    if config.audit() {
        AuditLog::new()
    } else {
        AuditLog::disabled()
    }
}
