//! Saga-pattern workflow orchestration.
//!
//! A workflow is a set of named steps. Each step declares where its arguments
//! come from (workflow inputs, other steps' results, or literals), and the
//! executor derives a dependency graph from those declarations, runs steps in
//! a valid order, and on failure unwinds what already happened:
//!
//! 1. the failing step's own compensation runs,
//! 2. every previously completed step is undone in reverse completion order,
//! 3. anything unexpected (a panic in a step, validator or transform) still
//!    triggers the rollback and surfaces as an execution failure.
//!
//! ```
//! use sagaflow::{ArgumentSource, Executor, StepDefinition, StepOutcome, WorkflowDefinition};
//! use serde_json::json;
//!
//! let workflow = WorkflowDefinition::builder("greet")
//!     .input("name")
//!     .step(
//!         StepDefinition::builder("greeting")
//!             .argument("name", ArgumentSource::input("name"))
//!             .run(|args, _ctx| {
//!                 let name = args.get_str("name").unwrap_or("stranger");
//!                 StepOutcome::success(json!(format!("hello {name}")))
//!             })
//!             .build(),
//!     )
//!     .return_step("greeting")
//!     .build()
//!     .expect("valid workflow");
//!
//! let outcome = Executor::new(workflow.into(), [("name", json!("ada"))]).execute();
//! assert_eq!(outcome.expect("success"), json!("hello ada"));
//! ```

mod arguments;
mod audit;
mod behavior;
mod config;
mod context;
mod definition;
mod error;
mod executor;
mod outcome;
mod path;
mod recovery;
mod report;
mod source;
mod step;
mod unwind;
mod validator;
mod workflow;

pub use arguments::Arguments;
pub use audit::{AuditLog, StepRecord, StepStatus};
pub use behavior::{InlineStep, StepBehavior};
pub use config::{ConfigError, ExecutorConfig};
pub use context::{Context, Inputs, LedgerEntry};
pub use definition::{Argument, Predicate, StepBuilder, StepDefinition, Transform};
pub use error::{
    DefinitionError, DependencyError, FailureKind, UndoError, ValidationError, WorkflowError,
};
pub use executor::{ExecutionOutcome, Executor};
pub use outcome::{IntoStepOutcome, StepError, StepOutcome};
pub use path::ValuePath;
pub use report::{RunReport, RunState};
pub use source::ArgumentSource;
pub use step::StepImplementation;
pub use validator::{FieldErrors, InputValidator};
pub use workflow::{InputDeclaration, WorkflowBuilder, WorkflowDefinition};
