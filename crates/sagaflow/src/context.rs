use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::arguments::Arguments;

/// Workflow inputs by name.
pub type Inputs = IndexMap<String, Value>;

static NULL: Value = Value::Null;

/// One successfully completed step, kept for rollback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Logical completion timestamp; strictly increasing within a run.
    pub sequence: u64,
    pub step: String,
    pub arguments: Arguments,
    pub result: Value,
}

/// Mutable state of a single workflow run.
///
/// Serializes to a plain structure (inputs, results, completed steps and the
/// ledger) so a run can be handed off and resumed with
/// [`Executor::resume`](crate::Executor::resume).
/// The current-step marker only exists while a step executes and is not
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    inputs: Inputs,
    results: IndexMap<String, Value>,
    completed: IndexSet<String>,
    ledger: Vec<LedgerEntry>,
    next_sequence: u64,
    #[serde(skip)]
    current_step: Option<String>,
}

impl Context {
    #[must_use]
    pub fn new(inputs: Inputs) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    /// A workflow input, `null` when absent.
    #[must_use]
    pub fn input(&self, name: &str) -> &Value {
        self.inputs.get(name).unwrap_or(&NULL)
    }

    #[must_use]
    pub fn inputs(&self) -> &Inputs {
        &self.inputs
    }

    /// A step's recorded result, `null` when the step has not produced one.
    #[must_use]
    pub fn result(&self, step: &str) -> &Value {
        self.results.get(step).unwrap_or(&NULL)
    }

    #[must_use]
    pub fn has_result(&self, step: &str) -> bool {
        self.results.contains_key(step)
    }

    #[must_use]
    pub fn results(&self) -> &IndexMap<String, Value> {
        &self.results
    }

    /// Name of the step currently executing, if any.
    #[must_use]
    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    /// Completed entries, oldest first.
    #[must_use]
    pub fn ledger(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    /// Steps that completed, including skipped ones, in completion order.
    pub fn completed_steps(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    #[must_use]
    pub fn is_completed(&self, step: &str) -> bool {
        self.completed.contains(step)
    }

    /// All intermediate results as a JSON object.
    #[must_use]
    pub fn results_value(&self) -> Value {
        Value::Object(
            self.results
                .iter()
                .map(|(step, value)| (step.clone(), value.clone()))
                .collect(),
        )
    }

    /// Serialize the run state to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if a stored value cannot be serialized.
    pub fn snapshot(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Rebuild a context from [`Context::snapshot`] output.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is not valid context JSON.
    pub fn from_snapshot(snapshot: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(snapshot)
    }

    pub(crate) fn replace_inputs(&mut self, inputs: Inputs) {
        self.inputs = inputs;
    }

    pub(crate) fn record_success(&mut self, step: &str, arguments: Arguments, result: Value) {
        self.results.insert(step.to_string(), result.clone());
        self.completed.insert(step.to_string());
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.ledger.push(LedgerEntry {
            sequence,
            step: step.to_string(),
            arguments,
            result,
        });
    }

    pub(crate) fn record_skip(&mut self, step: &str) {
        self.completed.insert(step.to_string());
    }

    /// Set the current-step marker, returning the previous one.
    pub(crate) fn enter_step(&mut self, step: &str) -> Option<String> {
        self.current_step.replace(step.to_string())
    }

    pub(crate) fn leave_step(&mut self, previous: Option<String>) {
        self.current_step = previous;
    }

    /// Remove and return the ledger, newest entry first.
    pub(crate) fn take_ledger_for_rollback(&mut self) -> Vec<LedgerEntry> {
        let mut entries = std::mem::take(&mut self.ledger);
        entries.sort_by_key(|entry| std::cmp::Reverse(entry.sequence));
        entries
    }

    /// Forget every result and completion once a rollback has undone them.
    ///
    /// Only the inputs survive, so resuming the context starts over.
    pub(crate) fn discard_progress(&mut self) {
        self.results.clear();
        self.completed.clear();
        self.ledger.clear();
    }
}
