use std::fmt;

use crate::audit::AuditLog;
use crate::context::Context;
use crate::error::UndoError;
use crate::executor::ExecutionOutcome;

/// Lifecycle of a single run.
///
/// `Pending → Validating → BuildingGraph → Executing → Completed`, or on
/// failure `… → Compensating → RollingBack → Failed`. Failures that are not
/// a step failure skip `Compensating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Validating,
    BuildingGraph,
    Executing,
    Compensating,
    RollingBack,
    Completed,
    Failed,
}

impl RunState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Validating => "validating",
            Self::BuildingGraph => "building-graph",
            Self::Executing => "executing",
            Self::Compensating => "compensating",
            Self::RollingBack => "rolling-back",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    pub outcome: ExecutionOutcome,
    /// Terminal state of the run.
    pub state: RunState,
    pub audit: AuditLog,
    /// Undo failures collected during rollback. Never affect the outcome.
    pub undo_errors: Vec<UndoError>,
    /// Final run state. After a failure only the inputs remain.
    pub context: Context,
}

impl RunReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}
