use std::time::Instant;

/// Status of a step in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Step is executing.
    Running,
    /// Step ran successfully.
    Completed,
    /// A condition or guard was false; the step completed as a no-op.
    Skipped,
    /// Step run failed.
    Failed,
    /// The failed step's compensation succeeded.
    Compensated,
    /// The failed step's compensation failed.
    CompensationFailed,
    /// The completed step was undone during rollback.
    Undone,
    /// Undo failed during rollback.
    UndoFailed,
}

/// Record of a step's execution in a run.
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// Name of the step.
    pub name: String,
    /// Current status.
    pub status: StepStatus,
    /// When the step started executing.
    pub started_at: Instant,
    /// When the step last changed status.
    pub completed_at: Option<Instant>,
    /// Undo description, skip reason, or failure message.
    pub detail: Option<String>,
}

/// Audit log tracking every step of a run, including recovery.
#[derive(Debug, Clone)]
pub struct AuditLog {
    enabled: bool,
    records: Vec<StepRecord>,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLog {
    /// Create a new empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            records: Vec::new(),
        }
    }

    /// A log that ignores every record call.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            records: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn record_start(&mut self, name: &str) {
        if !self.enabled {
            return;
        }
        self.records.push(StepRecord {
            name: name.to_string(),
            status: StepStatus::Running,
            started_at: Instant::now(),
            completed_at: None,
            detail: None,
        });
    }

    pub(crate) fn record_completed(&mut self, name: &str, undo_description: String) {
        self.update(name, StepStatus::Completed, Some(undo_description));
    }

    pub(crate) fn record_skipped(&mut self, name: &str, reason: &str) {
        self.update(name, StepStatus::Skipped, Some(reason.to_string()));
    }

    pub(crate) fn record_failure(&mut self, name: &str, message: &str) {
        self.update(name, StepStatus::Failed, Some(message.to_string()));
    }

    pub(crate) fn record_compensated(&mut self, name: &str) {
        self.update(name, StepStatus::Compensated, None);
    }

    pub(crate) fn record_compensation_failed(&mut self, name: &str, message: &str) {
        self.update(name, StepStatus::CompensationFailed, Some(message.to_string()));
    }

    pub(crate) fn record_undone(&mut self, name: &str) {
        self.update(name, StepStatus::Undone, None);
    }

    pub(crate) fn record_undo_failed(&mut self, name: &str, message: &str) {
        self.update(name, StepStatus::UndoFailed, Some(message.to_string()));
    }

    /// Update the most recent record for `name`. A `None` detail keeps the
    /// existing one.
    fn update(&mut self, name: &str, status: StepStatus, detail: Option<String>) {
        if !self.enabled {
            return;
        }
        if let Some(record) = self.records.iter_mut().rev().find(|r| r.name == name) {
            record.status = status;
            record.completed_at = Some(Instant::now());
            if detail.is_some() {
                record.detail = detail;
            }
        }
    }

    /// Get all records in the audit log.
    #[must_use]
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// The most recent record for `name`.
    #[must_use]
    pub fn record(&self, name: &str) -> Option<&StepRecord> {
        self.records.iter().rev().find(|r| r.name == name)
    }

    /// Get a summary of the run for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                StepStatus::Running => "…",
                StepStatus::Completed => "✓",
                StepStatus::Skipped => "-",
                StepStatus::Failed => "✗",
                StepStatus::Compensated | StepStatus::Undone => "↩",
                StepStatus::CompensationFailed | StepStatus::UndoFailed => "⚠",
            };
            lines.push(format!("{status} {}", record.name));
        }
        lines.join("\n")
    }
}
