use keel_model::ProjectPath;

use crate::plan::DecisionKind;

/// Terminal status of one synchronization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SyncStatus {
    /// Every decision applied, no errors captured.
    Succeeded,
    /// The run completed but some decisions failed or configurators raised
    /// errors.
    Partial,
    /// The run never got to a plan (model reload or snapshot failed).
    Failed,
    /// Cooperatively stopped between decisions. Not an error.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ProblemSeverity {
    Warning,
    Error,
}

/// A captured failure that did not abort the run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SyncProblem {
    pub severity: ProblemSeverity,
    /// What raised it: a configurator name, `workspace`, or `model-reload`.
    pub source: String,
    pub project: Option<ProjectPath>,
    pub message: String,
}

impl SyncProblem {
    pub fn error(
        source: impl Into<String>,
        project: Option<ProjectPath>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: ProblemSeverity::Error,
            source: source.into(),
            project,
            message: message.into(),
        }
    }

    pub fn warning(
        source: impl Into<String>,
        project: Option<ProjectPath>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: ProblemSeverity::Warning,
            source: source.into(),
            project,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OutcomeStatus {
    Applied,
    Failed,
}

/// What happened to one planned decision.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DecisionOutcome {
    pub kind: DecisionKind,
    pub project_name: String,
    /// Model path for node decisions; the stale associated path, when known,
    /// for decouples.
    pub path: Option<ProjectPath>,
    pub status: OutcomeStatus,
}

/// Aggregate outcome of one synchronization run: overall status plus the
/// ordered per-decision outcomes and every captured problem.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SynchronizationResult {
    pub status: SyncStatus,
    pub outcomes: Vec<DecisionOutcome>,
    pub problems: Vec<SyncProblem>,
}

impl SynchronizationResult {
    /// Run-level failure before any decision was made.
    pub fn failed(problem: SyncProblem) -> Self {
        Self {
            status: SyncStatus::Failed,
            outcomes: Vec::new(),
            problems: vec![problem],
        }
    }

    pub fn errors(&self) -> impl Iterator<Item = &SyncProblem> {
        self.problems
            .iter()
            .filter(|problem| problem.severity == ProblemSeverity::Error)
    }

    pub fn is_success(&self) -> bool {
        self.status == SyncStatus::Succeeded
    }
}
