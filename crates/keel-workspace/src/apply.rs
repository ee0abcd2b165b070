use std::sync::Arc;

use keel_model::{ModelTree, NodeId, ProjectNode, ProjectPath};
use tokio_util::sync::CancellationToken;

use crate::configure::ProjectConfigurator;
use crate::instructions::{
    adopt_instructions, create_instructions, decouple_instructions, update_instructions,
};
use crate::ops::WorkspaceOperations;
use crate::plan::{plan, DecisionKind, ReconciliationDecision};
use crate::policy::NewProjectPolicy;
use crate::result::{
    DecisionOutcome, OutcomeStatus, ProblemSeverity, SyncProblem, SyncStatus, SynchronizationResult,
};
use crate::snapshot::{ProjectDescriptor, WorkspaceProjectRef};

/// Commit point: executes planned decisions, in order, against the workspace.
///
/// Configurator `init` runs once before anything executes. Individual
/// workspace-operation and configurator failures are recorded as problems and
/// the run continues with the next decision. Cancellation is honored between
/// decisions, never mid-decision; a cancelled run reports the outcomes
/// committed so far.
pub fn apply(
    tree: &ModelTree,
    decisions: &[ReconciliationDecision],
    ops: &dyn WorkspaceOperations,
    policy: &dyn NewProjectPolicy,
    configurators: &[Arc<dyn ProjectConfigurator>],
    token: &CancellationToken,
) -> SynchronizationResult {
    let mut run = ApplyRun {
        tree,
        ops,
        policy,
        configurators,
        outcomes: Vec::new(),
        problems: Vec::new(),
    };

    for configurator in configurators {
        if let Err(err) = configurator.init() {
            run.problems.push(SyncProblem::error(
                configurator.name(),
                None,
                format!("init failed: {err}"),
            ));
        }
    }

    for decision in decisions {
        if token.is_cancelled() {
            tracing::debug!(
                target: "keel.workspace",
                committed = run.outcomes.len(),
                "synchronization cancelled between decisions"
            );
            return run.finish(SyncStatus::Cancelled);
        }
        run.execute(decision);
    }

    let degraded = run
        .outcomes
        .iter()
        .any(|outcome| outcome.status == OutcomeStatus::Failed)
        || run
            .problems
            .iter()
            .any(|problem| problem.severity == ProblemSeverity::Error);
    let status = if degraded {
        SyncStatus::Partial
    } else {
        SyncStatus::Succeeded
    };
    run.finish(status)
}

struct ApplyRun<'a> {
    tree: &'a ModelTree,
    ops: &'a dyn WorkspaceOperations,
    policy: &'a dyn NewProjectPolicy,
    configurators: &'a [Arc<dyn ProjectConfigurator>],
    outcomes: Vec<DecisionOutcome>,
    problems: Vec<SyncProblem>,
}

impl ApplyRun<'_> {
    fn execute(&mut self, decision: &ReconciliationDecision) {
        match decision {
            ReconciliationDecision::Decouple { project } => self.decouple(project),
            ReconciliationDecision::LeaveClosed { node, project } => {
                let path = self.tree.node(*node).path.clone();
                tracing::debug!(
                    target: "keel.workspace",
                    project = %project.name,
                    "leaving closed project untouched"
                );
                self.push_outcome(
                    DecisionKind::LeaveClosed,
                    project.name.clone(),
                    Some(path),
                    OutcomeStatus::Applied,
                );
            }
            ReconciliationDecision::Update { node, project } => self.update(*node, project),
            ReconciliationDecision::Adopt {
                node,
                descriptor,
                overwrite,
            } => self.adopt(*node, descriptor, *overwrite),
            ReconciliationDecision::Create { node } => self.create(*node),
        }
    }

    fn decouple(&mut self, project: &WorkspaceProjectRef) {
        let stale_path = project
            .association
            .as_ref()
            .map(|association| association.project_path.clone());
        for configurator in self.configurators {
            if let Err(err) = configurator.unconfigure(project) {
                self.problems.push(SyncProblem::error(
                    configurator.name(),
                    stale_path.clone(),
                    format!("unconfigure failed for `{}`: {err}", project.name),
                ));
            }
        }
        let instructions = decouple_instructions(project);
        let status = match self.ops.decouple_project(project, &instructions) {
            Ok(()) => OutcomeStatus::Applied,
            Err(err) => {
                self.record_op_failure(&project.name, stale_path.clone(), err.to_string());
                OutcomeStatus::Failed
            }
        };
        self.push_outcome(
            DecisionKind::Decouple,
            project.name.clone(),
            stale_path,
            status,
        );
    }

    fn update(&mut self, id: NodeId, project: &WorkspaceProjectRef) {
        let node = self.tree.node(id);
        let instructions = update_instructions(self.tree, id, project);
        let status = match self.ops.update_project(project, &instructions) {
            Ok(()) => {
                self.configure(project, node);
                OutcomeStatus::Applied
            }
            Err(err) => {
                self.record_op_failure(&project.name, Some(node.path.clone()), err.to_string());
                OutcomeStatus::Failed
            }
        };
        self.push_outcome(
            DecisionKind::Update,
            project.name.clone(),
            Some(node.path.clone()),
            status,
        );
    }

    fn adopt(&mut self, id: NodeId, descriptor: &ProjectDescriptor, overwrite: bool) {
        let node = self.tree.node(id);
        let instructions = adopt_instructions(self.tree, id, descriptor, overwrite);
        let status = match self.ops.adopt_project(&instructions) {
            Ok(adopted) => {
                self.policy.after_create(&adopted);
                self.configure(&adopted, node);
                OutcomeStatus::Applied
            }
            Err(err) => {
                self.record_op_failure(&descriptor.name, Some(node.path.clone()), err.to_string());
                OutcomeStatus::Failed
            }
        };
        self.push_outcome(
            DecisionKind::Adopt,
            descriptor.name.clone(),
            Some(node.path.clone()),
            status,
        );
    }

    fn create(&mut self, id: NodeId) {
        let node = self.tree.node(id);
        let instructions = create_instructions(self.tree, id);
        let status = match self.ops.create_project(&instructions) {
            Ok(created) => {
                self.policy.after_create(&created);
                self.configure(&created, node);
                OutcomeStatus::Applied
            }
            Err(err) => {
                self.record_op_failure(&node.name, Some(node.path.clone()), err.to_string());
                OutcomeStatus::Failed
            }
        };
        self.push_outcome(
            DecisionKind::Create,
            node.name.clone(),
            Some(node.path.clone()),
            status,
        );
    }

    fn configure(&mut self, project: &WorkspaceProjectRef, node: &ProjectNode) {
        for configurator in self.configurators {
            if let Err(err) = configurator.configure(project, node) {
                self.problems.push(SyncProblem::error(
                    configurator.name(),
                    Some(node.path.clone()),
                    format!("configure failed for `{}`: {err}", project.name),
                ));
            }
        }
    }

    fn record_op_failure(&mut self, project: &str, path: Option<ProjectPath>, message: String) {
        tracing::warn!(
            target: "keel.workspace",
            project = %project,
            error = %message,
            "workspace operation failed; continuing with remaining decisions"
        );
        self.problems.push(SyncProblem::error(
            "workspace",
            path,
            format!("`{project}`: {message}"),
        ));
    }

    fn push_outcome(
        &mut self,
        kind: DecisionKind,
        project_name: String,
        path: Option<ProjectPath>,
        status: OutcomeStatus,
    ) {
        tracing::debug!(
            target: "keel.workspace",
            kind = ?kind,
            project = %project_name,
            status = ?status,
            "decision executed"
        );
        self.outcomes.push(DecisionOutcome {
            kind,
            project_name,
            path,
            status,
        });
    }

    fn finish(self, status: SyncStatus) -> SynchronizationResult {
        SynchronizationResult {
            status,
            outcomes: self.outcomes,
            problems: self.problems,
        }
    }
}

/// Binds the workspace collaborator and contributed configurators.
///
/// [`Reconciler::synchronize_tree`] is the commit pipeline minus model
/// reload: snapshot, plan, apply. Callers serialize it against other
/// workspace mutations; the reconciler itself takes no locks.
pub struct Reconciler {
    ops: Arc<dyn WorkspaceOperations>,
    configurators: Vec<Arc<dyn ProjectConfigurator>>,
}

impl Reconciler {
    pub fn new(ops: Arc<dyn WorkspaceOperations>) -> Self {
        Self {
            ops,
            configurators: Vec::new(),
        }
    }

    pub fn with_configurators(
        ops: Arc<dyn WorkspaceOperations>,
        configurators: Vec<Arc<dyn ProjectConfigurator>>,
    ) -> Self {
        Self { ops, configurators }
    }

    pub fn ops(&self) -> &Arc<dyn WorkspaceOperations> {
        &self.ops
    }

    pub fn synchronize_tree(
        &self,
        tree: &ModelTree,
        policy: &dyn NewProjectPolicy,
        token: &CancellationToken,
    ) -> SynchronizationResult {
        let snapshot = match self.ops.snapshot() {
            Ok(snapshot) => snapshot,
            Err(err) => {
                return SynchronizationResult::failed(SyncProblem::error(
                    "workspace",
                    None,
                    format!("snapshot failed: {err}"),
                ));
            }
        };
        let decisions = plan(tree, &snapshot, policy);
        tracing::debug!(
            target: "keel.workspace",
            decisions = decisions.len(),
            "applying synchronization plan"
        );
        apply(
            tree,
            &decisions,
            self.ops.as_ref(),
            policy,
            &self.configurators,
            token,
        )
    }
}
