use std::collections::HashSet;
use std::path::Path;

use keel_model::{ModelTree, NodeId};

use crate::policy::NewProjectPolicy;
use crate::snapshot::{ProjectDescriptor, WorkspaceProjectRef, WorkspaceSnapshot};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum DecisionKind {
    Decouple,
    LeaveClosed,
    Update,
    Adopt,
    Create,
}

/// One planned transition for one project location. Produced fresh each run,
/// never persisted.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationDecision {
    /// Strip tool management from a workspace project whose path vanished
    /// from the model.
    Decouple { project: WorkspaceProjectRef },
    /// The node's location holds a closed project; leave it untouched.
    LeaveClosed {
        node: NodeId,
        project: WorkspaceProjectRef,
    },
    /// Refresh an open project from its model node.
    Update {
        node: NodeId,
        project: WorkspaceProjectRef,
    },
    /// Turn an existing on-disk descriptor into a workspace project.
    Adopt {
        node: NodeId,
        descriptor: ProjectDescriptor,
        overwrite: bool,
    },
    /// Synthesize a brand-new project from the node.
    Create { node: NodeId },
}

impl ReconciliationDecision {
    pub fn kind(&self) -> DecisionKind {
        match self {
            ReconciliationDecision::Decouple { .. } => DecisionKind::Decouple,
            ReconciliationDecision::LeaveClosed { .. } => DecisionKind::LeaveClosed,
            ReconciliationDecision::Update { .. } => DecisionKind::Update,
            ReconciliationDecision::Adopt { .. } => DecisionKind::Adopt,
            ReconciliationDecision::Create { .. } => DecisionKind::Create,
        }
    }
}

/// Computes the decisions aligning the workspace with the model tree.
///
/// Pure: consumes the snapshot, mutates nothing. Pass 1 marks stale managed
/// projects for decoupling; pass 2 emits one decision per model node in
/// pre-order. Decouples come first in the returned list so a stale
/// association never shadows a decision at the same location.
pub fn plan(
    tree: &ModelTree,
    workspace: &WorkspaceSnapshot,
    policy: &dyn NewProjectPolicy,
) -> Vec<ReconciliationDecision> {
    let build_root = tree.root().project_dir.as_path();
    let model_locations: HashSet<&Path> = tree
        .preorder()
        .map(|id| tree.node(id).project_dir.as_path())
        .collect();

    let mut decisions = Vec::new();

    for project in &workspace.projects {
        if !project.open || !project.has_marker_nature() {
            continue;
        }
        if is_stale(project, tree, build_root, &model_locations) {
            decisions.push(ReconciliationDecision::Decouple {
                project: project.clone(),
            });
        }
    }

    for id in tree.preorder() {
        let node = tree.node(id);
        if let Some(existing) = workspace.project_at(&node.project_dir) {
            if existing.open {
                decisions.push(ReconciliationDecision::Update {
                    node: id,
                    project: existing.clone(),
                });
            } else {
                decisions.push(ReconciliationDecision::LeaveClosed {
                    node: id,
                    project: existing.clone(),
                });
            }
        } else if let Some(descriptor) = workspace.descriptor_at(&node.project_dir) {
            if policy.should_import(node) {
                let overwrite = policy.should_overwrite_descriptor(descriptor, node);
                decisions.push(ReconciliationDecision::Adopt {
                    node: id,
                    descriptor: descriptor.clone(),
                    overwrite,
                });
            }
        } else if policy.should_import(node) {
            decisions.push(ReconciliationDecision::Create { node: id });
        }
    }

    decisions
}

/// A managed project is stale when this build no longer models it. Projects
/// associated with a different build are never ours to touch; projects
/// without any association correspond by location.
fn is_stale(
    project: &WorkspaceProjectRef,
    tree: &ModelTree,
    build_root: &Path,
    model_locations: &HashSet<&Path>,
) -> bool {
    match &project.association {
        Some(association) if association.build_root != build_root => false,
        Some(association) => !tree.contains(&association.project_path),
        None => !model_locations.contains(project.location.as_path()),
    }
}
