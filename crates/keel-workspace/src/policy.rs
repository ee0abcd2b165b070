use keel_model::ProjectNode;

use crate::snapshot::{ProjectDescriptor, WorkspaceProjectRef};

/// Decides whether model projects absent from the workspace get imported.
///
/// Asked once per eligible node during planning. A rejected node is skipped
/// without a decision; its children are still considered individually.
pub trait NewProjectPolicy: Send + Sync {
    fn should_import(&self, node: &ProjectNode) -> bool;

    /// Whether an existing on-disk descriptor may be replaced during
    /// adoption. Defaults to merging (never overwrite).
    fn should_overwrite_descriptor(
        &self,
        descriptor: &ProjectDescriptor,
        node: &ProjectNode,
    ) -> bool {
        let _ = (descriptor, node);
        false
    }

    /// Called after a project was created or adopted on the workspace.
    fn after_create(&self, project: &WorkspaceProjectRef) {
        let _ = project;
    }
}

/// Imports nothing. Existing workspace projects are still updated.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectNewProjects;

impl NewProjectPolicy for RejectNewProjects {
    fn should_import(&self, _node: &ProjectNode) -> bool {
        false
    }
}

/// Imports every project, merging with existing descriptors instead of
/// overwriting them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportAllMerging;

impl NewProjectPolicy for ImportAllMerging {
    fn should_import(&self, _node: &ProjectNode) -> bool {
        true
    }
}
