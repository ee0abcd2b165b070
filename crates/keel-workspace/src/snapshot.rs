use std::path::{Path, PathBuf};

use keel_model::ProjectPath;

/// Nature marking a workspace project as managed by this tool.
pub const MARKER_NATURE: &str = "dev.keel.buildNature";

/// Nature enabling Java tooling on a workspace project.
pub const JAVA_NATURE: &str = "dev.keel.javaNature";

/// Durable link between a workspace project and the build that manages it.
///
/// The managed sets remember what the tool itself added, so a later
/// synchronization removes only tool-managed entries and never touches user
/// additions. Persisted by the workspace collaborator alongside the project.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BuildAssociation {
    pub build_root: PathBuf,
    pub project_path: ProjectPath,
    pub managed_natures: Vec<String>,
    pub managed_build_commands: Vec<String>,
}

impl BuildAssociation {
    pub fn new(build_root: impl Into<PathBuf>, project_path: ProjectPath) -> Self {
        Self {
            build_root: build_root.into(),
            project_path,
            managed_natures: Vec::new(),
            managed_build_commands: Vec::new(),
        }
    }
}

/// Identity and current state of one workspace project. Owned by the
/// workspace collaborator; the core only reads it and proposes transitions.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WorkspaceProjectRef {
    pub name: String,
    pub location: PathBuf,
    pub open: bool,
    pub natures: Vec<String>,
    pub association: Option<BuildAssociation>,
}

impl WorkspaceProjectRef {
    pub fn has_marker_nature(&self) -> bool {
        self.natures.iter().any(|nature| nature == MARKER_NATURE)
    }
}

/// On-disk project definition at a location that is not (yet) a workspace
/// project. Input to the adopt path.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProjectDescriptor {
    pub name: String,
    pub location: PathBuf,
    pub natures: Vec<String>,
}

/// Read-through view of the workspace, captured at the start of every run.
/// Never cached across runs.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceSnapshot {
    pub projects: Vec<WorkspaceProjectRef>,
    pub descriptors: Vec<ProjectDescriptor>,
}

impl WorkspaceSnapshot {
    pub fn project_at(&self, location: &Path) -> Option<&WorkspaceProjectRef> {
        self.projects
            .iter()
            .find(|project| project.location == location)
    }

    pub fn descriptor_at(&self, location: &Path) -> Option<&ProjectDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.location == location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_nature_detection() {
        let mut project = WorkspaceProjectRef {
            name: "app".to_string(),
            location: PathBuf::from("/work/app"),
            open: true,
            natures: vec!["other.nature".to_string()],
            association: None,
        };
        assert!(!project.has_marker_nature());
        project.natures.push(MARKER_NATURE.to_string());
        assert!(project.has_marker_nature());
    }

    #[test]
    fn association_round_trips_through_serde() {
        let assoc = BuildAssociation {
            build_root: PathBuf::from("/work"),
            project_path: ProjectPath::parse(":app").unwrap(),
            managed_natures: vec![MARKER_NATURE.to_string()],
            managed_build_commands: vec!["builder".to_string()],
        };
        let json = serde_json::to_string(&assoc).unwrap();
        let back: BuildAssociation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, assoc);
    }
}
