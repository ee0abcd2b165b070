use std::path::PathBuf;
use std::sync::Arc;

use crate::capability::Capability;
use crate::model::{
    BuildCommand, ExternalDependency, JavaRuntime, LinkedResource, ProjectDependency, SourceRoot,
};
use crate::path::ProjectPath;

/// One project exactly as the external build tool reported it.
///
/// Children are `Arc`-shared: the tool may emit the same subtree under several
/// parents, and [`crate::ModelTree::build`] collapses those by path. Every
/// version-gated attribute arrives already wrapped in [`Capability`] by the
/// model provider, which knows which queries the pinned tool version answers.
#[derive(Debug, Clone)]
pub struct RawProjectNode {
    pub name: String,
    pub description: Option<String>,
    pub path: ProjectPath,
    pub project_dir: PathBuf,
    pub build_dir: Capability<PathBuf>,
    pub children: Vec<Arc<RawProjectNode>>,
    pub project_dependencies: Vec<ProjectDependency>,
    pub external_dependencies: Vec<ExternalDependency>,
    pub source_roots: Vec<SourceRoot>,
    pub linked_resources: Vec<LinkedResource>,
    pub natures: Capability<Vec<String>>,
    pub build_commands: Capability<Vec<BuildCommand>>,
    pub output_location: Capability<Option<String>>,
    pub classpath_containers: Capability<Vec<String>>,
    pub java: Capability<Option<RawJavaSettings>>,
    pub tasks: Vec<RawTask>,
}

impl RawProjectNode {
    /// Minimal node with every version-gated attribute unsupported.
    pub fn new(name: impl Into<String>, path: ProjectPath, project_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            description: None,
            path,
            project_dir: project_dir.into(),
            build_dir: Capability::Unsupported,
            children: Vec::new(),
            project_dependencies: Vec::new(),
            external_dependencies: Vec::new(),
            source_roots: Vec::new(),
            linked_resources: Vec::new(),
            natures: Capability::Unsupported,
            build_commands: Capability::Unsupported,
            output_location: Capability::Unsupported,
            classpath_containers: Capability::Unsupported,
            java: Capability::Unsupported,
            tasks: Vec::new(),
        }
    }
}

/// Java compiler settings as reported, before fallback resolution.
#[derive(Debug, Clone)]
pub struct RawJavaSettings {
    pub source_level: String,
    pub target_bytecode_level: Capability<String>,
    pub runtime: Capability<JavaRuntime>,
}

#[derive(Debug, Clone)]
pub struct RawTask {
    pub name: String,
    pub description: Option<String>,
    pub public: Capability<bool>,
    pub group: Capability<Option<String>>,
}

impl RawTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            public: Capability::Unsupported,
            group: Capability::Unsupported,
        }
    }
}
