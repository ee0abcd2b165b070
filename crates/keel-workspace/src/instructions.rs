use std::path::PathBuf;

use keel_model::{
    BuildCommand, Capability, ExternalDependency, JavaVersion, LinkedResource, ModelTree, NodeId,
    ProjectDependency, SourceRoot,
};

use crate::snapshot::{
    BuildAssociation, ProjectDescriptor, WorkspaceProjectRef, JAVA_NATURE, MARKER_NATURE,
};

/// Descriptor content for a project the tool is about to create or rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSeed {
    pub name: String,
    pub natures: Vec<String>,
}

/// Tool-managed build commands to reconcile on a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildCommandUpdate {
    /// Commands to add or refresh, keyed by name.
    pub set: Vec<BuildCommand>,
    /// Previously-managed command names gone from the model.
    pub remove: Vec<String>,
}

/// Java payload pushed onto a project whose node carries source settings.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaUpdate {
    pub source_level: JavaVersion,
    pub target_bytecode_level: JavaVersion,
    pub source_roots: Vec<SourceRoot>,
    pub project_dependencies: Vec<ProjectDependency>,
    pub external_dependencies: Vec<ExternalDependency>,
    pub classpath_containers: Capability<Vec<String>>,
    pub output_location: Capability<Option<String>>,
}

/// Everything `update_project` needs to bring an open project in line with
/// its model node.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateInstructions {
    pub name: String,
    /// Natures missing from the project; always lists the marker nature
    /// first when absent.
    pub add_natures: Vec<String>,
    /// Tool-managed natures now gone from the model. Empty when the tool
    /// cannot report natures: user-visible state stays untouched then.
    pub remove_natures: Vec<String>,
    /// `None` when the tool cannot report build commands.
    pub build_commands: Option<BuildCommandUpdate>,
    /// Immediate child project directories (and a reported build directory)
    /// nested under this project's directory, to be filtered from its tree.
    pub filtered_child_locations: Vec<PathBuf>,
    pub linked_resources: Vec<LinkedResource>,
    pub java: Option<JavaUpdate>,
    /// Refreshed association to persist with the project.
    pub association: BuildAssociation,
}

/// Everything `create_project` needs to synthesize a brand-new project.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateInstructions {
    pub location: PathBuf,
    pub seed: DescriptorSeed,
    /// Applied right after creation to bring the project fully up to date.
    pub update: UpdateInstructions,
}

/// Everything `adopt_project` needs to import an on-disk descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct AdoptInstructions {
    pub descriptor: ProjectDescriptor,
    /// Fresh descriptor content when the policy allows overwriting; `None`
    /// merges with the existing descriptor.
    pub replacement: Option<DescriptorSeed>,
    pub update: UpdateInstructions,
}

/// Strips tool management from a project: marker nature, managed natures and
/// build commands, and the persisted association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoupleInstructions {
    pub remove_natures: Vec<String>,
    pub remove_build_commands: Vec<String>,
}

pub fn update_instructions(
    tree: &ModelTree,
    id: NodeId,
    project: &WorkspaceProjectRef,
) -> UpdateInstructions {
    compose_update(tree, id, &project.natures, project.association.as_ref())
}

pub fn create_instructions(tree: &ModelTree, id: NodeId) -> CreateInstructions {
    let node = tree.node(id);
    let seed = descriptor_seed(tree, id);
    let update = compose_update(tree, id, &seed.natures, None);
    CreateInstructions {
        location: node.project_dir.clone(),
        seed,
        update,
    }
}

pub fn adopt_instructions(
    tree: &ModelTree,
    id: NodeId,
    descriptor: &ProjectDescriptor,
    overwrite: bool,
) -> AdoptInstructions {
    let replacement = overwrite.then(|| descriptor_seed(tree, id));
    let current_natures = match &replacement {
        Some(seed) => seed.natures.clone(),
        None => descriptor.natures.clone(),
    };
    let update = compose_update(tree, id, &current_natures, None);
    AdoptInstructions {
        descriptor: descriptor.clone(),
        replacement,
        update,
    }
}

pub fn decouple_instructions(project: &WorkspaceProjectRef) -> DecoupleInstructions {
    let mut remove_natures = vec![MARKER_NATURE.to_string()];
    let mut remove_build_commands = Vec::new();
    if let Some(association) = &project.association {
        for nature in &association.managed_natures {
            if !remove_natures.contains(nature) {
                remove_natures.push(nature.clone());
            }
        }
        remove_build_commands = association.managed_build_commands.clone();
    }
    DecoupleInstructions {
        remove_natures,
        remove_build_commands,
    }
}

fn descriptor_seed(tree: &ModelTree, id: NodeId) -> DescriptorSeed {
    let node = tree.node(id);
    let mut natures = vec![MARKER_NATURE.to_string()];
    if !node.source_roots.is_empty() {
        natures.push(JAVA_NATURE.to_string());
    }
    DescriptorSeed {
        name: node.name.clone(),
        natures,
    }
}

fn compose_update(
    tree: &ModelTree,
    id: NodeId,
    current_natures: &[String],
    previous: Option<&BuildAssociation>,
) -> UpdateInstructions {
    let node = tree.node(id);
    let build_root = tree.root().project_dir.clone();

    let mut add_natures = Vec::new();
    if !current_natures.iter().any(|nature| nature == MARKER_NATURE) {
        add_natures.push(MARKER_NATURE.to_string());
    }
    let (remove_natures, managed_natures) = match &node.natures {
        Capability::Reported(model_natures) => {
            for nature in model_natures {
                if !current_natures.contains(nature) && !add_natures.contains(nature) {
                    add_natures.push(nature.clone());
                }
            }
            let remove = previous
                .map(|assoc| {
                    assoc
                        .managed_natures
                        .iter()
                        .filter(|nature| {
                            !model_natures.contains(nature) && nature.as_str() != MARKER_NATURE
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            (remove, model_natures.clone())
        }
        Capability::Unsupported => (
            Vec::new(),
            previous
                .map(|assoc| assoc.managed_natures.clone())
                .unwrap_or_default(),
        ),
    };

    let (build_commands, managed_build_commands) = match &node.build_commands {
        Capability::Reported(commands) => {
            let names: Vec<String> = commands.iter().map(|command| command.name.clone()).collect();
            let remove = previous
                .map(|assoc| {
                    assoc
                        .managed_build_commands
                        .iter()
                        .filter(|name| !names.contains(name))
                        .cloned()
                        .collect()
                })
                .unwrap_or_default();
            (
                Some(BuildCommandUpdate {
                    set: commands.clone(),
                    remove,
                }),
                names,
            )
        }
        Capability::Unsupported => (
            None,
            previous
                .map(|assoc| assoc.managed_build_commands.clone())
                .unwrap_or_default(),
        ),
    };

    let java = node.java_settings().map(|settings| JavaUpdate {
        source_level: settings.source_level,
        target_bytecode_level: settings.target_bytecode_level,
        source_roots: node.source_roots.clone(),
        project_dependencies: node.project_dependencies.clone(),
        external_dependencies: node.external_dependencies.clone(),
        classpath_containers: node.classpath_containers.clone(),
        output_location: node.output_location.clone(),
    });

    UpdateInstructions {
        name: node.name.clone(),
        add_natures,
        remove_natures,
        build_commands,
        filtered_child_locations: nested_child_locations(tree, id),
        linked_resources: node.linked_resources.clone(),
        java,
        association: BuildAssociation {
            build_root,
            project_path: node.path.clone(),
            managed_natures,
            managed_build_commands,
        },
    }
}

fn nested_child_locations(tree: &ModelTree, id: NodeId) -> Vec<PathBuf> {
    let node = tree.node(id);
    let mut locations = Vec::new();
    for &child in &node.children {
        let dir = &tree.node(child).project_dir;
        if dir != &node.project_dir && dir.starts_with(&node.project_dir) {
            locations.push(dir.clone());
        }
    }
    if let Capability::Reported(build_dir) = &node.build_dir {
        if build_dir != &node.project_dir
            && build_dir.starts_with(&node.project_dir)
            && !locations.contains(build_dir)
        {
            locations.push(build_dir.clone());
        }
    }
    locations
}
