use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;

use thiserror::Error;

use crate::capability::Capability;
use crate::model::{
    BuildCommand, ExternalDependency, JavaSourceSettings, JavaVersion, LinkedResource,
    ProjectDependency, SourceRoot,
};
use crate::path::ProjectPath;
use crate::raw::{RawJavaSettings, RawProjectNode};
use crate::task::TaskDescriptor;

/// Index of a node in its [`ModelTree`] arena. Only meaningful for the tree
/// that issued it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    /// The raw graph nests a path inside its own subtree, so no well-formed
    /// tree exists.
    #[error("build model nests project `{path}` inside its own subtree")]
    Cycle { path: ProjectPath },

    #[error("project `{path}` reports unparseable Java level `{value}`")]
    JavaLevel { path: ProjectPath, value: String },
}

/// One normalized project. Immutable once its tree is built; parent and child
/// links are arena indices, ownership flows strictly root to children.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectNode {
    pub name: String,
    pub description: Option<String>,
    pub path: ProjectPath,
    pub project_dir: PathBuf,
    pub build_dir: Capability<PathBuf>,
    /// Back-reference only; set by the first parent that linked this node.
    pub parent: Option<NodeId>,
    /// Declaration order. A node shared between parents appears in several
    /// child lists but occupies one arena slot.
    pub children: Vec<NodeId>,
    pub project_dependencies: Vec<ProjectDependency>,
    pub external_dependencies: Vec<ExternalDependency>,
    pub source_roots: Vec<SourceRoot>,
    pub linked_resources: Vec<LinkedResource>,
    pub natures: Capability<Vec<String>>,
    pub build_commands: Capability<Vec<BuildCommand>>,
    pub output_location: Capability<Option<String>>,
    pub classpath_containers: Capability<Vec<String>>,
    pub java: Capability<Option<JavaSourceSettings>>,
    pub tasks: Vec<TaskDescriptor>,
}

impl ProjectNode {
    /// Java settings when the tool reported them, regardless of which
    /// capability state hid them otherwise.
    pub fn java_settings(&self) -> Option<&JavaSourceSettings> {
        match &self.java {
            Capability::Reported(Some(settings)) => Some(settings),
            _ => None,
        }
    }
}

/// Normalized build model: a flat arena of [`ProjectNode`]s keyed by
/// [`ProjectPath`].
///
/// Built once per model reload and replaced wholesale on the next one. Equal
/// paths within one build resolve to the same arena slot, so identity
/// comparisons are cheap id comparisons.
#[derive(Debug, Clone)]
pub struct ModelTree {
    nodes: Vec<ProjectNode>,
    by_path: BTreeMap<ProjectPath, NodeId>,
    root: NodeId,
}

impl ModelTree {
    /// Normalizes a raw model into an arena tree.
    ///
    /// Nodes are memoized by path before their children are visited: a path
    /// re-encountered while still under construction is a cycle and aborts
    /// the build, while a finished path is shared substructure and resolves
    /// to the already-built slot.
    pub fn build(raw_root: &RawProjectNode) -> Result<ModelTree, ModelError> {
        let mut builder = TreeBuilder {
            nodes: Vec::new(),
            memo: HashMap::new(),
        };
        let root = builder.build_node(raw_root, None)?;

        let mut by_path = BTreeMap::new();
        for (path, slot) in builder.memo {
            if let Slot::Built(id) = slot {
                by_path.insert(path, id);
            }
        }
        Ok(ModelTree {
            nodes: builder.nodes,
            by_path,
            root,
        })
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &ProjectNode {
        self.node(self.root)
    }

    /// Panics if `id` came from a different tree.
    pub fn node(&self, id: NodeId) -> &ProjectNode {
        &self.nodes[id.index()]
    }

    pub fn id_of(&self, path: &ProjectPath) -> Option<NodeId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, path: &ProjectPath) -> Option<&ProjectNode> {
        self.id_of(path).map(|id| self.node(id))
    }

    pub fn contains(&self, path: &ProjectPath) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All known paths in path order.
    pub fn paths(&self) -> impl Iterator<Item = &ProjectPath> {
        self.by_path.keys()
    }

    /// Pre-order walk from the root: parents before children, children in
    /// declaration order, shared nodes yielded once at their first position.
    pub fn preorder(&self) -> Preorder<'_> {
        self.preorder_from(self.root)
    }

    pub fn preorder_from(&self, start: NodeId) -> Preorder<'_> {
        Preorder {
            tree: self,
            stack: vec![start],
            visited: HashSet::new(),
        }
    }
}

pub struct Preorder<'a> {
    tree: &'a ModelTree,
    stack: Vec<NodeId>,
    visited: HashSet<NodeId>,
}

impl Iterator for Preorder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            if !self.visited.insert(id) {
                continue;
            }
            for &child in self.tree.node(id).children.iter().rev() {
                self.stack.push(child);
            }
            return Some(id);
        }
        None
    }
}

enum Slot {
    Building,
    Built(NodeId),
}

struct TreeBuilder {
    nodes: Vec<ProjectNode>,
    memo: HashMap<ProjectPath, Slot>,
}

impl TreeBuilder {
    fn build_node(
        &mut self,
        raw: &RawProjectNode,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ModelError> {
        match self.memo.get(&raw.path) {
            Some(Slot::Built(id)) => return Ok(*id),
            Some(Slot::Building) => {
                return Err(ModelError::Cycle {
                    path: raw.path.clone(),
                })
            }
            None => {}
        }
        self.memo.insert(raw.path.clone(), Slot::Building);

        let java = convert_java(raw)?;
        let tasks = raw
            .tasks
            .iter()
            .map(|task| TaskDescriptor {
                name: task.name.clone(),
                description: task.description.clone(),
                project: raw.path.clone(),
                public: task.public.reported().copied().unwrap_or(true),
                group: task.group.clone(),
            })
            .collect();

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(ProjectNode {
            name: raw.name.clone(),
            description: raw.description.clone(),
            path: raw.path.clone(),
            project_dir: raw.project_dir.clone(),
            build_dir: raw.build_dir.clone(),
            parent,
            children: Vec::new(),
            project_dependencies: raw.project_dependencies.clone(),
            external_dependencies: raw.external_dependencies.clone(),
            source_roots: raw.source_roots.clone(),
            linked_resources: raw.linked_resources.clone(),
            natures: raw.natures.clone(),
            build_commands: raw.build_commands.clone(),
            output_location: raw.output_location.clone(),
            classpath_containers: raw.classpath_containers.clone(),
            java,
            tasks,
        });

        let mut children = Vec::with_capacity(raw.children.len());
        for child in &raw.children {
            children.push(self.build_node(child, Some(id))?);
        }
        self.nodes[id.index()].children = children;
        self.memo.insert(raw.path.clone(), Slot::Built(id));
        Ok(id)
    }
}

fn convert_java(raw: &RawProjectNode) -> Result<Capability<Option<JavaSourceSettings>>, ModelError> {
    let settings = match &raw.java {
        Capability::Unsupported => return Ok(Capability::Unsupported),
        Capability::Reported(None) => return Ok(Capability::Reported(None)),
        Capability::Reported(Some(settings)) => settings,
    };
    let source_level = parse_level(&raw.path, &settings.source_level)?;
    let target_bytecode_level = match &settings.target_bytecode_level {
        Capability::Unsupported => source_level,
        Capability::Reported(text) => parse_level(&raw.path, text)?,
    };
    Ok(Capability::Reported(Some(JavaSourceSettings {
        source_level,
        target_bytecode_level,
        runtime: settings.runtime.clone(),
    })))
}

fn parse_level(path: &ProjectPath, text: &str) -> Result<JavaVersion, ModelError> {
    JavaVersion::parse(text).ok_or_else(|| ModelError::JavaLevel {
        path: path.clone(),
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::raw::RawTask;

    fn path(text: &str) -> ProjectPath {
        ProjectPath::parse(text).unwrap()
    }

    fn raw(name: &str, p: &str) -> RawProjectNode {
        RawProjectNode::new(name, path(p), format!("/work/{name}"))
    }

    #[test]
    fn builds_parent_links_and_preorder() {
        let mut root = raw("root", ":");
        let mut a = raw("a", ":a");
        a.children.push(Arc::new(raw("c", ":a:c")));
        root.children.push(Arc::new(a));
        root.children.push(Arc::new(raw("b", ":b")));

        let tree = ModelTree::build(&root).unwrap();
        assert_eq!(tree.len(), 4);

        let order: Vec<String> = tree
            .preorder()
            .map(|id| tree.node(id).path.to_string())
            .collect();
        assert_eq!(order, [":", ":a", ":a:c", ":b"]);

        let c = tree.get(&path(":a:c")).unwrap();
        assert_eq!(c.parent, tree.id_of(&path(":a")));
        assert_eq!(tree.root().parent, None);

        let sorted: Vec<String> = tree.paths().map(ProjectPath::to_string).collect();
        assert_eq!(sorted, [":", ":a", ":b", ":a:c"]);
    }

    #[test]
    fn shared_substructure_collapses_to_one_slot() {
        let shared = Arc::new(raw("common", ":common"));
        let mut a = raw("a", ":a");
        a.children.push(Arc::clone(&shared));
        let mut b = raw("b", ":b");
        b.children.push(shared);
        let mut root = raw("root", ":");
        root.children.push(Arc::new(a));
        root.children.push(Arc::new(b));

        let tree = ModelTree::build(&root).unwrap();
        assert_eq!(tree.len(), 4);

        let common = tree.id_of(&path(":common")).unwrap();
        let a_id = tree.id_of(&path(":a")).unwrap();
        let b_id = tree.id_of(&path(":b")).unwrap();
        assert_eq!(tree.node(a_id).children, [common]);
        assert_eq!(tree.node(b_id).children, [common]);
        assert!(std::ptr::eq(
            tree.node(tree.node(a_id).children[0]),
            tree.node(tree.node(b_id).children[0]),
        ));

        // First linker wins the back-reference.
        assert_eq!(tree.node(common).parent, Some(a_id));

        // The shared node is walked once, at its first position.
        let order: Vec<String> = tree
            .preorder()
            .map(|id| tree.node(id).path.to_string())
            .collect();
        assert_eq!(order, [":", ":a", ":common", ":b"]);
    }

    #[test]
    fn nested_path_reuse_is_a_cycle() {
        let inner = raw("a-again", ":a");
        let mut b = raw("b", ":a:b");
        b.children.push(Arc::new(inner));
        let mut a = raw("a", ":a");
        a.children.push(Arc::new(b));

        let err = ModelTree::build(&a).unwrap_err();
        assert_eq!(err, ModelError::Cycle { path: path(":a") });
    }

    #[test]
    fn capability_states_survive_normalization() {
        let mut root = raw("root", ":");
        root.natures = Capability::Reported(Vec::new());
        root.build_commands = Capability::Unsupported;

        let tree = ModelTree::build(&root).unwrap();
        let node = tree.root();
        assert_eq!(node.natures, Capability::Reported(Vec::new()));
        assert_eq!(node.build_commands, Capability::Unsupported);
    }

    #[test]
    fn java_target_falls_back_to_source_level() {
        let mut root = raw("root", ":");
        root.java = Capability::Reported(Some(RawJavaSettings {
            source_level: "17".to_string(),
            target_bytecode_level: Capability::Unsupported,
            runtime: Capability::Unsupported,
        }));

        let tree = ModelTree::build(&root).unwrap();
        let java = tree.root().java_settings().unwrap();
        assert_eq!(java.source_level, JavaVersion::JAVA_17);
        assert_eq!(java.target_bytecode_level, JavaVersion::JAVA_17);
    }

    #[test]
    fn unparseable_java_level_aborts_the_build() {
        let mut root = raw("root", ":");
        root.java = Capability::Reported(Some(RawJavaSettings {
            source_level: "banana".to_string(),
            target_bytecode_level: Capability::Unsupported,
            runtime: Capability::Unsupported,
        }));

        let err = ModelTree::build(&root).unwrap_err();
        assert_eq!(
            err,
            ModelError::JavaLevel {
                path: path(":"),
                value: "banana".to_string()
            }
        );
    }

    #[test]
    fn task_visibility_defaults_to_public() {
        let mut root = raw("root", ":");
        let mut hidden = RawTask::new("internalTask");
        hidden.public = Capability::Reported(false);
        root.tasks.push(RawTask::new("build"));
        root.tasks.push(hidden);

        let tree = ModelTree::build(&root).unwrap();
        let tasks = &tree.root().tasks;
        assert!(tasks[0].public);
        assert!(!tasks[1].public);
        assert_eq!(tasks[0].project, path(":"));
    }
}
