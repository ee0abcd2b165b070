use std::collections::{BTreeMap, BTreeSet};

use crate::capability::Capability;
use crate::path::ProjectPath;
use crate::tree::ModelTree;

/// Task declared directly on one project.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaskDescriptor {
    pub name: String,
    pub description: Option<String>,
    pub project: ProjectPath,
    /// Defaults to `true` when the tool predates task visibility.
    pub public: bool,
    /// Three-valued: unsupported, reported without a group, or grouped.
    pub group: Capability<Option<String>>,
}

/// Aggregated reference to every same-named task in one subtree.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TaskSelector {
    pub name: String,
    pub description: Option<String>,
    /// Shallowest project in the subtree declaring a task of this name, ties
    /// broken by path order.
    pub declaring_project: ProjectPath,
    /// True when any selected task is public.
    pub public: bool,
    pub group: Capability<Option<String>>,
    pub selected_projects: BTreeSet<ProjectPath>,
}

/// Tasks and selectors visible at one project path.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProjectInvocations {
    pub tasks: Vec<TaskDescriptor>,
    pub selectors: Vec<TaskSelector>,
}

/// Derives, for every project path, the directly-declared tasks plus the
/// selectors fanning out to same-named tasks anywhere in that project's
/// subtree (the project itself included).
///
/// Every known path receives an entry, with empty lists when nothing applies.
/// Task lists keep declaration order; selector lists are name-ordered;
/// selected-project sets are path-ordered. Description and group of a
/// selector come from the task at its declaring project.
pub fn aggregate_invocations(tree: &ModelTree) -> BTreeMap<ProjectPath, ProjectInvocations> {
    let mut out = BTreeMap::new();
    for id in tree.preorder() {
        let node = tree.node(id);

        let mut by_name: BTreeMap<&str, Vec<&TaskDescriptor>> = BTreeMap::new();
        for sub_id in tree.preorder_from(id) {
            for task in &tree.node(sub_id).tasks {
                by_name.entry(task.name.as_str()).or_default().push(task);
            }
        }

        let selectors = by_name
            .into_iter()
            .filter_map(|(name, tasks)| build_selector(name, &tasks))
            .collect();

        out.insert(
            node.path.clone(),
            ProjectInvocations {
                tasks: node.tasks.clone(),
                selectors,
            },
        );
    }
    out
}

fn build_selector(name: &str, tasks: &[&TaskDescriptor]) -> Option<TaskSelector> {
    let mut declaring: Option<&TaskDescriptor> = None;
    for &task in tasks {
        match declaring {
            Some(current) if task.project >= current.project => {}
            _ => declaring = Some(task),
        }
    }
    let declaring = declaring?;
    Some(TaskSelector {
        name: name.to_string(),
        description: declaring.description.clone(),
        declaring_project: declaring.project.clone(),
        public: tasks.iter().any(|task| task.public),
        group: declaring.group.clone(),
        selected_projects: tasks.iter().map(|task| task.project.clone()).collect(),
    })
}
