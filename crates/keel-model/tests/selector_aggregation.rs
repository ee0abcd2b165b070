use std::sync::Arc;

use keel_model::{
    aggregate_invocations, Capability, ModelTree, ProjectPath, RawProjectNode, RawTask,
};

fn path(text: &str) -> ProjectPath {
    ProjectPath::parse(text).unwrap()
}

fn project(name: &str, p: &str) -> RawProjectNode {
    RawProjectNode::new(name, path(p), format!("/work/{name}"))
}

#[test]
fn multi_project_build_aggregates_tasks_and_selectors() {
    let mut run = RawTask::new("run");
    run.description = Some("Runs the application".to_string());
    run.public = Capability::Reported(true);

    let mut app = project("app", ":app");
    app.tasks.push(run);
    let lib = project("lib", ":lib");
    let mut root = project("root", ":");
    root.children.push(Arc::new(app));
    root.children.push(Arc::new(lib));

    let tree = ModelTree::build(&root).unwrap();
    let index = aggregate_invocations(&tree);
    assert_eq!(index.len(), 3);

    // The root has no tasks of its own but sees `run` from its subtree,
    // declared at the shallowest owner.
    let at_root = &index[&path(":")];
    assert!(at_root.tasks.is_empty());
    assert_eq!(at_root.selectors.len(), 1);
    let run = &at_root.selectors[0];
    assert_eq!(run.name, "run");
    assert_eq!(run.declaring_project, path(":app"));
    assert!(run.public);
    let selected: Vec<String> = run
        .selected_projects
        .iter()
        .map(ProjectPath::to_string)
        .collect();
    assert_eq!(selected, [":app"]);

    let at_app = &index[&path(":app")];
    assert_eq!(at_app.tasks.len(), 1);
    assert_eq!(at_app.tasks[0].name, "run");
    assert_eq!(at_app.selectors.len(), 1);
    assert_eq!(at_app.selectors[0].declaring_project, path(":app"));

    let at_lib = &index[&path(":lib")];
    assert!(at_lib.tasks.is_empty());
    assert!(at_lib.selectors.is_empty());
}

#[test]
fn selector_index_is_stable_across_rebuilds_of_the_same_raw_model() {
    let mut a = project("a", ":a");
    a.tasks.push(RawTask::new("build"));
    let mut b = project("b", ":a:b");
    b.tasks.push(RawTask::new("build"));
    a.children.push(Arc::new(b));

    let first = aggregate_invocations(&ModelTree::build(&a).unwrap());
    let second = aggregate_invocations(&ModelTree::build(&a).unwrap());
    assert_eq!(first, second);

    let build = &first[&path(":a")].selectors[0];
    assert_eq!(build.declaring_project, path(":a"));
    let selected: Vec<String> = build
        .selected_projects
        .iter()
        .map(ProjectPath::to_string)
        .collect();
    assert_eq!(selected, [":a", ":a:b"]);
}
