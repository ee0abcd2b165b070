//! Normalized build-model types: project paths, the capability-gated
//! optional, the arena-backed model tree, and task/selector aggregation.
//!
//! External build tools hand over a raw, version-skewed, possibly-cyclic
//! project graph. This crate turns it into an immutable tree with one arena
//! slot per [`ProjectPath`], degrading gracefully when the pinned tool version
//! cannot answer an optional query. Everything here is pure data and pure
//! functions: no I/O, no logging, no clocks.

mod capability;
mod model;
mod path;
mod raw;
mod task;
mod tree;

pub use capability::Capability;
pub use model::{
    AccessRule, AccessRuleKind, BuildCommand, ClasspathAttribute, ExternalDependency, JavaRuntime,
    JavaSourceSettings, JavaVersion, LinkedResource, LinkedResourceKind, ProjectDependency,
    SourceRoot,
};
pub use path::{PathParseError, ProjectPath};
pub use raw::{RawJavaSettings, RawProjectNode, RawTask};
pub use task::{aggregate_invocations, ProjectInvocations, TaskDescriptor, TaskSelector};
pub use tree::{ModelError, ModelTree, NodeId, Preorder, ProjectNode};
