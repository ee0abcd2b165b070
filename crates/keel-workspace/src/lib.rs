//! Workspace-side reconciliation: the read-through workspace snapshot, the
//! pure two-pass planner, instruction composition, and the commit point that
//! executes decisions against the host's [`WorkspaceOperations`].
//!
//! The crate owns no resources itself. It reads a [`WorkspaceSnapshot`] from
//! the collaborator at the start of every run, plans `{Decouple, LeaveClosed,
//! Update, Adopt, Create}` transitions against a normalized
//! [`keel_model::ModelTree`], and hands each decision back as pre-composed
//! instructions. Individual operation and configurator failures are captured
//! on the [`SynchronizationResult`] and never abort the remaining decisions.

mod apply;
mod configure;
mod instructions;
mod ops;
mod plan;
mod policy;
mod result;
mod snapshot;

pub use apply::{apply, Reconciler};
pub use configure::{ConfiguratorError, ProjectConfigurator};
pub use instructions::{
    adopt_instructions, create_instructions, decouple_instructions, update_instructions,
    AdoptInstructions, BuildCommandUpdate, CreateInstructions, DecoupleInstructions,
    DescriptorSeed, JavaUpdate, UpdateInstructions,
};
pub use ops::{OpsError, WorkspaceOperations};
pub use plan::{plan, DecisionKind, ReconciliationDecision};
pub use policy::{ImportAllMerging, NewProjectPolicy, RejectNewProjects};
pub use result::{
    DecisionOutcome, OutcomeStatus, ProblemSeverity, SyncProblem, SyncStatus, SynchronizationResult,
};
pub use snapshot::{
    BuildAssociation, ProjectDescriptor, WorkspaceProjectRef, WorkspaceSnapshot, JAVA_NATURE,
    MARKER_NATURE,
};
