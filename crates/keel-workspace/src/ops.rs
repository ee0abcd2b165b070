use thiserror::Error;

use crate::instructions::{
    AdoptInstructions, CreateInstructions, DecoupleInstructions, UpdateInstructions,
};
use crate::snapshot::{WorkspaceProjectRef, WorkspaceSnapshot};

#[derive(Debug, Error)]
pub enum OpsError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl OpsError {
    pub fn message(message: impl Into<String>) -> Self {
        OpsError::Message(message.into())
    }
}

/// Mutating side of the workspace, owned by the host environment.
///
/// The reconciler hands these methods pre-composed instructions and records
/// failures per decision; implementations perform the actual resource work
/// (directories, descriptors, classpath files) however the host sees fit.
pub trait WorkspaceOperations: Send + Sync {
    /// Current projects and known on-disk descriptors. Queried at the start
    /// of every run; the core never caches it across runs.
    fn snapshot(&self) -> Result<WorkspaceSnapshot, OpsError>;

    fn create_project(
        &self,
        instructions: &CreateInstructions,
    ) -> Result<WorkspaceProjectRef, OpsError>;

    fn adopt_project(
        &self,
        instructions: &AdoptInstructions,
    ) -> Result<WorkspaceProjectRef, OpsError>;

    fn update_project(
        &self,
        project: &WorkspaceProjectRef,
        instructions: &UpdateInstructions,
    ) -> Result<(), OpsError>;

    fn decouple_project(
        &self,
        project: &WorkspaceProjectRef,
        instructions: &DecoupleInstructions,
    ) -> Result<(), OpsError>;
}
