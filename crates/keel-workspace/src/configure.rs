use keel_model::ProjectNode;
use thiserror::Error;

use crate::snapshot::WorkspaceProjectRef;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfiguratorError {
    pub message: String,
}

impl ConfiguratorError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Host-contributed hook run as decisions commit.
///
/// Failures are captured as problems on the run result and never abort the
/// remaining decisions.
pub trait ProjectConfigurator: Send + Sync {
    /// Stable name used to attribute captured failures.
    fn name(&self) -> &str;

    /// Called once per run, before any decision executes.
    fn init(&self) -> Result<(), ConfiguratorError> {
        Ok(())
    }

    /// Called after each successful create, adopt, or update.
    fn configure(
        &self,
        project: &WorkspaceProjectRef,
        node: &ProjectNode,
    ) -> Result<(), ConfiguratorError>;

    /// Called before a managed project is decoupled.
    fn unconfigure(&self, project: &WorkspaceProjectRef) -> Result<(), ConfiguratorError> {
        let _ = project;
        Ok(())
    }
}
