use std::fmt;
use std::sync::Arc;

use keel_workspace::{ImportAllMerging, NewProjectPolicy, RejectNewProjects};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::identity::BuildIdentity;

/// How a run treats model projects that are not yet workspace projects.
///
/// Variant order is permissiveness order; coalescing compares modes with `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NewProjectMode {
    /// Update existing projects only; import nothing new.
    RejectNew,
    /// Import every project, merging with existing descriptors.
    ImportAll,
}

impl NewProjectMode {
    pub fn policy(self) -> Arc<dyn NewProjectPolicy> {
        match self {
            NewProjectMode::RejectNew => Arc::new(RejectNewProjects),
            NewProjectMode::ImportAll => Arc::new(ImportAllMerging),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct InitializerError {
    pub message: String,
}

impl InitializerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Pre-reload hook carried by a request, e.g. scaffolding a brand-new build
/// before its first import. A failure fails the run before any reload.
pub trait SyncInitializer: Send + Sync {
    fn initialize(
        &self,
        build: &BuildIdentity,
        token: &CancellationToken,
    ) -> Result<(), InitializerError>;
}

/// One synchronization request for a build.
#[derive(Clone)]
pub struct SyncRequest {
    pub mode: NewProjectMode,
    pub initializer: Option<Arc<dyn SyncInitializer>>,
}

impl SyncRequest {
    pub fn new(mode: NewProjectMode) -> Self {
        Self {
            mode,
            initializer: None,
        }
    }

    pub fn with_initializer(mode: NewProjectMode, initializer: Arc<dyn SyncInitializer>) -> Self {
        Self {
            mode,
            initializer: Some(initializer),
        }
    }

    /// Folds a later request into this pending one: the most permissive mode
    /// wins, the latest initializer wins.
    pub fn merge(self, newer: SyncRequest) -> SyncRequest {
        SyncRequest {
            mode: self.mode.max(newer.mode),
            initializer: newer.initializer.or(self.initializer),
        }
    }
}

impl fmt::Debug for SyncRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncRequest")
            .field("mode", &self.mode)
            .field("initializer", &self.initializer.is_some())
            .finish()
    }
}

/// Coalescing predicate: a new request is covered by a queued or running one
/// iff it targets the same build, its mode is no more permissive, and its
/// initializer is absent or the identical object. Covered requests attach to
/// the in-flight run instead of scheduling a redundant one.
pub fn covered_by(
    build: &BuildIdentity,
    request: &SyncRequest,
    in_flight_build: &BuildIdentity,
    in_flight: &SyncRequest,
) -> bool {
    build == in_flight_build
        && request.mode <= in_flight.mode
        && initializer_covered(request, in_flight)
}

pub(crate) fn initializer_covered(request: &SyncRequest, in_flight: &SyncRequest) -> bool {
    match (&request.initializer, &in_flight.initializer) {
        (None, _) => true,
        (Some(new), Some(old)) => Arc::ptr_eq(new, old),
        (Some(_), None) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopInitializer;

    impl SyncInitializer for NoopInitializer {
        fn initialize(
            &self,
            _build: &BuildIdentity,
            _token: &CancellationToken,
        ) -> Result<(), InitializerError> {
            Ok(())
        }
    }

    fn build(root: &str) -> BuildIdentity {
        BuildIdentity::new(root)
    }

    #[test]
    fn less_permissive_requests_are_covered() {
        let a = build("/work/a");
        let reject = SyncRequest::new(NewProjectMode::RejectNew);
        let import = SyncRequest::new(NewProjectMode::ImportAll);

        assert!(covered_by(&a, &reject, &a, &import));
        assert!(covered_by(&a, &import, &a, &import));
        assert!(!covered_by(&a, &import, &a, &reject));
    }

    #[test]
    fn other_builds_are_never_covered() {
        let request = SyncRequest::new(NewProjectMode::RejectNew);
        assert!(!covered_by(
            &build("/work/a"),
            &request,
            &build("/work/b"),
            &request
        ));
    }

    #[test]
    fn initializers_must_be_the_identical_object() {
        let a = build("/work/a");
        let init: Arc<dyn SyncInitializer> = Arc::new(NoopInitializer);
        let other: Arc<dyn SyncInitializer> = Arc::new(NoopInitializer);

        let bare = SyncRequest::new(NewProjectMode::ImportAll);
        let with_init =
            SyncRequest::with_initializer(NewProjectMode::ImportAll, Arc::clone(&init));
        let with_same =
            SyncRequest::with_initializer(NewProjectMode::RejectNew, Arc::clone(&init));
        let with_other = SyncRequest::with_initializer(NewProjectMode::RejectNew, other);

        // No initializer is covered by anything; one is only covered by itself.
        assert!(covered_by(&a, &bare, &a, &with_init));
        assert!(covered_by(&a, &with_same, &a, &with_init));
        assert!(!covered_by(&a, &with_other, &a, &with_init));
        assert!(!covered_by(&a, &with_same, &a, &bare));
    }

    #[test]
    fn merge_keeps_the_widest_mode_and_latest_initializer() {
        let init: Arc<dyn SyncInitializer> = Arc::new(NoopInitializer);
        let pending =
            SyncRequest::with_initializer(NewProjectMode::ImportAll, Arc::clone(&init));
        let newer = SyncRequest::new(NewProjectMode::RejectNew);

        let merged = pending.merge(newer);
        assert_eq!(merged.mode, NewProjectMode::ImportAll);
        // The newer request carried no initializer; the pending one survives.
        assert!(merged
            .initializer
            .as_ref()
            .is_some_and(|kept| Arc::ptr_eq(kept, &init)));
    }
}
