use keel_workspace::{SyncStatus, SynchronizationResult};

use crate::coordinate::SyncCoordinator;
use crate::error::{AggregateSyncError, SyncError};
use crate::identity::BuildIdentity;
use crate::request::SyncRequest;

impl SyncCoordinator {
    /// Synchronizes several builds and joins the runs.
    ///
    /// Every request is enqueued before any result is awaited, so independent
    /// builds reload in parallel (applies still serialize on the workspace
    /// lock). Successful runs keep their effects regardless of failures
    /// elsewhere: zero failed runs yield every result, exactly one failure
    /// propagates directly, several are wrapped so none is dropped.
    pub fn synchronize_batch(
        &self,
        requests: Vec<(BuildIdentity, SyncRequest)>,
    ) -> Result<Vec<SynchronizationResult>, SyncError> {
        let handles: Vec<_> = requests
            .into_iter()
            .map(|(build, request)| {
                let handle = self.synchronize(&build, request);
                (build, handle)
            })
            .collect();

        let mut results = Vec::with_capacity(handles.len());
        let mut errors = Vec::new();
        for (build, handle) in handles {
            let result = handle.wait();
            if result.status == SyncStatus::Failed {
                errors.push(SyncError::BuildFailed {
                    build: build.display_name().to_string(),
                    message: failure_message(&result),
                });
            }
            results.push(result);
        }
        AggregateSyncError::collect(errors)?;
        Ok(results)
    }
}

fn failure_message(result: &SynchronizationResult) -> String {
    let messages: Vec<&str> = result
        .errors()
        .map(|problem| problem.message.as_str())
        .collect();
    if messages.is_empty() {
        "synchronization failed".to_string()
    } else {
        messages.join("; ")
    }
}
