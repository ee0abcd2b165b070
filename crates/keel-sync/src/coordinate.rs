use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use keel_model::ModelTree;
use keel_workspace::{Reconciler, SyncProblem, SyncStatus, SynchronizationResult};
use tokio_util::sync::CancellationToken;

use crate::identity::BuildIdentity;
use crate::provider::{CachePolicy, ModelProvider, ProviderError};
use crate::request::{covered_by, initializer_covered, SyncRequest};

/// Where one build's synchronization currently stands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncState {
    #[default]
    Idle,
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

/// Polling view of one build's coordinator entry.
#[derive(Debug, Clone)]
pub struct SyncStatusSnapshot {
    pub state: SyncState,
    /// A follow-up request is parked behind the current attempt.
    pub pending: bool,
    pub last: Option<SynchronizationResult>,
}

/// Schedules synchronization runs across builds.
///
/// One attempt per build at a time: covered requests attach to the in-flight
/// run, a more permissive mode upgrades it in place while its reload is
/// still in flight, and anything else parks as the single pending follow-up.
/// Every run's plan+apply phase holds the one workspace-wide lock, so applies
/// of different builds never interleave; reloads overlap freely.
///
/// Collaborators are constructor-injected; the coordinator owns no global
/// state beyond its own entries.
#[derive(Clone)]
pub struct SyncCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    provider: Arc<dyn ModelProvider>,
    reconciler: Reconciler,
    /// The single mutual-exclusion resource of the whole subsystem.
    workspace: Mutex<()>,
    state: Mutex<State>,
    wake: Condvar,
}

#[derive(Default)]
struct State {
    entries: HashMap<BuildIdentity, BuildEntry>,
}

#[derive(Default)]
struct BuildEntry {
    state: SyncState,
    current: Option<InFlight>,
    pending: Option<PendingSync>,
    next_epoch: u64,
    completed_epoch: u64,
    /// Highest follow-up epoch discarded by an explicit cancel; folded into
    /// `completed_epoch` when the current attempt finishes so its waiters are
    /// released.
    abandoned_epoch: u64,
    last: Option<SynchronizationResult>,
}

struct InFlight {
    epoch: u64,
    request: SyncRequest,
    cancel: CancellationToken,
    /// Set at the reconcile barrier; from then on upgrades park as the
    /// pending follow-up instead of mutating this attempt.
    mode_consumed: bool,
}

struct PendingSync {
    epoch: u64,
    request: SyncRequest,
}

impl SyncCoordinator {
    pub fn new(provider: Arc<dyn ModelProvider>, reconciler: Reconciler) -> Self {
        Self {
            inner: Arc::new(Inner {
                provider,
                reconciler,
                workspace: Mutex::new(()),
                state: Mutex::new(State::default()),
                wake: Condvar::new(),
            }),
        }
    }

    /// Enqueues a synchronization of `build` and returns a waitable handle.
    ///
    /// Requests covered by the queued/running attempt share its handle; see
    /// [`covered_by`] for the predicate.
    pub fn synchronize(&self, build: &BuildIdentity, request: SyncRequest) -> SyncHandle {
        let mut state = self.lock_state();
        let entry = state.entries.entry(build.clone()).or_default();

        if let Some(current) = entry.current.as_mut() {
            if covered_by(build, &request, build, &current.request) {
                tracing::debug!(
                    target: "keel.sync",
                    build = %build,
                    epoch = current.epoch,
                    "request covered by in-flight run"
                );
                return self.handle(build, current.epoch);
            }
            if !current.mode_consumed && initializer_covered(&request, &current.request) {
                // Differs only by a more permissive mode and the run has not
                // passed its reconcile barrier yet: upgrade in place.
                current.request.mode = current.request.mode.max(request.mode);
                tracing::debug!(
                    target: "keel.sync",
                    build = %build,
                    epoch = current.epoch,
                    mode = ?current.request.mode,
                    "upgraded in-flight run"
                );
                return self.handle(build, current.epoch);
            }
            let pending = match entry.pending.take() {
                Some(pending) => PendingSync {
                    epoch: pending.epoch,
                    request: pending.request.merge(request),
                },
                None => {
                    entry.next_epoch += 1;
                    PendingSync {
                        epoch: entry.next_epoch,
                        request,
                    }
                }
            };
            tracing::debug!(
                target: "keel.sync",
                build = %build,
                epoch = pending.epoch,
                "parked as pending follow-up"
            );
            let epoch = pending.epoch;
            entry.pending = Some(pending);
            return self.handle(build, epoch);
        }

        entry.next_epoch += 1;
        let epoch = entry.next_epoch;
        entry.current = Some(InFlight {
            epoch,
            request,
            cancel: CancellationToken::new(),
            mode_consumed: false,
        });
        entry.state = SyncState::Queued;
        tracing::debug!(target: "keel.sync", build = %build, epoch, "synchronization queued");
        self.spawn_worker(build.clone());
        self.handle(build, epoch)
    }

    /// Cancels the current attempt for `build` and discards its pending
    /// follow-up. Advisory: the running attempt stops at the next decision
    /// boundary and terminates `Cancelled` with whatever already committed.
    pub fn cancel(&self, build: &BuildIdentity) {
        let mut state = self.lock_state();
        let Some(entry) = state.entries.get_mut(build) else {
            return;
        };
        if let Some(pending) = entry.pending.take() {
            entry.abandoned_epoch = entry.abandoned_epoch.max(pending.epoch);
        }
        if let Some(current) = entry.current.as_ref() {
            tracing::debug!(
                target: "keel.sync",
                build = %build,
                epoch = current.epoch,
                "cancellation requested"
            );
            current.cancel.cancel();
        }
        self.inner.wake.notify_all();
    }

    pub fn status(&self, build: &BuildIdentity) -> SyncStatusSnapshot {
        let state = self.lock_state();
        match state.entries.get(build) {
            Some(entry) => SyncStatusSnapshot {
                state: entry.state,
                pending: entry.pending.is_some(),
                last: entry.last.clone(),
            },
            None => SyncStatusSnapshot {
                state: SyncState::Idle,
                pending: false,
                last: None,
            },
        }
    }

    /// Every build this coordinator has seen. Entries are created on first
    /// request and retained.
    pub fn builds(&self) -> Vec<BuildIdentity> {
        let mut builds: Vec<BuildIdentity> = self.lock_state().entries.keys().cloned().collect();
        builds.sort();
        builds
    }

    fn handle(&self, build: &BuildIdentity, epoch: u64) -> SyncHandle {
        SyncHandle {
            inner: Arc::clone(&self.inner),
            build: build.clone(),
            epoch,
        }
    }

    fn spawn_worker(&self, build: BuildIdentity) {
        let inner = Arc::clone(&self.inner);
        std::thread::Builder::new()
            .name(format!("keel-sync-{build}"))
            .spawn(move || worker_loop(inner, build))
            .expect("failed to spawn keel sync worker thread");
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .expect("sync coordinator lock poisoned")
    }
}

/// Waits on one enqueued synchronization. Coalesced requests share the
/// in-flight run's handle; parked follow-ups get a handle for the run that
/// will execute them.
#[derive(Clone)]
pub struct SyncHandle {
    inner: Arc<Inner>,
    build: BuildIdentity,
    epoch: u64,
}

impl SyncHandle {
    pub fn build(&self) -> &BuildIdentity {
        &self.build
    }

    /// Blocks until the run completed and returns the latest result for the
    /// build (never older than the awaited run).
    pub fn wait(&self) -> SynchronizationResult {
        let mut state = self
            .inner
            .state
            .lock()
            .expect("sync coordinator lock poisoned");
        loop {
            if let Some(result) = finished(&state, &self.build, self.epoch) {
                return result;
            }
            state = self
                .inner
                .wake
                .wait(state)
                .expect("sync coordinator lock poisoned");
        }
    }

    pub fn try_result(&self) -> Option<SynchronizationResult> {
        let state = self
            .inner
            .state
            .lock()
            .expect("sync coordinator lock poisoned");
        finished(&state, &self.build, self.epoch)
    }
}

fn finished(state: &State, build: &BuildIdentity, epoch: u64) -> Option<SynchronizationResult> {
    let entry = state.entries.get(build)?;
    if entry.completed_epoch >= epoch {
        entry.last.clone()
    } else {
        None
    }
}

fn worker_loop(inner: Arc<Inner>, build: BuildIdentity) {
    loop {
        let (epoch, request, cancel) = {
            let mut state = inner.state.lock().expect("sync coordinator lock poisoned");
            let entry = state
                .entries
                .get_mut(&build)
                .expect("worker entry registered");
            let current = entry
                .current
                .as_ref()
                .expect("worker has a current attempt");
            entry.state = SyncState::Running;
            (current.epoch, current.request.clone(), current.cancel.clone())
        };
        tracing::info!(target: "keel.sync", build = %build, epoch, "synchronization started");

        let result = run_sync(&inner, &build, &request, &cancel);

        let mut state = inner.state.lock().expect("sync coordinator lock poisoned");
        let entry = state
            .entries
            .get_mut(&build)
            .expect("worker entry registered");
        tracing::info!(
            target: "keel.sync",
            build = %build,
            epoch,
            status = ?result.status,
            "synchronization finished"
        );
        entry.state = terminal_state(result.status);
        entry.completed_epoch = entry
            .completed_epoch
            .max(epoch)
            .max(entry.abandoned_epoch);
        entry.last = Some(result);
        entry.current = None;

        let follow_up = entry.pending.take();
        match follow_up {
            Some(pending) => {
                entry.current = Some(InFlight {
                    epoch: pending.epoch,
                    request: pending.request,
                    cancel: CancellationToken::new(),
                    mode_consumed: false,
                });
                entry.state = SyncState::Queued;
                inner.wake.notify_all();
            }
            None => {
                inner.wake.notify_all();
                return;
            }
        }
    }
}

/// One attempt, start to finish: initializer, forced model reload,
/// normalization, then plan+apply under the workspace lock.
fn run_sync(
    inner: &Inner,
    build: &BuildIdentity,
    request: &SyncRequest,
    cancel: &CancellationToken,
) -> SynchronizationResult {
    if cancel.is_cancelled() {
        return cancelled_result();
    }
    if let Some(initializer) = &request.initializer {
        if let Err(err) = initializer.initialize(build, cancel) {
            return SynchronizationResult::failed(SyncProblem::error(
                "initializer",
                None,
                err.to_string(),
            ));
        }
    }

    let raw = match inner
        .provider
        .fetch_model(build, CachePolicy::ForceReload, cancel)
    {
        Ok(raw) => raw,
        Err(ProviderError::Cancelled) => return cancelled_result(),
        Err(err) => {
            return SynchronizationResult::failed(SyncProblem::error(
                "model-reload",
                None,
                err.to_string(),
            ));
        }
    };
    let tree = match ModelTree::build(&raw) {
        Ok(tree) => tree,
        Err(err) => {
            return SynchronizationResult::failed(SyncProblem::error(
                "model-reload",
                None,
                err.to_string(),
            ));
        }
    };

    // Reconcile barrier: the mode is consumed here, so in-place upgrades are
    // only possible while the reload above is still in flight.
    let mode = {
        let mut state = inner.state.lock().expect("sync coordinator lock poisoned");
        let entry = state
            .entries
            .get_mut(build)
            .expect("worker entry registered");
        let current = entry
            .current
            .as_mut()
            .expect("worker has a current attempt");
        current.mode_consumed = true;
        current.request.mode
    };
    let policy = mode.policy();

    if cancel.is_cancelled() {
        return cancelled_result();
    }

    // Applies of different builds never interleave.
    let _workspace = inner.workspace.lock().expect("workspace lock poisoned");
    inner
        .reconciler
        .synchronize_tree(&tree, policy.as_ref(), cancel)
}

fn cancelled_result() -> SynchronizationResult {
    SynchronizationResult {
        status: SyncStatus::Cancelled,
        outcomes: Vec::new(),
        problems: Vec::new(),
    }
}

fn terminal_state(status: SyncStatus) -> SyncState {
    match status {
        SyncStatus::Succeeded => SyncState::Succeeded,
        SyncStatus::Partial | SyncStatus::Failed => SyncState::Failed,
        SyncStatus::Cancelled => SyncState::Cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_runs_surface_as_failed_entries() {
        assert_eq!(terminal_state(SyncStatus::Succeeded), SyncState::Succeeded);
        assert_eq!(terminal_state(SyncStatus::Partial), SyncState::Failed);
        assert_eq!(terminal_state(SyncStatus::Failed), SyncState::Failed);
        assert_eq!(terminal_state(SyncStatus::Cancelled), SyncState::Cancelled);
    }
}
