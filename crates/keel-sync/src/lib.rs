//! Synchronization scheduling on top of [`keel_model`] and [`keel_workspace`].
//!
//! The coordinator keeps one entry per build identity and runs at most one
//! attempt per build at a time. Requests against a queued or running attempt
//! are coalesced by a pure covered-by predicate, upgraded in place when only
//! the new-project mode widened, or parked as the single pending follow-up.
//! Batch synchronization fans out per build and joins every failure into one
//! aggregate error. Cancellation is cooperative via [`CancellationToken`],
//! re-exported here so callers need no direct `tokio-util` dependency.

mod batch;
mod coordinate;
mod error;
mod identity;
mod provider;
mod request;

pub use coordinate::{SyncCoordinator, SyncHandle, SyncState, SyncStatusSnapshot};
pub use error::{AggregateSyncError, SyncError};
pub use identity::BuildIdentity;
pub use provider::{CachePolicy, CachingModelProvider, ModelProvider, ProviderError};
pub use request::{
    covered_by, InitializerError, NewProjectMode, SyncInitializer, SyncRequest,
};

pub use tokio_util::sync::CancellationToken;
