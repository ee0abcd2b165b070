use std::collections::HashMap;
use std::sync::Arc;

use keel_model::RawProjectNode;
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::identity::BuildIdentity;

/// How a model fetch treats previously-loaded models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Never consult the tool; a miss fails with [`ProviderError::NotCached`].
    FromCacheOnly,
    /// Use a cached model when present, load and cache otherwise.
    LoadIfAbsent,
    /// Always reload and replace whatever was cached.
    ForceReload,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no cached model for build `{build}`")]
    NotCached { build: String },

    #[error("model reload cancelled")]
    Cancelled,

    /// Failure reported by the external build tool.
    #[error("{0}")]
    Tool(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProviderError {
    pub fn tool(message: impl Into<String>) -> Self {
        ProviderError::Tool(message.into())
    }
}

/// Produces the raw build model for one build.
///
/// Blocking from the caller's perspective; implementations talk to the
/// external tool however they like and poll the token at their own
/// suspension points. The raw model's shape is the tool's business, already
/// wrapped in [`keel_model::Capability`] per version-gated attribute.
pub trait ModelProvider: Send + Sync {
    fn fetch_model(
        &self,
        build: &BuildIdentity,
        policy: CachePolicy,
        token: &CancellationToken,
    ) -> Result<Arc<RawProjectNode>, ProviderError>;
}

/// Per-build in-memory model cache in front of any [`ModelProvider`].
///
/// The cache holds the raw model, not the normalized tree: normalization is
/// cheap and per-run, reloads are not.
pub struct CachingModelProvider {
    delegate: Arc<dyn ModelProvider>,
    cache: Mutex<HashMap<BuildIdentity, Arc<RawProjectNode>>>,
}

impl CachingModelProvider {
    pub fn new(delegate: Arc<dyn ModelProvider>) -> Self {
        Self {
            delegate,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Drops the cached model for one build, if any.
    pub fn invalidate(&self, build: &BuildIdentity) {
        self.cache.lock().remove(build);
    }

    pub fn clear(&self) {
        self.cache.lock().clear();
    }
}

impl ModelProvider for CachingModelProvider {
    fn fetch_model(
        &self,
        build: &BuildIdentity,
        policy: CachePolicy,
        token: &CancellationToken,
    ) -> Result<Arc<RawProjectNode>, ProviderError> {
        match policy {
            CachePolicy::FromCacheOnly => {
                self.cache
                    .lock()
                    .get(build)
                    .cloned()
                    .ok_or_else(|| ProviderError::NotCached {
                        build: build.display_name().to_string(),
                    })
            }
            CachePolicy::LoadIfAbsent => {
                if let Some(cached) = self.cache.lock().get(build).cloned() {
                    return Ok(cached);
                }
                // Not held across the delegate call: reloads of different
                // builds overlap freely.
                let loaded = self.delegate.fetch_model(build, policy, token)?;
                self.cache.lock().insert(build.clone(), Arc::clone(&loaded));
                Ok(loaded)
            }
            CachePolicy::ForceReload => {
                let loaded = self.delegate.fetch_model(build, policy, token)?;
                self.cache.lock().insert(build.clone(), Arc::clone(&loaded));
                Ok(loaded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use keel_model::ProjectPath;

    use super::*;

    struct CountingProvider {
        fetches: AtomicUsize,
    }

    impl CountingProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl ModelProvider for CountingProvider {
        fn fetch_model(
            &self,
            build: &BuildIdentity,
            _policy: CachePolicy,
            _token: &CancellationToken,
        ) -> Result<Arc<RawProjectNode>, ProviderError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(RawProjectNode::new(
                build.display_name(),
                ProjectPath::parse(":").unwrap(),
                build.root_dir(),
            )))
        }
    }

    #[test]
    fn from_cache_only_misses_without_a_delegate_call() {
        let delegate = CountingProvider::new();
        let caching = CachingModelProvider::new(delegate.clone());
        let build = BuildIdentity::new("/work/app");
        let token = CancellationToken::new();

        let err = caching
            .fetch_model(&build, CachePolicy::FromCacheOnly, &token)
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotCached { .. }));
        assert_eq!(delegate.fetches(), 0);
    }

    #[test]
    fn load_if_absent_delegates_once() {
        let delegate = CountingProvider::new();
        let caching = CachingModelProvider::new(delegate.clone());
        let build = BuildIdentity::new("/work/app");
        let token = CancellationToken::new();

        let first = caching
            .fetch_model(&build, CachePolicy::LoadIfAbsent, &token)
            .unwrap();
        let second = caching
            .fetch_model(&build, CachePolicy::LoadIfAbsent, &token)
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(delegate.fetches(), 1);

        // And the warm entry now satisfies cache-only reads.
        caching
            .fetch_model(&build, CachePolicy::FromCacheOnly, &token)
            .unwrap();
        assert_eq!(delegate.fetches(), 1);
    }

    #[test]
    fn force_reload_bypasses_a_warm_cache() {
        let delegate = CountingProvider::new();
        let caching = CachingModelProvider::new(delegate.clone());
        let build = BuildIdentity::new("/work/app");
        let token = CancellationToken::new();

        let first = caching
            .fetch_model(&build, CachePolicy::LoadIfAbsent, &token)
            .unwrap();
        let reloaded = caching
            .fetch_model(&build, CachePolicy::ForceReload, &token)
            .unwrap();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(delegate.fetches(), 2);
    }

    #[test]
    fn invalidate_forgets_one_build() {
        let delegate = CountingProvider::new();
        let caching = CachingModelProvider::new(delegate.clone());
        let build = BuildIdentity::new("/work/app");
        let token = CancellationToken::new();

        caching
            .fetch_model(&build, CachePolicy::LoadIfAbsent, &token)
            .unwrap();
        caching.invalidate(&build);
        caching
            .fetch_model(&build, CachePolicy::LoadIfAbsent, &token)
            .unwrap();
        assert_eq!(delegate.fetches(), 2);
    }
}
