use crate::registry::HandleRegistry;
use showroom_cache::{MokaResolutionCache, ResolutionCache};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// The lifetime of one mounted page view.
///
/// A scope owns the view's resolution cache and its local handles. Clones
/// share the same scope. Unmounting (explicitly or by dropping the last
/// clone) releases every handle, and any resolution still in flight at that
/// point finishes without writing anything back.
#[derive(Debug)]
pub struct ViewScope<C = MokaResolutionCache> {
    inner: Arc<ScopeInner<C>>,
}

#[derive(Debug)]
struct ScopeInner<C> {
    cache: C,
    handles: HandleRegistry,
    mounted: AtomicBool,
}

impl<C> Clone for ViewScope<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ViewScope<MokaResolutionCache> {
    /// Mounts a scope with a default in-memory cache.
    pub fn new() -> Self {
        Self::mount(MokaResolutionCache::new())
    }
}

impl Default for ViewScope<MokaResolutionCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ResolutionCache> ViewScope<C> {
    /// Mounts a fresh scope around an empty cache.
    pub fn mount(cache: C) -> Self {
        trace!("mounting view scope");
        Self {
            inner: Arc::new(ScopeInner {
                cache,
                handles: HandleRegistry::new(),
                mounted: AtomicBool::new(true),
            }),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.load(Ordering::SeqCst)
    }

    pub fn cache(&self) -> &C {
        &self.inner.cache
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.inner.handles
    }

    /// Tears the view down: clears the cache and releases every handle.
    ///
    /// Calling it again is a no-op.
    pub async fn unmount(&self) {
        if !self.inner.mounted.swap(false, Ordering::SeqCst) {
            trace!("view scope already unmounted");
            return;
        }

        let released = self.inner.handles.release_all();
        if let Err(e) = self.inner.cache.clear().await {
            warn!(error = %e, "failed to clear resolution cache on unmount");
        }
        debug!(released, "view scope unmounted");
    }
}

impl<C> Drop for ScopeInner<C> {
    fn drop(&mut self) {
        self.mounted.store(false, Ordering::SeqCst);
        let released = self.handles.release_all();
        if released > 0 {
            debug!(released, "view scope dropped with live handles");
        }
    }
}
