use async_trait::async_trait;
use showroom_cache::{ResolutionCache, Result};
use showroom_core::{MediaReference, ResolvedUrl};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Wraps a cache and counts every write that reaches it.
///
/// Writes are `set` calls plus computations inside `get_or_compute` that
/// produced a value to store. Clones share the counter.
#[derive(Debug, Clone)]
pub struct RecordingCache<C> {
    inner: C,
    writes: Arc<AtomicUsize>,
}

impl<C> RecordingCache<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: ResolutionCache> ResolutionCache for RecordingCache<C> {
    async fn get(&self, reference: &MediaReference) -> Result<Option<ResolvedUrl>> {
        self.inner.get(reference).await
    }

    async fn set(&self, reference: &MediaReference, resolved: &ResolvedUrl) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.set(reference, resolved).await
    }

    async fn del(&self, reference: &MediaReference) -> Result<()> {
        self.inner.del(reference).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }

    async fn get_or_compute<F, Fut>(
        &self,
        reference: &MediaReference,
        compute: F,
    ) -> Result<ResolvedUrl>
    where
        F: FnOnce(&MediaReference) -> Fut + Send,
        Fut: Future<Output = Result<ResolvedUrl>> + Send,
    {
        let writes = Arc::clone(&self.writes);
        self.inner
            .get_or_compute(reference, move |r| {
                let computed = compute(r);
                async move {
                    let resolved = computed.await?;
                    writes.fetch_add(1, Ordering::SeqCst);
                    Ok(resolved)
                }
            })
            .await
    }
}
