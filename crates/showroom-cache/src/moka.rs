use crate::cache::{ResolutionCache, Result};
use async_trait::async_trait;
use moka::future::Cache;
use showroom_core::{MediaReference, ResolvedUrl};
use std::future::Future;
use tracing::{debug, trace};

/// An in-memory resolution cache backed by Moka.
///
/// Moka coalesces concurrent initialisations of the same key, which gives
/// [`get_or_compute`](ResolutionCache::get_or_compute) its single-flight
/// behaviour: late callers await the computation already in flight.
///
/// The cache is unbounded and never expires entries: a resolution stays put
/// while its view is mounted and leaves only through `del` or `clear`.
#[derive(Debug, Clone)]
pub struct MokaResolutionCache {
    cache: Cache<MediaReference, ResolvedUrl>,
}

impl MokaResolutionCache {
    pub fn new() -> Self {
        Self {
            cache: Cache::builder().build(),
        }
    }

    /// Pre-sizes the cache for about `capacity` references.
    ///
    /// This is an allocation hint, not a bound.
    pub fn with_initial_capacity(capacity: usize) -> Self {
        Self {
            cache: Cache::builder().initial_capacity(capacity).build(),
        }
    }

    /// Number of stored resolutions after pending maintenance has run.
    pub async fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }
}

impl Default for MokaResolutionCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResolutionCache for MokaResolutionCache {
    async fn get(&self, reference: &MediaReference) -> Result<Option<ResolvedUrl>> {
        trace!(reference = %reference, "probing resolution cache");

        match self.cache.get(reference).await {
            Some(resolved) => {
                debug!(reference = %reference, kind = resolved.kind(), "resolution cache hit");
                Ok(Some(resolved))
            }
            None => {
                trace!(reference = %reference, "resolution cache miss");
                Ok(None)
            }
        }
    }

    async fn set(&self, reference: &MediaReference, resolved: &ResolvedUrl) -> Result<()> {
        self.cache.insert(reference.clone(), resolved.clone()).await;
        debug!(reference = %reference, kind = resolved.kind(), "stored resolution");
        Ok(())
    }

    async fn del(&self, reference: &MediaReference) -> Result<()> {
        self.cache.invalidate(reference).await;
        trace!(reference = %reference, "removed resolution (if present)");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        debug!("cleared resolution cache");
        Ok(())
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
        trace!(reference = %reference, "resolving with single-flight");

        let resolved = self
            .cache
            .try_get_with(reference.clone(), async {
                trace!(reference = %reference, "cache miss, computing resolution");
                compute(reference).await
            })
            .await
            .map_err(|e| e.as_ref().clone())?;

        debug!(
            reference = %reference,
            kind = resolved.kind(),
            "single-flight resolution completed"
        );
        Ok(resolved)
    }
}
