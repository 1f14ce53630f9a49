use crate::scope::ViewScope;
use dashmap::DashMap;
use futures::future::join_all;
use showroom_cache::{MokaResolutionCache, ResolutionCache};
use showroom_core::{
    CacheError, LocalHandle, MediaEndpoint, MediaFetcher, MediaReference, ReferenceKind,
    ResolvedUrl,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Shown once even the direct URL failed to display.
pub const DEFAULT_PLACEHOLDER_URL: &str = "/images/placeholder.png";

/// Turns media references into URLs a view can display.
///
/// Relative references are downloaded once per view and served from a local
/// handle; when the download fails the signed direct URL is used instead.
/// Concurrent requests for one reference share a single fetch. Resolution
/// never fails: callers always get something to display.
///
/// Per reference the lifecycle is
/// `Unresolved -> InFlight -> Local | Direct`, with `Local -> Direct` and
/// `Direct -> Placeholder` each taken at most once through
/// [`mark_display_failed`](BlobUrlResolver::mark_display_failed).
pub struct BlobUrlResolver<F, C = MokaResolutionCache> {
    endpoint: Arc<MediaEndpoint>,
    fetcher: Arc<F>,
    scope: ViewScope<C>,
    in_flight: Arc<DashMap<MediaReference, ()>>,
    placeholder: Arc<str>,
}

impl<F, C> Clone for BlobUrlResolver<F, C> {
    fn clone(&self) -> Self {
        Self {
            endpoint: Arc::clone(&self.endpoint),
            fetcher: Arc::clone(&self.fetcher),
            scope: self.scope.clone(),
            in_flight: Arc::clone(&self.in_flight),
            placeholder: Arc::clone(&self.placeholder),
        }
    }
}

impl<F: MediaFetcher, C: ResolutionCache> BlobUrlResolver<F, C> {
    pub fn new(endpoint: MediaEndpoint, fetcher: F, scope: ViewScope<C>) -> Self {
        Self {
            endpoint: Arc::new(endpoint),
            fetcher: Arc::new(fetcher),
            scope,
            in_flight: Arc::new(DashMap::new()),
            placeholder: Arc::from(DEFAULT_PLACEHOLDER_URL),
        }
    }

    /// Overrides the URL used once a direct URL also failed to display.
    pub fn with_placeholder(mut self, placeholder: impl AsRef<str>) -> Self {
        self.placeholder = Arc::from(placeholder.as_ref());
        self
    }

    pub fn endpoint(&self) -> &MediaEndpoint {
        &self.endpoint
    }

    pub fn scope(&self) -> &ViewScope<C> {
        &self.scope
    }

    /// Returns `true` while a fetch for `reference` is in flight in this view.
    pub fn loading(&self, reference: &MediaReference) -> bool {
        self.in_flight.contains_key(reference)
    }

    /// Unmounts the owning view. See [`ViewScope::unmount`].
    pub async fn unmount(&self) {
        self.scope.unmount().await;
    }

    /// Resolves a reference into a displayable URL.
    ///
    /// Empty references resolve to [`ResolvedUrl::Empty`] and absolute ones
    /// are passed through; neither touches the network or the cache.
    pub async fn resolve(&self, reference: &MediaReference) -> ResolvedUrl {
        match reference.kind() {
            ReferenceKind::Empty => return ResolvedUrl::Empty,
            ReferenceKind::Absolute => {
                return ResolvedUrl::Passthrough(reference.as_str().to_owned())
            }
            ReferenceKind::Relative => {}
        }

        if !self.scope.is_mounted() {
            debug!(reference = %reference, "view unmounted, using direct url");
            return self.direct(reference);
        }

        let cache = self.scope.cache();
        let outcome = cache
            .get_or_compute(reference, move |r| {
                let reference = r.clone();
                async move { self.materialize(&reference).await }
            })
            .await;

        match outcome {
            Ok(resolved) if self.scope.is_mounted() => resolved,
            Ok(resolved) => {
                // Unmount landed between the fetch and the cache insert.
                let _ = cache.del(reference).await;
                if let ResolvedUrl::Local(handle) = &resolved {
                    self.scope.handles().release(handle);
                }
                debug!(reference = %reference, "view unmounted before store, result discarded");
                self.direct(reference)
            }
            Err(CacheError::Detached) => {
                debug!(reference = %reference, "view unmounted during fetch, result discarded");
                self.direct(reference)
            }
        }
    }

    /// Resolves every reference concurrently, keeping input order.
    ///
    /// The output always has one entry per input.
    pub async fn resolve_batch(&self, references: &[MediaReference]) -> Vec<ResolvedUrl> {
        trace!(count = references.len(), "resolving batch");
        join_all(references.iter().map(|reference| self.resolve(reference))).await
    }

    /// Computes the replacement for a local handle that failed to display.
    ///
    /// Returns `None` unless `displayed` is a local handle and `original` is
    /// a relative reference, and also when `displayed` already is the direct
    /// URL, so a failing image is retried at most once. Does not touch the
    /// cache.
    pub fn resolve_fallback(&self, displayed: &str, original: &MediaReference) -> Option<String> {
        if !LocalHandle::is_local_handle(displayed) || original.kind() != ReferenceKind::Relative {
            return None;
        }

        let direct = self.endpoint.direct_url(original);
        if displayed == direct {
            return None;
        }
        Some(direct)
    }

    /// Records that the URL shown for `reference` failed to display.
    ///
    /// A local handle is released and replaced by the direct URL; a direct
    /// URL is replaced by the placeholder. Anything else, including a report
    /// about a URL that is no longer current, is ignored and yields `None`.
    pub async fn mark_display_failed(
        &self,
        reference: &MediaReference,
        displayed: &str,
    ) -> Option<ResolvedUrl> {
        if !self.scope.is_mounted() {
            return None;
        }

        let current = match self.scope.cache().get(reference).await {
            Ok(Some(current)) => current,
            Ok(None) => return None,
            Err(e) => {
                warn!(reference = %reference, error = %e, "could not read resolution cache");
                return None;
            }
        };

        if current.as_str() != displayed {
            trace!(reference = %reference, "stale display failure ignored");
            return None;
        }

        let next = match current {
            ResolvedUrl::Local(handle) => {
                self.scope.handles().release(&handle);
                self.direct(reference)
            }
            ResolvedUrl::Direct(_) => ResolvedUrl::Placeholder(self.placeholder.to_string()),
            _ => return None,
        };

        debug!(
            reference = %reference,
            from = current_kind(displayed),
            to = next.kind(),
            "display fallback"
        );
        if let Err(e) = self.scope.cache().set(reference, &next).await {
            warn!(reference = %reference, error = %e, "could not record display fallback");
        }
        Some(next)
    }

    fn direct(&self, reference: &MediaReference) -> ResolvedUrl {
        ResolvedUrl::Direct(self.endpoint.direct_url(reference))
    }

    /// Fetches a reference and turns it into a cacheable resolution.
    async fn materialize(&self, reference: &MediaReference) -> Result<ResolvedUrl, CacheError> {
        let _marker = InFlight::enter(&self.in_flight, reference);

        let fetched = self.fetcher.fetch(reference).await;

        if !self.scope.is_mounted() {
            return Err(CacheError::Detached);
        }

        match fetched {
            Ok(media) => match self.scope.handles().register(media) {
                Some(handle) => Ok(ResolvedUrl::Local(handle)),
                None => Err(CacheError::Detached),
            },
            Err(e) => {
                warn!(
                    reference = %reference,
                    error = %e,
                    "media fetch failed, falling back to direct url"
                );
                Ok(self.direct(reference))
            }
        }
    }
}

fn current_kind(displayed: &str) -> &'static str {
    if LocalHandle::is_local_handle(displayed) {
        "local"
    } else {
        "direct"
    }
}

/// Marks a reference as loading for as long as the guard lives.
struct InFlight<'a> {
    markers: &'a DashMap<MediaReference, ()>,
    reference: MediaReference,
}

impl<'a> InFlight<'a> {
    fn enter(markers: &'a DashMap<MediaReference, ()>, reference: &MediaReference) -> Self {
        markers.insert(reference.clone(), ());
        Self {
            markers,
            reference: reference.clone(),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.markers.remove(&self.reference);
    }
}
