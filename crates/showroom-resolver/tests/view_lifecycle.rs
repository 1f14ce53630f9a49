use async_trait::async_trait;
use showroom_cache::{MokaResolutionCache, ResolutionCache, Result};
use showroom_core::{FetchedMedia, MediaEndpoint, MediaReference, ResolvedUrl};
use showroom_resolver::{BlobUrlResolver, ViewScope};
use showroom_test_infra::{RecordingCache, ScriptedFetcher};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Notify;

type Resolver = BlobUrlResolver<Arc<ScriptedFetcher>, RecordingCache<MokaResolutionCache>>;

fn png() -> FetchedMedia {
    FetchedMedia::new(&b"\x89PNG"[..], Some("image/png".to_string()))
}

fn mount(fetcher: Arc<ScriptedFetcher>) -> (Resolver, RecordingCache<MokaResolutionCache>) {
    let cache = RecordingCache::new(MokaResolutionCache::new());
    let scope = ViewScope::mount(cache.clone());
    let endpoint = MediaEndpoint::new("https://cdn.example.com/", "sig=abc");
    (BlobUrlResolver::new(endpoint, fetcher, scope), cache)
}

async fn wait_for_fetch(fetcher: &ScriptedFetcher, count: usize) {
    while fetcher.total_calls() < count {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn completion_after_unmount_writes_nothing() {
    let (fetcher, gate) = ScriptedFetcher::new().with_media("images/x.png", png()).gated();
    let fetcher = Arc::new(fetcher);
    let (resolver, cache) = mount(fetcher.clone());
    let reference = MediaReference::new("images/x.png");

    let pending = tokio::spawn({
        let resolver = resolver.clone();
        let reference = reference.clone();
        async move { resolver.resolve(&reference).await }
    });
    wait_for_fetch(&fetcher, 1).await;

    resolver.unmount().await;
    let writes_at_unmount = cache.writes();
    gate.open();
    let resolved = pending.await.unwrap();

    assert_eq!(
        resolved,
        ResolvedUrl::Direct("https://cdn.example.com/images/x.png?sig=abc".to_string())
    );
    assert_eq!(cache.writes(), writes_at_unmount);
    assert_eq!(cache.writes(), 0);
    assert_eq!(resolver.scope().handles().live_count(), 0);
    assert!(cache.get(&reference).await.unwrap().is_none());
    assert_eq!(cache.inner().entry_count().await, 0);
}

#[tokio::test]
async fn joined_callers_all_see_the_unmount() {
    let (fetcher, gate) = ScriptedFetcher::new().with_media("images/x.png", png()).gated();
    let fetcher = Arc::new(fetcher);
    let (resolver, cache) = mount(fetcher.clone());

    let mut pending = vec![];
    for _ in 0..5 {
        let resolver = resolver.clone();
        pending.push(tokio::spawn(async move {
            resolver.resolve(&MediaReference::new("images/x.png")).await
        }));
    }
    wait_for_fetch(&fetcher, 1).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    resolver.unmount().await;
    gate.open();

    for task in pending {
        assert!(task.await.unwrap().is_direct());
    }
    assert_eq!(cache.writes(), 0);
}

#[tokio::test]
async fn mounted_view_records_one_write_per_reference() {
    let fetcher = Arc::new(
        ScriptedFetcher::new()
            .with_media("a.png", png())
            .with_media("b.png", png()),
    );
    let (resolver, cache) = mount(fetcher.clone());

    let refs = vec![
        MediaReference::new("a.png"),
        MediaReference::new("b.png"),
        MediaReference::new("a.png"),
    ];
    let resolved = resolver.resolve_batch(&refs).await;

    assert_eq!(resolved[0], resolved[2]);
    assert_eq!(fetcher.total_calls(), 2);
    assert_eq!(cache.writes(), 2);
    assert_eq!(resolver.scope().handles().live_count(), 2);
}

#[tokio::test]
async fn remounting_starts_from_an_empty_cache() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_media("a.png", png()));
    let reference = MediaReference::new("a.png");

    let (first, _) = mount(fetcher.clone());
    assert!(first.resolve(&reference).await.is_local());
    first.unmount().await;

    let (second, _) = mount(fetcher.clone());
    assert!(second.resolve(&reference).await.is_local());

    assert_eq!(fetcher.calls(&reference), 2);
}

/// Stores computed resolutions, then holds the caller until released.
#[derive(Clone, Default)]
struct PausedAfterStore {
    inner: MokaResolutionCache,
    stored: Arc<Notify>,
    release: Arc<Notify>,
}

#[async_trait]
impl ResolutionCache for PausedAfterStore {
    async fn get(&self, reference: &MediaReference) -> Result<Option<ResolvedUrl>> {
        self.inner.get(reference).await
    }

    async fn set(&self, reference: &MediaReference, resolved: &ResolvedUrl) -> Result<()> {
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
        let resolved = self.inner.get_or_compute(reference, compute).await?;
        self.stored.notify_one();
        self.release.notified().await;
        Ok(resolved)
    }
}

#[tokio::test]
async fn unmount_between_fetch_and_store_yields_direct_url() {
    let fetcher = Arc::new(ScriptedFetcher::new().with_media("images/x.png", png()));
    let cache = PausedAfterStore::default();
    let scope = ViewScope::mount(cache.clone());
    let endpoint = MediaEndpoint::new("https://cdn.example.com/", "sig=abc");
    let resolver = BlobUrlResolver::new(endpoint, fetcher, scope);
    let reference = MediaReference::new("images/x.png");

    let pending = tokio::spawn({
        let resolver = resolver.clone();
        let reference = reference.clone();
        async move { resolver.resolve(&reference).await }
    });
    cache.stored.notified().await;

    resolver.unmount().await;
    // Stands in for a store that lands after the cache was cleared.
    cache
        .inner
        .set(&reference, &ResolvedUrl::Direct("stale".to_string()))
        .await
        .unwrap();
    cache.release.notify_one();
    let resolved = pending.await.unwrap();

    assert_eq!(
        resolved,
        ResolvedUrl::Direct("https://cdn.example.com/images/x.png?sig=abc".to_string())
    );
    assert_eq!(resolver.scope().handles().live_count(), 0);
    assert!(cache.get(&reference).await.unwrap().is_none());
}
