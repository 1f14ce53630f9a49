use async_trait::async_trait;
use showroom_core::{CacheError, MediaReference, ResolvedUrl};
use std::future::Future;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A per-view cache of resolved media URLs.
///
/// Implementations must make [`get_or_compute`](ResolutionCache::get_or_compute)
/// single-flight: concurrent callers for the same reference join one
/// computation instead of starting their own.
#[async_trait]
pub trait ResolutionCache: Send + Sync + 'static {
    /// Get a completed resolution.
    ///
    /// Returns `Ok(None)` if the reference has not been resolved yet.
    async fn get(&self, reference: &MediaReference) -> Result<Option<ResolvedUrl>>;

    /// Store a resolution, replacing any previous one.
    async fn set(&self, reference: &MediaReference, resolved: &ResolvedUrl) -> Result<()>;

    /// Remove a resolution. Removing a missing key is not an error.
    async fn del(&self, reference: &MediaReference) -> Result<()>;

    /// Drop every entry.
    async fn clear(&self) -> Result<()>;

    /// Get a resolution, computing it if not present.
    ///
    /// If `compute` fails nothing is stored and the error is returned.
    async fn get_or_compute<F, Fut>(
        &self,
        reference: &MediaReference,
        compute: F,
    ) -> Result<ResolvedUrl>
    where
        F: FnOnce(&MediaReference) -> Fut + Send,
        Fut: Future<Output = Result<ResolvedUrl>> + Send,
    {
        match self.get(reference).await? {
            Some(resolved) => Ok(resolved),
            None => {
                let resolved = compute(reference).await?;
                self.set(reference, &resolved).await?;
                Ok(resolved)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct TestCache {
        items: Mutex<HashMap<MediaReference, ResolvedUrl>>,
    }

    #[async_trait]
    impl ResolutionCache for TestCache {
        async fn get(&self, reference: &MediaReference) -> Result<Option<ResolvedUrl>> {
            Ok(self.items.lock().await.get(reference).cloned())
        }

        async fn set(&self, reference: &MediaReference, resolved: &ResolvedUrl) -> Result<()> {
            self.items
                .lock()
                .await
                .insert(reference.clone(), resolved.clone());
            Ok(())
        }

        async fn del(&self, reference: &MediaReference) -> Result<()> {
            self.items.lock().await.remove(reference);
            Ok(())
        }

        async fn clear(&self) -> Result<()> {
            self.items.lock().await.clear();
            Ok(())
        }
    }

    fn direct(url: &str) -> ResolvedUrl {
        ResolvedUrl::Direct(url.to_string())
    }

    #[tokio::test]
    async fn get_or_compute_returns_cached_value_without_compute() {
        let cache = TestCache::default();
        let reference = MediaReference::new("images/a.png");
        cache
            .set(&reference, &direct("https://cached.example/a.png"))
            .await
            .unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let result = cache
            .get_or_compute(&reference, {
                let calls = Arc::clone(&calls);
                move |_| async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(direct("https://computed.example/a.png"))
                }
            })
            .await
            .unwrap();

        assert_eq!(result, direct("https://cached.example/a.png"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn get_or_compute_stores_on_miss() {
        let cache = TestCache::default();
        let reference = MediaReference::new("images/a.png");

        let result = cache
            .get_or_compute(&reference, |_| async {
                Ok(direct("https://computed.example/a.png"))
            })
            .await
            .unwrap();

        assert_eq!(result, direct("https://computed.example/a.png"));
        assert_eq!(cache.get(&reference).await.unwrap(), Some(result));
    }

    #[tokio::test]
    async fn get_or_compute_does_not_store_failures() {
        let cache = TestCache::default();
        let reference = MediaReference::new("images/a.png");

        let err = cache
            .get_or_compute(&reference, |_| async { Err(CacheError::Detached) })
            .await
            .unwrap_err();

        assert!(matches!(err, CacheError::Detached));
        assert!(cache.get(&reference).await.unwrap().is_none());
    }
}
