use crate::error::FetchError;
use crate::media::MediaReference;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Raw media bytes as returned by the media endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedMedia {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

impl FetchedMedia {
    pub fn new(bytes: impl Into<Bytes>, content_type: Option<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Downloads the bytes behind a relative media reference.
///
/// Any non-success outcome is reported as a [`FetchError`]; callers are
/// expected to treat all of them uniformly.
#[async_trait]
pub trait MediaFetcher: Send + Sync + 'static {
    async fn fetch(&self, reference: &MediaReference) -> Result<FetchedMedia, FetchError>;
}

#[async_trait]
impl<T: MediaFetcher + ?Sized> MediaFetcher for Arc<T> {
    async fn fetch(&self, reference: &MediaReference) -> Result<FetchedMedia, FetchError> {
        (**self).fetch(reference).await
    }
}
