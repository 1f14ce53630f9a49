use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use showroom_core::{FetchError, FetchedMedia, MediaEndpoint, MediaFetcher, MediaReference};
use tracing::{debug, trace};

/// Downloads media from the signed direct URL over HTTP.
///
/// Redirects are followed; any non-2xx status, transport error or empty body
/// is a [`FetchError`].
#[derive(Debug, Clone)]
pub struct HttpMediaFetcher {
    client: Client,
    endpoint: MediaEndpoint,
}

impl HttpMediaFetcher {
    pub fn new(endpoint: MediaEndpoint) -> Result<Self, FetchError> {
        let client = Client::builder()
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self::with_client(client, endpoint))
    }

    pub fn with_client(client: Client, endpoint: MediaEndpoint) -> Self {
        Self { client, endpoint }
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, reference: &MediaReference) -> Result<FetchedMedia, FetchError> {
        let url = self.endpoint.direct_url(reference);
        trace!(reference = %reference, "fetching media");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;
        if bytes.is_empty() {
            return Err(FetchError::EmptyBody);
        }

        debug!(reference = %reference, bytes = bytes.len(), "fetched media");
        Ok(FetchedMedia::new(bytes, content_type))
    }
}
