use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use showroom_core::{
    ApiResponse, BackendError, CommentBackend, CommentId, CommentNode, EngagementBackend,
    NewComment, TemplateId, ToggleState, UserId,
};
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, TypedBuilder)]
pub struct HttpBackendConfig {
    /// Root of the API, e.g. `https://api.example.com/v1/`.
    #[builder(setter(into))]
    pub api_base: String,
    #[builder(default = DEFAULT_REQUEST_TIMEOUT)]
    pub timeout: Duration,
}

#[derive(Serialize)]
struct UserBody<'a> {
    user_id: &'a UserId,
}

/// JSON-over-HTTP implementation of the comment and engagement backends.
///
/// Every response body must be an [`ApiResponse`] envelope. `401` and `403`
/// become [`BackendError::Unauthorized`] regardless of the body.
#[derive(Debug, Clone)]
pub struct HttpCommentBackend {
    client: Client,
    api_base: Url,
}

impl HttpCommentBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        Self::with_client(client, &config.api_base)
    }

    pub fn with_client(client: Client, api_base: &str) -> Result<Self, BackendError> {
        let api_base = Url::parse(api_base)
            .map_err(|e| BackendError::Unavailable(format!("invalid api base {api_base}: {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(BackendError::Unavailable(format!(
                "invalid api base {api_base}: not a hierarchical url"
            )));
        }
        Ok(Self { client, api_base })
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(BackendError::Unauthorized);
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::Unavailable(e.to_string()))?;
        trace!(status = %status, bytes = body.len(), "backend responded");

        match serde_json::from_slice::<ApiResponse<T>>(&body) {
            Ok(envelope) => envelope.into_result(),
            Err(e) if status.is_success() => Err(BackendError::InvalidData(e.to_string())),
            Err(_) => Err(BackendError::Unavailable(format!("backend returned {status}"))),
        }
    }

    /// For endpoints whose `data` carries nothing of interest.
    async fn send_unit(&self, request: RequestBuilder) -> Result<(), BackendError> {
        self.send::<Option<serde_json::Value>>(request).await.map(|_| ())
    }
}

#[async_trait]
impl CommentBackend for HttpCommentBackend {
    async fn list_comments(
        &self,
        template: &TemplateId,
        viewer: Option<&UserId>,
    ) -> Result<Vec<CommentNode>, BackendError> {
        let mut request = self
            .client
            .get(self.url(&["templates", template.as_str(), "comments"]));
        if let Some(viewer) = viewer {
            request = request.query(&[("viewer_id", viewer.as_str())]);
        }
        let comments: Vec<CommentNode> = self.send(request).await?;
        debug!(template = %template, roots = comments.len(), "listed comments");
        Ok(comments)
    }

    async fn post_comment(&self, comment: &NewComment) -> Result<(), BackendError> {
        let url = self.url(&["templates", comment.template_id.as_str(), "comments"]);
        self.send_unit(self.client.post(url).json(comment)).await
    }

    async fn delete_comment(
        &self,
        comment: &CommentId,
        requester: &UserId,
    ) -> Result<(), BackendError> {
        let request = self
            .client
            .delete(self.url(&["comments", comment.as_str()]))
            .query(&[("requester_id", requester.as_str())]);
        self.send_unit(request).await
    }

    async fn toggle_like(&self, comment: &CommentId, user: &UserId) -> Result<(), BackendError> {
        let request = self
            .client
            .post(self.url(&["comments", comment.as_str(), "like"]))
            .json(&UserBody { user_id: user });
        self.send_unit(request).await
    }
}

#[async_trait]
impl EngagementBackend for HttpCommentBackend {
    async fn toggle_favorite(
        &self,
        template: &TemplateId,
        user: &UserId,
    ) -> Result<ToggleState, BackendError> {
        let request = self
            .client
            .post(self.url(&["templates", template.as_str(), "favorite"]))
            .json(&UserBody { user_id: user });
        self.send(request).await
    }

    async fn toggle_follow(
        &self,
        author: &UserId,
        user: &UserId,
    ) -> Result<ToggleState, BackendError> {
        let request = self
            .client
            .post(self.url(&["users", author.as_str(), "follow"]))
            .json(&UserBody { user_id: user });
        self.send(request).await
    }
}
