use crate::comment::{CommentNode, CommentText};
use crate::error::BackendError;
use crate::identity::{CommentId, TemplateId, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Envelope every backend response is validated against.
///
/// On the wire this is `{"status":"success","data":...}` or
/// `{"status":"failure","reason":"..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ApiResponse<T> {
    Success { data: T },
    Failure { reason: String },
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T, BackendError> {
        match self {
            ApiResponse::Success { data } => Ok(data),
            ApiResponse::Failure { reason } => Err(BackendError::Rejected(reason)),
        }
    }
}

/// A comment about to be posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComment {
    pub template_id: TemplateId,
    pub author_id: UserId,
    pub text: CommentText,
    /// `None` for a top-level comment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<CommentId>,
}

/// Authoritative on/off state returned by a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleState {
    pub active: bool,
}

/// Remote comment store for templates.
#[async_trait]
pub trait CommentBackend: Send + Sync + 'static {
    /// Returns the full comment tree of a template.
    ///
    /// `viewer` lets the backend fill in `liked_by_viewer`.
    async fn list_comments(
        &self,
        template: &TemplateId,
        viewer: Option<&UserId>,
    ) -> Result<Vec<CommentNode>, BackendError>;

    async fn post_comment(&self, comment: &NewComment) -> Result<(), BackendError>;

    /// The backend is the authority on ownership and may still refuse.
    async fn delete_comment(
        &self,
        comment: &CommentId,
        requester: &UserId,
    ) -> Result<(), BackendError>;

    /// Flips `user`'s like on a comment.
    async fn toggle_like(&self, comment: &CommentId, user: &UserId) -> Result<(), BackendError>;
}

/// Remote store for template favorites and author follows.
#[async_trait]
pub trait EngagementBackend: Send + Sync + 'static {
    async fn toggle_favorite(
        &self,
        template: &TemplateId,
        user: &UserId,
    ) -> Result<ToggleState, BackendError>;

    async fn toggle_follow(&self, author: &UserId, user: &UserId)
        -> Result<ToggleState, BackendError>;
}

#[async_trait]
impl<T: CommentBackend + ?Sized> CommentBackend for Arc<T> {
    async fn list_comments(
        &self,
        template: &TemplateId,
        viewer: Option<&UserId>,
    ) -> Result<Vec<CommentNode>, BackendError> {
        (**self).list_comments(template, viewer).await
    }

    async fn post_comment(&self, comment: &NewComment) -> Result<(), BackendError> {
        (**self).post_comment(comment).await
    }

    async fn delete_comment(
        &self,
        comment: &CommentId,
        requester: &UserId,
    ) -> Result<(), BackendError> {
        (**self).delete_comment(comment, requester).await
    }

    async fn toggle_like(&self, comment: &CommentId, user: &UserId) -> Result<(), BackendError> {
        (**self).toggle_like(comment, user).await
    }
}

#[async_trait]
impl<T: EngagementBackend + ?Sized> EngagementBackend for Arc<T> {
    async fn toggle_favorite(
        &self,
        template: &TemplateId,
        user: &UserId,
    ) -> Result<ToggleState, BackendError> {
        (**self).toggle_favorite(template, user).await
    }

    async fn toggle_follow(
        &self,
        author: &UserId,
        user: &UserId,
    ) -> Result<ToggleState, BackendError> {
        (**self).toggle_follow(author, user).await
    }
}
