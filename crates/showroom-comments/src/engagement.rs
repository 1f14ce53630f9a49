use crate::service::Result;
use showroom_core::{
    EngagementBackend, InteractionError, SessionProvider, TemplateId, UserId, Viewer,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Favorite and follow toggles for the signed-in viewer.
///
/// The returned flag is the state the backend reports after the toggle,
/// never a locally flipped guess.
#[derive(Debug)]
pub struct EngagementService<B, S> {
    backend: Arc<B>,
    session: Arc<S>,
}

impl<B, S> Clone for EngagementService<B, S> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            session: Arc::clone(&self.session),
        }
    }
}

impl<B: EngagementBackend, S: SessionProvider> EngagementService<B, S> {
    pub fn new(backend: B, session: S) -> Self {
        Self {
            backend: Arc::new(backend),
            session: Arc::new(session),
        }
    }

    /// Returns `true` when the template is now a favorite.
    pub async fn toggle_favorite(&self, template: &TemplateId) -> Result<bool> {
        let user = self.require_viewer()?;
        let state = self
            .backend
            .toggle_favorite(template, &user)
            .await
            .map_err(|e| {
                warn!(template = %template, error = %e, "failed to toggle favorite");
                InteractionError::from(e)
            })?;
        debug!(template = %template, active = state.active, "favorite toggled");
        Ok(state.active)
    }

    /// Returns `true` when the viewer now follows `author`.
    pub async fn toggle_follow(&self, author: &UserId) -> Result<bool> {
        let user = self.require_viewer()?;
        if &user == author {
            return Err(InteractionError::Validation(
                "cannot follow yourself".to_string(),
            ));
        }
        let state = self
            .backend
            .toggle_follow(author, &user)
            .await
            .map_err(|e| {
                warn!(author = %author, error = %e, "failed to toggle follow");
                InteractionError::from(e)
            })?;
        debug!(author = %author, active = state.active, "follow toggled");
        Ok(state.active)
    }

    fn require_viewer(&self) -> Result<UserId> {
        match self.session.viewer() {
            Viewer::Authenticated(user) => Ok(user),
            Viewer::Anonymous => Err(InteractionError::AuthRequired {
                login_url: self.session.login_url(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use showroom_core::BackendError;
    use showroom_test_infra::{FixedSession, InMemoryBackend};

    #[tokio::test]
    async fn favorite_alternates() {
        let backend = Arc::new(InMemoryBackend::new());
        let engagement =
            EngagementService::new(Arc::clone(&backend), FixedSession::authenticated("alice"));
        let template = TemplateId::new_unchecked("t-1");

        assert!(engagement.toggle_favorite(&template).await.unwrap());
        assert!(!engagement.toggle_favorite(&template).await.unwrap());
        assert_eq!(backend.mutation_count(), 2);
    }

    #[tokio::test]
    async fn follow_requires_sign_in_and_another_user() {
        let backend = Arc::new(InMemoryBackend::new());
        let session = Arc::new(FixedSession::anonymous());
        let engagement = EngagementService::new(Arc::clone(&backend), Arc::clone(&session));
        let bob = UserId::new_unchecked("bob");

        let err = engagement.toggle_follow(&bob).await.unwrap_err();
        assert!(matches!(err, InteractionError::AuthRequired { .. }));

        session.sign_in("bob");
        let err = engagement.toggle_follow(&bob).await.unwrap_err();
        assert!(matches!(err, InteractionError::Validation(_)));
        assert_eq!(backend.mutation_count(), 0);

        session.sign_in("alice");
        assert!(engagement.toggle_follow(&bob).await.unwrap());
    }

    #[tokio::test]
    async fn backend_failure_is_surfaced() {
        let backend = Arc::new(InMemoryBackend::new());
        let engagement =
            EngagementService::new(Arc::clone(&backend), FixedSession::authenticated("alice"));
        backend.fail_next(BackendError::Unavailable("maintenance".into()));

        let err = engagement
            .toggle_favorite(&TemplateId::new_unchecked("t-1"))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            InteractionError::Backend(BackendError::Unavailable("maintenance".into()))
        );
    }
}
