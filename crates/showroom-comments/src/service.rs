use parking_lot::RwLock;
use showroom_core::{
    CommentBackend, CommentId, CommentText, CommentTree, InteractionError, NewComment,
    SessionProvider, TemplateId, UserId, Viewer,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

pub type Result<T> = std::result::Result<T, InteractionError>;

#[derive(Debug)]
struct CommentState {
    tree: CommentTree,
    /// Refreshes started but not yet finished.
    pending: usize,
    /// Ticket of the most recently started refresh.
    latest: u64,
}

/// Client-side comment thread of one template.
///
/// The author of new comments, the requester of deletions and the liker are
/// always the viewer reported by the [`SessionProvider`]. Anonymous viewers
/// get [`InteractionError::AuthRequired`] before any request is made.
#[derive(Debug)]
pub struct CommentService<B, S> {
    template: TemplateId,
    backend: Arc<B>,
    session: Arc<S>,
    state: Arc<RwLock<CommentState>>,
}

impl<B, S> Clone for CommentService<B, S> {
    fn clone(&self) -> Self {
        Self {
            template: self.template.clone(),
            backend: Arc::clone(&self.backend),
            session: Arc::clone(&self.session),
            state: Arc::clone(&self.state),
        }
    }
}

impl<B: CommentBackend, S: SessionProvider> CommentService<B, S> {
    pub fn new(template: TemplateId, backend: B, session: S) -> Self {
        Self {
            state: Arc::new(RwLock::new(CommentState {
                tree: CommentTree::empty(template.clone()),
                pending: 0,
                latest: 0,
            })),
            template,
            backend: Arc::new(backend),
            session: Arc::new(session),
        }
    }

    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    /// Snapshot of the last tree fetched from the backend.
    pub fn tree(&self) -> CommentTree {
        self.state.read().tree.clone()
    }

    /// `true` while a refresh is in flight.
    pub fn is_loading(&self) -> bool {
        self.state.read().pending > 0
    }

    /// Replaces the local tree with the backend's.
    ///
    /// On failure the current tree is kept. When refreshes overlap only the
    /// most recently started one may replace the tree.
    pub async fn refresh(&self) -> Result<()> {
        let ticket = {
            let mut state = self.state.write();
            state.pending += 1;
            state.latest += 1;
            state.latest
        };

        let viewer = self.session.viewer();
        trace!(template = %self.template, ticket, "refreshing comments");
        let fetched = self
            .backend
            .list_comments(&self.template, viewer.user_id())
            .await;

        let mut state = self.state.write();
        state.pending -= 1;
        match fetched {
            Ok(comments) if ticket == state.latest => {
                state.tree = CommentTree::new(self.template.clone(), comments);
                debug!(
                    template = %self.template,
                    comments = state.tree.len(),
                    "comments refreshed"
                );
                Ok(())
            }
            Ok(_) => {
                debug!(template = %self.template, ticket, "discarding superseded refresh");
                Ok(())
            }
            Err(e) => {
                warn!(template = %self.template, error = %e, "failed to refresh comments");
                Err(e.into())
            }
        }
    }

    /// Posts a comment, or a reply when `parent` is given, then re-fetches.
    ///
    /// Text must be 1 to 400 characters; anything else is rejected without
    /// contacting the backend.
    pub async fn post_comment(&self, text: &str, parent: Option<CommentId>) -> Result<()> {
        let author = self.require_viewer()?;
        let text = CommentText::new(text)?;

        let comment = NewComment {
            template_id: self.template.clone(),
            author_id: author,
            text,
            parent_id: parent,
        };
        self.backend.post_comment(&comment).await.map_err(|e| {
            warn!(template = %self.template, error = %e, "failed to post comment");
            InteractionError::from(e)
        })?;

        debug!(template = %self.template, reply = comment.parent_id.is_some(), "comment posted");
        self.reconcile().await;
        Ok(())
    }

    /// Deletes one of the viewer's own comments, then re-fetches.
    ///
    /// Comments by other authors are refused locally with
    /// [`InteractionError::NotAuthor`]; the backend is never called for them.
    pub async fn delete_comment(&self, comment: &CommentId) -> Result<()> {
        let requester = self.require_viewer()?;

        let author = self
            .state
            .read()
            .tree
            .find(comment)
            .map(|node| node.author_id.clone());
        match author {
            None => return Err(InteractionError::NotFound(comment.to_string())),
            Some(author) if author != requester => {
                debug!(comment_id = %comment, "refusing to delete another author's comment");
                return Err(InteractionError::NotAuthor);
            }
            Some(_) => {}
        }

        self.backend
            .delete_comment(comment, &requester)
            .await
            .map_err(|e| {
                warn!(comment_id = %comment, error = %e, "backend refused comment deletion");
                InteractionError::from(e)
            })?;

        debug!(comment_id = %comment, "comment deleted");
        self.reconcile().await;
        Ok(())
    }

    /// Flips the viewer's like on a comment, then re-fetches the counts.
    pub async fn toggle_like(&self, comment: &CommentId) -> Result<()> {
        let user = self.require_viewer()?;

        self.backend
            .toggle_like(comment, &user)
            .await
            .map_err(|e| {
                warn!(comment_id = %comment, error = %e, "failed to toggle like");
                InteractionError::from(e)
            })?;

        self.reconcile().await;
        Ok(())
    }

    /// Re-fetches after a mutation the backend accepted.
    ///
    /// The mutation already happened, so a failed re-fetch is not reported
    /// to the caller; the tree stays as it was until the next refresh.
    async fn reconcile(&self) {
        if self.refresh().await.is_err() {
            debug!(template = %self.template, "tree left stale after accepted mutation");
        }
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
    use showroom_test_infra::{BackendCall, FixedSession, InMemoryBackend};

    fn template() -> TemplateId {
        TemplateId::new_unchecked("t-1")
    }

    fn service(
        backend: &Arc<InMemoryBackend>,
        session: FixedSession,
    ) -> CommentService<Arc<InMemoryBackend>, FixedSession> {
        CommentService::new(template(), Arc::clone(backend), session)
    }

    #[tokio::test]
    async fn refresh_loads_the_tree() {
        let backend = Arc::new(InMemoryBackend::new());
        let root = backend.seed_comment(&template(), "alice", "love the layout");
        backend.seed_reply(&template(), &root, "bob", "agreed");
        let comments = service(&backend, FixedSession::anonymous());

        assert!(comments.tree().is_empty());
        comments.refresh().await.unwrap();

        let tree = comments.tree();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.roots()[0].replies[0].text, "agreed");
        assert!(!comments.is_loading());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_tree() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.seed_comment(&template(), "alice", "first");
        let comments = service(&backend, FixedSession::anonymous());
        comments.refresh().await.unwrap();

        backend.fail_next(BackendError::Unavailable("down".into()));
        let err = comments.refresh().await.unwrap_err();

        assert!(matches!(err, InteractionError::Backend(BackendError::Unavailable(_))));
        assert_eq!(comments.tree().len(), 1);
        assert!(!comments.is_loading());
    }

    #[tokio::test]
    async fn post_requires_sign_in() {
        let backend = Arc::new(InMemoryBackend::new());
        let comments = service(&backend, FixedSession::anonymous());

        let err = comments.post_comment("hello", None).await.unwrap_err();

        assert_eq!(
            err,
            InteractionError::AuthRequired {
                login_url: showroom_test_infra::session::DEFAULT_LOGIN_URL.to_string()
            }
        );
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn post_validates_length_before_calling_backend() {
        let backend = Arc::new(InMemoryBackend::new());
        let comments = service(&backend, FixedSession::authenticated("alice"));

        for text in [String::new(), "x".repeat(401)] {
            let err = comments.post_comment(&text, None).await.unwrap_err();
            assert!(matches!(err, InteractionError::Validation(_)));
        }
        assert!(backend.calls().is_empty());

        for text in ["x".to_string(), "x".repeat(400)] {
            comments.post_comment(&text, None).await.unwrap();
        }
        assert_eq!(backend.mutation_count(), 2);
        assert_eq!(comments.tree().len(), 2);
    }

    #[tokio::test]
    async fn post_refetches_instead_of_inserting_locally() {
        let backend = Arc::new(InMemoryBackend::new());
        let root = backend.seed_comment(&template(), "bob", "which paint is that?");
        let comments = service(&backend, FixedSession::authenticated("alice"));
        comments.refresh().await.unwrap();

        comments
            .post_comment("Sherwin-Williams Alabaster", Some(root.clone()))
            .await
            .unwrap();

        let calls = backend.calls();
        assert!(matches!(calls[calls.len() - 2], BackendCall::Post(_)));
        assert!(matches!(calls[calls.len() - 1], BackendCall::List(_)));

        let tree = comments.tree();
        let parent = tree.find(&root).unwrap();
        assert_eq!(parent.replies.len(), 1);
        assert_eq!(parent.replies[0].author_id, UserId::new_unchecked("alice"));
    }

    #[tokio::test]
    async fn backend_rejection_of_post_leaves_tree_unchanged() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.seed_comment(&template(), "bob", "hello");
        let comments = service(&backend, FixedSession::authenticated("alice"));
        comments.refresh().await.unwrap();
        let before = comments.tree();

        backend.fail_next(BackendError::Rejected("spam detected".into()));
        let err = comments.post_comment("buy now", None).await.unwrap_err();

        assert_eq!(
            err,
            InteractionError::Backend(BackendError::Rejected("spam detected".into()))
        );
        assert_eq!(comments.tree(), before);
    }

    #[tokio::test]
    async fn delete_by_non_author_makes_no_call() {
        let backend = Arc::new(InMemoryBackend::new());
        let id = backend.seed_comment(&template(), "bob", "mine");
        let comments = service(&backend, FixedSession::authenticated("alice"));
        comments.refresh().await.unwrap();
        let calls_before = backend.calls().len();

        let err = comments.delete_comment(&id).await.unwrap_err();

        assert_eq!(err, InteractionError::NotAuthor);
        assert_eq!(backend.calls().len(), calls_before);
        assert_eq!(backend.mutation_count(), 0);
        assert!(comments.tree().find(&id).is_some());
    }

    #[tokio::test]
    async fn delete_unknown_comment_is_not_found() {
        let backend = Arc::new(InMemoryBackend::new());
        let comments = service(&backend, FixedSession::authenticated("alice"));

        let err = comments
            .delete_comment(&CommentId::new_unchecked("ghost"))
            .await
            .unwrap_err();

        assert!(matches!(err, InteractionError::NotFound(_)));
        assert_eq!(backend.mutation_count(), 0);
    }

    #[tokio::test]
    async fn author_can_delete_own_reply() {
        let backend = Arc::new(InMemoryBackend::new());
        let root = backend.seed_comment(&template(), "bob", "question");
        let reply = backend.seed_reply(&template(), &root, "alice", "answer");
        let comments = service(&backend, FixedSession::authenticated("alice"));
        comments.refresh().await.unwrap();

        comments.delete_comment(&reply).await.unwrap();

        let tree = comments.tree();
        assert!(tree.find(&reply).is_none());
        assert!(tree.find(&root).is_some());
        assert!(backend.calls().contains(&BackendCall::Delete {
            comment: reply,
            requester: UserId::new_unchecked("alice"),
        }));
    }

    #[tokio::test]
    async fn backend_refusal_of_delete_surfaces_and_keeps_tree() {
        let backend = Arc::new(InMemoryBackend::new());
        let id = backend.seed_comment(&template(), "alice", "mine");
        let comments = service(&backend, FixedSession::authenticated("alice"));
        comments.refresh().await.unwrap();

        backend.fail_next(BackendError::Unauthorized);
        let err = comments.delete_comment(&id).await.unwrap_err();

        assert_eq!(err, InteractionError::Backend(BackendError::Unauthorized));
        assert!(comments.tree().find(&id).is_some());
    }

    #[tokio::test]
    async fn toggle_like_reconciles_count_from_backend() {
        let backend = Arc::new(InMemoryBackend::new());
        let id = backend.seed_comment(&template(), "bob", "nice tiles");
        let session = Arc::new(FixedSession::authenticated("alice"));
        let comments =
            CommentService::new(template(), Arc::clone(&backend), Arc::clone(&session));
        comments.refresh().await.unwrap();

        comments.toggle_like(&id).await.unwrap();
        let node = comments.tree().find(&id).cloned().unwrap();
        assert_eq!(node.like_count, 1);
        assert!(node.liked_by_viewer);

        // Carol likes it elsewhere; once Alice un-likes, only Carol's like remains.
        backend
            .toggle_like(&id, &UserId::new_unchecked("carol"))
            .await
            .unwrap();
        comments.toggle_like(&id).await.unwrap();
        let node = comments.tree().find(&id).cloned().unwrap();
        assert_eq!(node.like_count, 1);
        assert!(!node.liked_by_viewer);

        session.sign_out();
        let err = comments.toggle_like(&id).await.unwrap_err();
        assert!(matches!(err, InteractionError::AuthRequired { .. }));
    }

    async fn wait_for_lists(backend: &InMemoryBackend, count: usize) {
        let lists = || {
            backend
                .calls()
                .iter()
                .filter(|call| matches!(call, BackendCall::List(_)))
                .count()
        };
        while lists() < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn is_loading_while_refresh_in_flight() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.seed_comment(&template(), "bob", "hello");
        let comments = service(&backend, FixedSession::anonymous());
        let gate = backend.hold_next_list();

        let pending = tokio::spawn({
            let comments = comments.clone();
            async move { comments.refresh().await }
        });
        wait_for_lists(&backend, 1).await;

        assert!(comments.is_loading());
        assert!(comments.tree().is_empty());

        gate.open();
        pending.await.unwrap().unwrap();

        assert!(!comments.is_loading());
        assert_eq!(comments.tree().len(), 1);
    }

    #[tokio::test]
    async fn superseded_refresh_does_not_overwrite_newer_tree() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.seed_comment(&template(), "bob", "first");
        let comments = service(&backend, FixedSession::anonymous());
        let gate = backend.hold_next_list();

        let older = tokio::spawn({
            let comments = comments.clone();
            async move { comments.refresh().await }
        });
        wait_for_lists(&backend, 1).await;

        backend.seed_comment(&template(), "carol", "second");
        comments.refresh().await.unwrap();
        assert_eq!(comments.tree().len(), 2);
        assert!(comments.is_loading());

        gate.open();
        older.await.unwrap().unwrap();

        assert_eq!(comments.tree().len(), 2);
        assert!(!comments.is_loading());
    }

    #[tokio::test]
    async fn accepted_post_succeeds_even_if_refetch_fails() {
        let backend = Arc::new(InMemoryBackend::new());
        let comments = service(&backend, FixedSession::authenticated("alice"));
        comments.refresh().await.unwrap();

        backend.fail_next_list(BackendError::Unavailable("timeout".into()));
        comments.post_comment("stored anyway", None).await.unwrap();

        assert!(comments.tree().is_empty());
        assert_eq!(backend.mutation_count(), 1);

        comments.refresh().await.unwrap();
        assert_eq!(comments.tree().roots()[0].text, "stored anyway");
    }
}
