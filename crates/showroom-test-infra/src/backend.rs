use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::Mutex;
use showroom_core::{
    BackendError, CommentBackend, CommentId, CommentNode, EngagementBackend, NewComment,
    TemplateId, ToggleState, UserId,
};
use std::collections::{HashMap, HashSet, VecDeque};
use tokio::sync::watch;

/// Every call the backend received, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    List(TemplateId),
    Post(NewComment),
    Delete { comment: CommentId, requester: UserId },
    ToggleLike { comment: CommentId, user: UserId },
    ToggleFavorite { template: TemplateId, user: UserId },
    ToggleFollow { author: UserId, user: UserId },
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    comments: HashMap<TemplateId, Vec<CommentNode>>,
    likes: HashSet<(CommentId, UserId)>,
    favorites: HashSet<(TemplateId, UserId)>,
    follows: HashSet<(UserId, UserId)>,
    calls: Vec<BackendCall>,
    fail_next: Option<BackendError>,
    fail_next_list: Option<BackendError>,
    held_lists: VecDeque<watch::Receiver<bool>>,
}

/// Holds one listing until [`open`](ListGate::open) is called.
#[derive(Debug)]
pub struct ListGate {
    tx: watch::Sender<bool>,
}

impl ListGate {
    pub fn open(&self) {
        let _ = self.tx.send(true);
    }
}

/// An in-memory stand-in for the comment and engagement backend.
///
/// Like counts and `liked_by_viewer` are derived from recorded likes when the
/// tree is listed. Deleting someone else's comment is refused with
/// `Unauthorized`.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    state: Mutex<State>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a top-level comment and returns its id.
    pub fn seed_comment(&self, template: &TemplateId, author: &str, text: &str) -> CommentId {
        self.seed(template, None, author, text)
    }

    /// Seeds a reply under `parent` and returns its id.
    pub fn seed_reply(
        &self,
        template: &TemplateId,
        parent: &CommentId,
        author: &str,
        text: &str,
    ) -> CommentId {
        self.seed(template, Some(parent), author, text)
    }

    fn seed(
        &self,
        template: &TemplateId,
        parent: Option<&CommentId>,
        author: &str,
        text: &str,
    ) -> CommentId {
        let mut state = self.state.lock();
        let node = state.new_node(UserId::new_unchecked(author), text.to_string());
        let id = node.id.clone();
        state.attach(template, parent, node);
        id
    }

    /// Makes the next mutating or listing call fail with `error`.
    pub fn fail_next(&self, error: BackendError) {
        self.state.lock().fail_next = Some(error);
    }

    /// Makes the next listing call fail with `error`; other calls go through.
    pub fn fail_next_list(&self, error: BackendError) {
        self.state.lock().fail_next_list = Some(error);
    }

    /// Holds the next listing until the returned gate opens.
    ///
    /// The listing is recorded and its snapshot taken before it waits, so a
    /// held listing answers with the comments as they were when it started.
    pub fn hold_next_list(&self) -> ListGate {
        let (tx, rx) = watch::channel(false);
        self.state.lock().held_lists.push_back(rx);
        ListGate { tx }
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().calls.clone()
    }

    /// Number of calls that were not plain listings.
    pub fn mutation_count(&self) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|call| !matches!(call, BackendCall::List(_)))
            .count()
    }

    fn begin(&self, call: BackendCall) -> Result<parking_lot::MutexGuard<'_, State>, BackendError> {
        let mut state = self.state.lock();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

impl State {
    fn new_node(&mut self, author: UserId, text: String) -> CommentNode {
        self.next_id += 1;
        CommentNode {
            id: CommentId::new_unchecked(format!("c{}", self.next_id)),
            author_id: author,
            author_name: None,
            author_avatar: None,
            text,
            created_at: Timestamp::now(),
            like_count: 0,
            liked_by_viewer: false,
            replies: Vec::new(),
        }
    }

    fn attach(&mut self, template: &TemplateId, parent: Option<&CommentId>, node: CommentNode) {
        let roots = self.comments.entry(template.clone()).or_default();
        let parent = match parent {
            Some(id) => find_mut(roots, id),
            None => None,
        };
        match parent {
            Some(parent) => parent.replies.push(node),
            None => roots.push(node),
        }
    }

    fn author_of(&self, comment: &CommentId) -> Option<UserId> {
        self.comments
            .values()
            .find_map(|roots| find(roots, comment))
            .map(|node| node.author_id.clone())
    }

    fn decorate(&self, nodes: &mut [CommentNode], viewer: Option<&UserId>) {
        for node in nodes {
            node.like_count = self
                .likes
                .iter()
                .filter(|(comment, _)| comment == &node.id)
                .count() as u64;
            node.liked_by_viewer = viewer
                .is_some_and(|viewer| self.likes.contains(&(node.id.clone(), viewer.clone())));
            self.decorate(&mut node.replies, viewer);
        }
    }
}

fn find<'a>(nodes: &'a [CommentNode], id: &CommentId) -> Option<&'a CommentNode> {
    nodes.iter().find_map(|node| {
        if &node.id == id {
            Some(node)
        } else {
            find(&node.replies, id)
        }
    })
}

fn find_mut<'a>(nodes: &'a mut [CommentNode], id: &CommentId) -> Option<&'a mut CommentNode> {
    for node in nodes {
        if &node.id == id {
            return Some(node);
        }
        if let Some(found) = find_mut(&mut node.replies, id) {
            return Some(found);
        }
    }
    None
}

fn remove(nodes: &mut Vec<CommentNode>, id: &CommentId) -> bool {
    if let Some(index) = nodes.iter().position(|node| &node.id == id) {
        nodes.remove(index);
        return true;
    }
    nodes.iter_mut().any(|node| remove(&mut node.replies, id))
}

#[async_trait]
impl CommentBackend for InMemoryBackend {
    async fn list_comments(
        &self,
        template: &TemplateId,
        viewer: Option<&UserId>,
    ) -> Result<Vec<CommentNode>, BackendError> {
        let (roots, hold) = {
            let mut state = self.begin(BackendCall::List(template.clone()))?;
            if let Some(error) = state.fail_next_list.take() {
                return Err(error);
            }
            let mut roots = state.comments.get(template).cloned().unwrap_or_default();
            state.decorate(&mut roots, viewer);
            (roots, state.held_lists.pop_front())
        };

        if let Some(mut gate) = hold {
            let _ = gate.wait_for(|open| *open).await;
        }
        Ok(roots)
    }

    async fn post_comment(&self, comment: &NewComment) -> Result<(), BackendError> {
        let mut state = self.begin(BackendCall::Post(comment.clone()))?;
        let node = state.new_node(comment.author_id.clone(), comment.text.as_str().to_string());
        state.attach(&comment.template_id, comment.parent_id.as_ref(), node);
        Ok(())
    }

    async fn delete_comment(
        &self,
        comment: &CommentId,
        requester: &UserId,
    ) -> Result<(), BackendError> {
        let mut state = self.begin(BackendCall::Delete {
            comment: comment.clone(),
            requester: requester.clone(),
        })?;
        match state.author_of(comment) {
            None => Err(BackendError::Rejected(format!("no such comment: {comment}"))),
            Some(author) if &author != requester => Err(BackendError::Unauthorized),
            Some(_) => {
                for roots in state.comments.values_mut() {
                    if remove(roots, comment) {
                        break;
                    }
                }
                state.likes.retain(|(liked, _)| liked != comment);
                Ok(())
            }
        }
    }

    async fn toggle_like(&self, comment: &CommentId, user: &UserId) -> Result<(), BackendError> {
        let mut state = self.begin(BackendCall::ToggleLike {
            comment: comment.clone(),
            user: user.clone(),
        })?;
        if state.author_of(comment).is_none() {
            return Err(BackendError::Rejected(format!("no such comment: {comment}")));
        }
        let key = (comment.clone(), user.clone());
        if !state.likes.remove(&key) {
            state.likes.insert(key);
        }
        Ok(())
    }
}

#[async_trait]
impl EngagementBackend for InMemoryBackend {
    async fn toggle_favorite(
        &self,
        template: &TemplateId,
        user: &UserId,
    ) -> Result<ToggleState, BackendError> {
        let mut state = self.begin(BackendCall::ToggleFavorite {
            template: template.clone(),
            user: user.clone(),
        })?;
        let key = (template.clone(), user.clone());
        let active = !state.favorites.remove(&key);
        if active {
            state.favorites.insert(key);
        }
        Ok(ToggleState { active })
    }

    async fn toggle_follow(
        &self,
        author: &UserId,
        user: &UserId,
    ) -> Result<ToggleState, BackendError> {
        let mut state = self.begin(BackendCall::ToggleFollow {
            author: author.clone(),
            user: user.clone(),
        })?;
        let key = (author.clone(), user.clone());
        let active = !state.follows.remove(&key);
        if active {
            state.follows.insert(key);
        }
        Ok(ToggleState { active })
    }
}
