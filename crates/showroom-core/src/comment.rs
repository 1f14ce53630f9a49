use crate::error::{CoreError, Result};
use crate::identity::{CommentId, TemplateId, UserId};
use crate::media::MediaReference;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

pub const MIN_COMMENT_LENGTH: usize = 1;
pub const MAX_COMMENT_LENGTH: usize = 400;

/// Comment body checked against the length limits before it is sent anywhere.
///
/// Length is counted in characters, not bytes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommentText(String);

impl CommentText {
    pub fn new(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let length = text.chars().count();
        if !(MIN_COMMENT_LENGTH..=MAX_COMMENT_LENGTH).contains(&length) {
            return Err(CoreError::InvalidComment(format!(
                "length must be between {} and {}, got {}",
                MIN_COMMENT_LENGTH, MAX_COMMENT_LENGTH, length
            )));
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CommentText {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CommentText> for String {
    fn from(value: CommentText) -> Self {
        value.0
    }
}

/// A comment or reply as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    pub id: CommentId,
    pub author_id: UserId,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub author_avatar: Option<MediaReference>,
    pub text: String,
    pub created_at: Timestamp,
    #[serde(default)]
    pub like_count: u64,
    #[serde(default)]
    pub liked_by_viewer: bool,
    /// Replies in backend order. Never re-sorted locally.
    #[serde(default)]
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    pub fn is_authored_by(&self, user: &UserId) -> bool {
        &self.author_id == user
    }
}

/// All comments attached to one template.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentTree {
    template: TemplateId,
    comments: Vec<CommentNode>,
}

impl CommentTree {
    pub fn new(template: TemplateId, comments: Vec<CommentNode>) -> Self {
        Self { template, comments }
    }

    pub fn empty(template: TemplateId) -> Self {
        Self::new(template, Vec::new())
    }

    pub fn template(&self) -> &TemplateId {
        &self.template
    }

    /// Top-level comments in backend order.
    pub fn roots(&self) -> &[CommentNode] {
        &self.comments
    }

    /// Total number of nodes, replies included.
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn find(&self, id: &CommentId) -> Option<&CommentNode> {
        self.walk().map(|(_, node)| node).find(|node| &node.id == id)
    }

    /// Depth-first, pre-order walk yielding `(depth, node)`.
    ///
    /// Siblings come out in the order the backend returned them.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self.comments.iter())],
        }
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, std::slice::Iter<'a, CommentNode>)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a CommentNode);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = {
                let (depth, siblings) = self.stack.last_mut()?;
                siblings.next().map(|node| (*depth, node))
            };

            match next {
                Some((depth, node)) => {
                    if !node.replies.is_empty() {
                        self.stack.push((depth + 1, node.replies.iter()));
                    }
                    return Some((depth, node));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}
