//! Core types and traits for the Showroom front-end state layer.
//!
//! This crate holds the domain vocabulary shared by the media resolver and the
//! comment services: media references and their resolved forms, the injected
//! media endpoint configuration, comment trees, viewer identity, and the
//! traits describing the remote collaborators.

pub mod backend;
pub mod comment;
pub mod endpoint;
pub mod error;
pub mod fetcher;
pub mod identity;
pub mod media;
pub mod session;

pub use backend::{ApiResponse, CommentBackend, EngagementBackend, NewComment, ToggleState};
pub use comment::{CommentNode, CommentText, CommentTree, MAX_COMMENT_LENGTH, MIN_COMMENT_LENGTH};
pub use endpoint::MediaEndpoint;
pub use error::{BackendError, CacheError, CoreError, FetchError, InteractionError};
pub use fetcher::{FetchedMedia, MediaFetcher};
pub use identity::{CommentId, TemplateId, UserId};
pub use media::{LocalHandle, MediaReference, ReferenceKind, ResolvedUrl};
pub use session::{SessionProvider, Viewer};
