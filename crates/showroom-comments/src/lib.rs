//! Comment threads, likes, favorites and follows for template pages.
//!
//! The services here keep the client-side view of a template's social state
//! in step with the backend. They never edit local state optimistically:
//! every successful mutation is followed by a re-fetch, and every failure
//! leaves the local state untouched.

pub mod engagement;
pub mod http;
pub mod service;

pub use engagement::EngagementService;
pub use http::{HttpBackendConfig, HttpCommentBackend};
pub use service::{CommentService, Result};
