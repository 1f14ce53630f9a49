use thiserror::Error;

/// Errors related to the core domain types.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid comment: {0}")]
    InvalidComment(String),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// The owning view went away while the value was being computed.
    #[error("resolution abandoned: owning view was unmounted")]
    Detached,
}

/// Why a media fetch did not produce displayable bytes.
///
/// The resolver treats every variant the same way and falls back to the
/// direct URL; the distinction only matters for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("media transport failed: {0}")]
    Transport(String),
    #[error("media endpoint returned status {0}")]
    Status(u16),
    #[error("media endpoint returned an empty body")]
    EmptyBody,
    #[error("media payload could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend refused the request: not authorized")]
    Unauthorized,
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("backend returned invalid data: {0}")]
    InvalidData(String),
}

/// Errors surfaced by comment, like, favorite and follow operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InteractionError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("sign in required")]
    AuthRequired { login_url: String },
    #[error("only the author may delete this comment")]
    NotAuthor,
    #[error("comment not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl From<CoreError> for InteractionError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidComment(message) => Self::Validation(message),
            CoreError::InvalidIdentifier(message) => Self::Validation(message),
        }
    }
}
