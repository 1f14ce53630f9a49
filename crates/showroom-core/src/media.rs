use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Scheme prefix shared by every local handle.
pub const LOCAL_HANDLE_SCHEME: &str = "blob:";

const LOCAL_HANDLE_NAMESPACE: &str = "showroom";

/// A string identifying a piece of media.
///
/// References come in two shapes: absolute ones (`http...`, `https...`,
/// `blob:...`) that a browser can load as-is, and storage-relative paths that
/// must be combined with the media endpoint before they can be fetched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaReference(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Empty,
    Absolute,
    Relative,
}

impl MediaReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn kind(&self) -> ReferenceKind {
        if self.0.is_empty() {
            ReferenceKind::Empty
        } else if self.0.starts_with("http") || self.0.starts_with(LOCAL_HANDLE_SCHEME) {
            ReferenceKind::Absolute
        } else {
            ReferenceKind::Relative
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for MediaReference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MediaReference {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Display for MediaReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ephemeral, view-local reference to downloaded media bytes.
///
/// Handles are only meaningful inside the view that created them and are
/// deliberately not serializable.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LocalHandle {
    id: u64,
    url: String,
}

impl LocalHandle {
    /// Creates the handle for the given registry slot.
    ///
    /// The URL is `blob:showroom/<base58 id>`.
    pub fn new(id: u64) -> Self {
        let encoded = bs58::encode(id.to_be_bytes()).into_string();
        Self {
            id,
            url: format!("{LOCAL_HANDLE_SCHEME}{LOCAL_HANDLE_NAMESPACE}/{encoded}"),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// Returns `true` if `url` has the shape of a local handle.
    pub fn is_local_handle(url: &str) -> bool {
        url.starts_with(LOCAL_HANDLE_SCHEME)
    }
}

impl std::fmt::Debug for LocalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("LocalHandle").field(&self.url).finish()
    }
}

impl Display for LocalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}

/// The displayable outcome of resolving a [`MediaReference`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedUrl {
    /// The reference was empty.
    Empty,
    /// The reference was already absolute and is returned unchanged.
    Passthrough(String),
    /// The media was downloaded and is served from a view-local handle.
    Local(LocalHandle),
    /// Fully-qualified signed URL (base + path + access token).
    Direct(String),
    /// Terminal state once the direct URL itself failed to display.
    Placeholder(String),
}

impl ResolvedUrl {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedUrl::Empty => "",
            ResolvedUrl::Passthrough(url)
            | ResolvedUrl::Direct(url)
            | ResolvedUrl::Placeholder(url) => url,
            ResolvedUrl::Local(handle) => handle.as_str(),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, ResolvedUrl::Local(_))
    }

    pub fn is_direct(&self) -> bool {
        matches!(self, ResolvedUrl::Direct(_))
    }

    /// Short lowercase name of the variant, for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            ResolvedUrl::Empty => "empty",
            ResolvedUrl::Passthrough(_) => "passthrough",
            ResolvedUrl::Local(_) => "local",
            ResolvedUrl::Direct(_) => "direct",
            ResolvedUrl::Placeholder(_) => "placeholder",
        }
    }
}

impl Display for ResolvedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
