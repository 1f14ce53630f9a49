use crate::media::MediaReference;
use typed_builder::TypedBuilder;

/// Where relative media lives and how to sign requests for it.
///
/// Both values are environment-provided and read-only after startup; the
/// endpoint is handed to whatever needs it instead of living in a global.
///
/// ```rust
/// use showroom_core::{MediaEndpoint, MediaReference};
///
/// let endpoint = MediaEndpoint::builder()
///     .base_url("https://cdn.example.com/")
///     .access_token("sig=abc")
///     .build();
///
/// assert_eq!(
///     endpoint.direct_url(&MediaReference::new("images/x.png")),
///     "https://cdn.example.com/images/x.png?sig=abc"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct MediaEndpoint {
    #[builder(setter(into))]
    base_url: String,
    #[builder(setter(into))]
    access_token: String,
}

impl MediaEndpoint {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: access_token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Builds the signed remote URL for a relative reference.
    ///
    /// The token is appended with `&` when the path already carries a query
    /// string, otherwise with `?`. Base and path are concatenated verbatim.
    pub fn direct_url(&self, reference: &MediaReference) -> String {
        let path = reference.as_str();
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{}{}{}{}", self.base_url, path, separator, self.access_token)
    }
}
