//! Media resolution for page views.
//!
//! [`BlobUrlResolver`] turns [`MediaReference`](showroom_core::MediaReference)s
//! into displayable URLs, preferring a view-local handle to downloaded bytes
//! and falling back to the signed direct URL.
//!
//! # Example
//!
//! ```rust,no_run
//! use showroom_core::{MediaEndpoint, MediaReference};
//! use showroom_resolver::{BlobUrlResolver, HttpMediaFetcher, ViewScope};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoint = MediaEndpoint::new("https://cdn.example.com/", "sig=abc");
//! let fetcher = HttpMediaFetcher::new(endpoint.clone())?;
//! let resolver = BlobUrlResolver::new(endpoint, fetcher, ViewScope::new());
//!
//! let thumbnail = resolver.resolve(&MediaReference::new("templates/42/thumb.png")).await;
//! println!("<img src=\"{thumbnail}\">");
//!
//! // Leaving the page releases every local handle.
//! resolver.unmount().await;
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod registry;
pub mod resolver;
pub mod scope;

pub use http::HttpMediaFetcher;
pub use registry::HandleRegistry;
pub use resolver::{BlobUrlResolver, DEFAULT_PLACEHOLDER_URL};
pub use scope::ViewScope;
