//! Resolution caches keyed by media reference.
//!
//! A [`ResolutionCache`] maps a [`MediaReference`](showroom_core::MediaReference)
//! to its [`ResolvedUrl`](showroom_core::ResolvedUrl) and guarantees that at
//! most one computation per key is in flight at a time.

pub mod cache;
pub mod moka;

pub use cache::{ResolutionCache, Result};
pub use moka::MokaResolutionCache;
pub use showroom_core::CacheError;
