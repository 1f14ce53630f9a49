//! Test doubles and fixtures shared by the Showroom crates.

pub mod backend;
pub mod cache;
pub mod error;
pub mod fetcher;
pub mod server;
pub mod session;

pub use backend::{BackendCall, InMemoryBackend, ListGate};
pub use cache::RecordingCache;
pub use error::{Result, TestInfraError};
pub use fetcher::{FetchGate, ScriptedFetcher};
pub use server::FixtureServer;
pub use session::FixedSession;
