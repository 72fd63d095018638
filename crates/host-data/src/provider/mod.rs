//! Host data provider abstraction and the GitLab implementation.
//!
//! The enrichment pipeline only sees [`HostDataProvider`]; tests substitute
//! in-memory providers, the browser uses [`gitlab::GitlabProvider`].

mod traits;

pub mod gitlab;

pub use traits::HostDataProvider;
