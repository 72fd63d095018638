//! GitLab Focus Core - the DOM enrichment pipeline.
//!
//! Watches the host page for inserted nodes, claims each related issue or
//! merge request item once, fetches its labels and renders them as label
//! chips. On epic pages the issue count badge also gets a weight progress
//! widget.
//!
//! The crate never touches a concrete DOM or network stack: it drives a
//! [`dom::HostDocument`] and a
//! [`HostDataProvider`](gitlab_focus_host_data::HostDataProvider), and
//! spawns fetches through a [`tasks::TaskSpawner`]. The browser app plugs in
//! `web-sys`; tests use [`dom::memory::MemoryDocument`].

pub mod config;
pub mod dom;
pub mod errors;
pub mod labels;
pub mod marker;
pub mod pipeline;
pub mod tasks;
pub mod watcher;
pub mod weight;

pub use config::{FocusConfig, HostMatch, MarkerClasses, Selectors};
pub use pipeline::Enricher;
pub use weight::WeightSummary;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
