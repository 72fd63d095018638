//! Core error types for the enrichment pipeline.
//!
//! Nothing here is ever surfaced to the user: the pipeline only enhances the
//! host page, so every error ends in a log line and, for fetch failures, a
//! marker class on the affected element.

use gitlab_focus_host_data::HostDataError;
use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Host data request failed: {0}")]
    HostData(#[from] HostDataError),

    #[error("No link matching '{selector}' in list item")]
    MissingLink { selector: String },

    #[error("No layout area to insert into")]
    MissingAnchor,

    #[error("Invalid configuration: {0}")]
    Config(String),
}
