//! Error types for host data access.
//!
//! None of these errors is retried: the enrichment layer only enhances the
//! host page, so a failed request simply leaves its element unenriched.

use thiserror::Error;

/// Errors that can occur while talking to the host's data endpoints.
#[derive(Error, Debug)]
pub enum HostDataError {
    /// The request could not be sent or the connection failed.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A link found in the page could not be turned into a request URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The endpoint answered with a non-success HTTP status.
    #[error("Unexpected status {status} from {url}")]
    Status {
        /// HTTP status code returned by the host
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response from {endpoint}: {message}")]
    Decode {
        /// The endpoint that produced the body
        endpoint: String,
        /// Decoder error message
        message: String,
    },

    /// The GraphQL endpoint reported errors alongside (or instead of) data.
    #[error("GraphQL errors: {}", messages.join("; "))]
    GraphQl {
        /// Messages from the `errors` array of the response
        messages: Vec<String>,
    },

    /// The group or epic does not exist, or the user cannot see it.
    #[error("Epic &{epic_iid} not found in group {group_path}")]
    EpicNotFound {
        /// Full path of the group
        group_path: String,
        /// Epic internal id
        epic_iid: u64,
    },
}

impl HostDataError {
    pub(crate) fn decode(endpoint: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            endpoint: endpoint.into(),
            message: err.to_string(),
        }
    }
}
