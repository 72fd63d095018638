//! GitLab Focus Host Data Crate
//!
//! Typed access to the data endpoints the GitLab web application already
//! exposes to its own frontend. Nothing here touches the DOM; the
//! enrichment pipeline in `gitlab-focus-core` consumes these types.
//!
//! # Overview
//!
//! Two endpoints are used:
//! - `GET <item-link>.json` for the labels attached to an issue or MR
//! - `POST <origin>/api/graphql` for the descendant weight sum of an epic
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +---------------------+
//! |   page URL       | --> |      EpicRef        |  (group path + iid)
//! +------------------+     +---------------------+
//!                                   |
//!                                   v
//!                         +---------------------+
//!                         |  HostDataProvider   |  (GitlabProvider, mocks)
//!                         +---------------------+
//!                            |              |
//!                            v              v
//!                   +-------------+  +------------------+
//!                   | IssueLabels |  | DescendantCounts |
//!                   +-------------+  +------------------+
//! ```
//!
//! Providers are `?Send`: everything runs on the browser's single event
//! loop, and `reqwest` futures on `wasm32` are not `Send`.

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::HostDataError;
pub use models::{DescendantCounts, EpicRef, IssueLabels, LabelDescriptor, SCOPE_DELIMITER};
pub use provider::gitlab::GitlabProvider;
pub use provider::HostDataProvider;
