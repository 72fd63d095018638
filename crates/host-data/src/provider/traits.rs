//! Host data provider trait definition.

use async_trait::async_trait;

use crate::errors::HostDataError;
use crate::models::{DescendantCounts, EpicRef, IssueLabels};

/// Source of the supplementary data shown next to host elements.
///
/// One call is made per enriched element. Implementations must not retry
/// and must not cache across calls; the pipeline guarantees at most one
/// call per element.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use gitlab_focus_host_data::{HostDataProvider, HostDataError, IssueLabels};
///
/// struct Fixed(IssueLabels);
///
/// #[async_trait(?Send)]
/// impl HostDataProvider for Fixed {
///     async fn fetch_labels(&self, _item_link: &str) -> Result<IssueLabels, HostDataError> {
///         Ok(self.0.clone())
///     }
///
///     // ... fetch_descendant_counts
/// }
/// ```
#[async_trait(?Send)]
pub trait HostDataProvider {
    /// Fetch the labels of the issue or merge request behind `item_link`.
    ///
    /// `item_link` is the `href` found in the host list item, absolute or
    /// relative to the current page.
    async fn fetch_labels(&self, item_link: &str) -> Result<IssueLabels, HostDataError>;

    /// Fetch the opened/closed issue counts below an epic.
    async fn fetch_descendant_counts(
        &self,
        epic: &EpicRef,
    ) -> Result<DescendantCounts, HostDataError>;
}
