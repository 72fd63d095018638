//! Host data models
//!
//! - `label` - Label descriptors and the issue/MR label response
//! - `epic` - Epic identity parsed from the page URL and descendant counts

mod epic;
mod label;

pub use epic::{DescendantCounts, EpicRef};
pub use label::{IssueLabels, LabelDescriptor, SCOPE_DELIMITER};
