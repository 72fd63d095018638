//! Narrow DOM capability interface.
//!
//! The pipeline never touches a concrete DOM. It needs exactly: class
//! query/add/remove, attribute reads, descendant queries, fragment insertion
//! after or into a node, a connectivity check, and a child-list observer on
//! one container. Backends:
//!
//! - [`memory::MemoryDocument`]: an in-process `scraper` tree matched with
//!   real CSS selectors, used headless and in tests
//! - the `web-sys` backend in the userscript app

mod fragment;
pub mod memory;

pub use fragment::{Fragment, FragmentChild};

/// Summary of one child-list mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationRecord {
    pub added_nodes: usize,
    pub removed_nodes: usize,
}

impl MutationRecord {
    pub fn added(count: usize) -> Self {
        Self {
            added_nodes: count,
            removed_nodes: 0,
        }
    }

    pub fn removed(count: usize) -> Self {
        Self {
            added_nodes: 0,
            removed_nodes: count,
        }
    }
}

/// Callback receiving one batch of mutation records.
pub type MutationCallback = Box<dyn FnMut(&[MutationRecord])>;

/// A node of the host document the pipeline can inspect and extend.
///
/// Handles are cheap to clone and compare by node identity.
pub trait HostElement: Clone + PartialEq + 'static {
    fn has_class(&self, class: &str) -> bool;

    fn add_class(&self, class: &str);

    fn remove_class(&self, class: &str);

    fn attribute(&self, name: &str) -> Option<String>;

    /// First descendant matching `selector`. Invalid selectors match nothing.
    fn query(&self, selector: &str) -> Option<Self>;

    /// All descendants matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<Self>;

    /// Inserts `fragment` as the next sibling. `None` when the node has no
    /// parent.
    fn insert_after(&self, fragment: &Fragment) -> Option<Self>;

    /// Appends `fragment` as the last child.
    fn append(&self, fragment: &Fragment) -> Option<Self>;

    /// Whether the node is still attached to the document.
    fn is_connected(&self) -> bool;
}

/// The page document.
pub trait HostDocument {
    type Element: HostElement;

    /// Full URL of the page.
    fn location(&self) -> String;

    fn query(&self, selector: &str) -> Option<Self::Element>;

    fn query_all(&self, selector: &str) -> Vec<Self::Element>;

    /// Subscribes `callback` to child-list changes in the subtree of
    /// `target`. The subscription lives as long as the page.
    fn observe(&self, target: &Self::Element, callback: MutationCallback);
}
