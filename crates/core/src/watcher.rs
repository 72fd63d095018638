//! Subscription to the host container's subtree.

use log::info;

use crate::dom::{HostDocument, MutationRecord};

/// Child-list observer on one fixed container.
///
/// Stateless beyond the subscription it installs. A missing container
/// disables the whole pipeline silently: the page is simply not one this
/// layer knows how to enhance.
pub struct Watcher;

impl Watcher {
    /// Subscribes `handler` to mutation batches under the container.
    ///
    /// Returns `false`, without subscribing, when no element matches
    /// `container_selector`.
    pub fn attach<D, F>(document: &D, container_selector: &str, handler: F) -> bool
    where
        D: HostDocument,
        F: FnMut(&[MutationRecord]) + 'static,
    {
        match document.query(container_selector) {
            Some(container) => {
                document.observe(&container, Box::new(handler));
                info!("Watching '{}' for inserted nodes", container_selector);
                true
            }
            None => {
                info!(
                    "No '{}' container on this page, enrichment disabled",
                    container_selector
                );
                false
            }
        }
    }

    /// A batch warrants a full rescan when any record added nodes.
    pub fn should_rescan(records: &[MutationRecord]) -> bool {
        records.iter().any(|r| r.added_nodes > 0)
    }

    pub fn has_removals(records: &[MutationRecord]) -> bool {
        records.iter().any(|r| r.removed_nodes > 0)
    }
}
