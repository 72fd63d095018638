//! At-most-once claiming of host elements.
//!
//! The processed flag lives on the element itself as a class, so it is
//! shared by every scan and survives re-renders that keep the node. A scan
//! marks synchronously, before any fetch is spawned: a later scan that runs
//! while the fetch is pending sees the mark and skips the element. A claim
//! whose fetch was aborted before rendering is released, so the node is
//! enriched again if the host puts it back.

use log::debug;

use crate::dom::HostElement;

#[derive(Clone, Debug)]
pub struct Marker {
    processed_class: String,
}

impl Marker {
    pub fn new(processed_class: impl Into<String>) -> Self {
        Self {
            processed_class: processed_class.into(),
        }
    }

    pub fn is_marked<E: HostElement>(&self, element: &E) -> bool {
        element.has_class(&self.processed_class)
    }

    pub fn mark<E: HostElement>(&self, element: &E) {
        element.add_class(&self.processed_class);
    }

    pub fn release<E: HostElement>(&self, element: &E) {
        element.remove_class(&self.processed_class);
    }

    /// Marks and returns the candidates that were not marked yet.
    pub fn scan<E: HostElement>(&self, candidates: Vec<E>) -> Vec<E> {
        let total = candidates.len();
        let claimed: Vec<E> = candidates
            .into_iter()
            .filter(|candidate| !self.is_marked(candidate))
            .inspect(|candidate| self.mark(candidate))
            .collect();
        if total > 0 {
            debug!(
                "Claimed {} of {} candidates ({} already processed)",
                claimed.len(),
                total,
                total - claimed.len()
            );
        }
        claimed
    }
}
