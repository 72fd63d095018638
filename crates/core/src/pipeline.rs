//! The enrichment pipeline: Watcher, Marker, Fetcher and Renderer wired
//! together for one page.
//!
//! ```text
//! mutation batch --> rescan --> Marker::scan --> spawn fetch --> render
//!        |                                           ^
//!        +-- removals --> abort detached tasks ------+
//! ```
//!
//! Related list items get labels; on epic pages the first issue count badge
//! also gets the weight widget, once per page. Both paths share the marker
//! and the task registry.

use std::cell::RefCell;
use std::future::Future;
use std::rc::{Rc, Weak};

use gitlab_focus_host_data::{DescendantCounts, EpicRef, HostDataError, HostDataProvider, IssueLabels};
use log::{debug, info, warn};

use crate::config::FocusConfig;
use crate::dom::{HostDocument, HostElement, MutationRecord};
use crate::errors::{Error, Result};
use crate::labels::render_labels;
use crate::marker::Marker;
use crate::tasks::{TaskRegistry, TaskSpawner};
use crate::watcher::Watcher;
use crate::weight::{render_weight, WeightSummary};

pub struct Enricher<D, P, S>
where
    D: HostDocument,
{
    document: D,
    provider: P,
    spawner: S,
    config: FocusConfig,
    marker: Marker,
    epic: Option<EpicRef>,
    /// Badge holding the page's weight summary claim.
    epic_badge: RefCell<Option<D::Element>>,
    tasks: TaskRegistry<D::Element>,
    this: Weak<Self>,
}

impl<D, P, S> Enricher<D, P, S>
where
    D: HostDocument + 'static,
    P: HostDataProvider + 'static,
    S: TaskSpawner + 'static,
{
    /// Creates the pipeline for `document`. Whether the page is an epic is
    /// decided here, once.
    pub fn new(document: D, provider: P, spawner: S, config: FocusConfig) -> Rc<Self> {
        let epic = EpicRef::from_page_url(&document.location());
        match &epic {
            Some(epic) => info!(
                "Epic page detected: &{} in group {}",
                epic.epic_iid, epic.group_path
            ),
            None => debug!("Not an epic page, weight widget disabled"),
        }
        let marker = Marker::new(config.classes.processed.clone());
        Rc::new_cyclic(|this| Self {
            document,
            provider,
            spawner,
            config,
            marker,
            epic,
            epic_badge: RefCell::new(None),
            tasks: TaskRegistry::new(),
            this: this.clone(),
        })
    }

    pub fn config(&self) -> &FocusConfig {
        &self.config
    }

    pub fn epic(&self) -> Option<&EpicRef> {
        self.epic.as_ref()
    }

    /// Fetches currently in flight.
    pub fn in_flight(&self) -> usize {
        self.tasks.in_flight()
    }

    /// Subscribes to the container and enriches what is already rendered.
    ///
    /// Returns `false` when the page has no container; nothing happens then.
    pub fn start(&self) -> bool {
        let this = self.this.clone();
        let attached = Watcher::attach(
            &self.document,
            &self.config.selectors.container,
            move |records| {
                if let Some(enricher) = this.upgrade() {
                    enricher.on_mutation_batch(records);
                }
            },
        );
        if attached {
            self.rescan();
        }
        attached
    }

    pub fn on_mutation_batch(&self, records: &[MutationRecord]) {
        if Watcher::has_removals(records) {
            let aborted = self.tasks.abort_detached();
            for element in &aborted {
                self.release(element);
            }
            if !aborted.is_empty() {
                debug!("Aborted {} fetches for removed elements", aborted.len());
            }
        }
        if Watcher::should_rescan(records) {
            self.rescan();
        }
    }

    /// Claims unprocessed items (and the epic badge) and spawns their fetches.
    pub fn rescan(&self) {
        let selectors = &self.config.selectors;
        for item in self.marker.scan(self.document.query_all(&selectors.related_item)) {
            self.enrich_item(item);
        }
        if let Some(epic) = &self.epic {
            self.claim_epic_badge(epic);
        }
    }

    /// Claims the first badge on the page unless one is already claimed.
    fn claim_epic_badge(&self, epic: &EpicRef) {
        if self.epic_badge.borrow().is_some() {
            return;
        }
        let Some(badge) = self.document.query(&self.config.selectors.epic_badge) else {
            return;
        };
        let Some(badge) = self.marker.scan(vec![badge]).into_iter().next() else {
            return;
        };
        *self.epic_badge.borrow_mut() = Some(badge.clone());
        self.enrich_epic(badge, epic.clone());
    }

    /// Drops the claim on an element whose fetch was aborted before rendering.
    fn release(&self, element: &D::Element) {
        self.marker.release(element);
        let mut badge = self.epic_badge.borrow_mut();
        if badge.as_ref() == Some(element) {
            *badge = None;
        }
    }

    fn enrich_item(&self, item: D::Element) {
        let selectors = &self.config.selectors;
        if item.query(&selectors.closed_icon).is_some() {
            item.add_class(&self.config.classes.closed);
        }

        let link = match item_link(&item, &selectors.item_link) {
            Ok(link) => link,
            Err(e) => {
                debug!("{}", e);
                return;
            }
        };

        let Some(this) = self.this.upgrade() else {
            return;
        };
        let target = item.clone();
        self.spawn(&item, async move {
            let result = this.provider.fetch_labels(&link).await;
            this.complete_labels(&target, &link, result);
        });
    }

    fn enrich_epic(&self, badge: D::Element, epic: EpicRef) {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let target = badge.clone();
        self.spawn(&badge, async move {
            let result = this.provider.fetch_descendant_counts(&epic).await;
            this.complete_weight(&target, &epic, result);
        });
    }

    fn spawn<F>(&self, element: &D::Element, work: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let Some(this) = self.this.upgrade() else {
            return;
        };
        let (id, task) = self.tasks.bind(element, work);
        self.spawner.spawn_task(Box::pin(async move {
            if task.await.is_err() {
                debug!("Fetch task {} aborted", id);
            }
            this.tasks.finish(id);
        }));
    }

    fn complete_labels(
        &self,
        item: &D::Element,
        link: &str,
        result: std::result::Result<IssueLabels, HostDataError>,
    ) {
        if !item.is_connected() {
            debug!("Item for {} was removed before its labels arrived", link);
            return;
        }
        let rendered = result
            .map_err(Error::from)
            .and_then(|labels| render_labels(item, link, &labels.labels, &self.config));
        match rendered {
            Ok(_) => {}
            Err(Error::MissingAnchor) => {
                debug!("No layout area for labels of {}", link);
            }
            Err(e) => {
                warn!("Failed to load labels for {}: {}", link, e);
                item.add_class(&self.config.classes.failed);
            }
        }
    }

    fn complete_weight(
        &self,
        badge: &D::Element,
        epic: &EpicRef,
        result: std::result::Result<DescendantCounts, HostDataError>,
    ) {
        if !badge.is_connected() {
            debug!("Epic badge was removed before the weight arrived");
            return;
        }
        match result {
            Ok(counts) => {
                render_weight(badge, &WeightSummary::from(counts), &self.config);
            }
            Err(e) => {
                warn!(
                    "Failed to load weight of epic &{} in {}: {}",
                    epic.epic_iid, epic.group_path, e
                );
                badge.add_class(&self.config.classes.failed);
            }
        }
    }
}

/// The `href` of the item's link.
fn item_link<E: HostElement>(item: &E, selector: &str) -> Result<String> {
    item.query(selector)
        .and_then(|link| link.attribute("href"))
        .filter(|href| !href.is_empty())
        .ok_or_else(|| Error::MissingLink {
            selector: selector.to_string(),
        })
}
