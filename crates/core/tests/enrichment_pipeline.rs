//! End-to-end tests of the enrichment pipeline on the in-memory DOM.
//!
//! Fetches run on a `LocalPool`; a mock provider records every request and
//! can hold a fetch pending behind a oneshot gate.

use async_trait::async_trait;
use futures::channel::oneshot;
use futures::executor::LocalPool;
use gitlab_focus_core::dom::memory::{MemoryDocument, MemoryElement};
use gitlab_focus_core::dom::{Fragment, HostDocument, HostElement};
use gitlab_focus_core::{Enricher, FocusConfig};
use gitlab_focus_host_data::{
    DescendantCounts, EpicRef, HostDataError, HostDataProvider, IssueLabels, LabelDescriptor,
};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

// =============================================================================
// Mock provider
// =============================================================================

#[derive(Default)]
struct MockState {
    labels: RefCell<HashMap<String, Vec<LabelDescriptor>>>,
    failing: RefCell<Vec<String>>,
    gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
    counts: Cell<DescendantCounts>,
    label_requests: RefCell<Vec<String>>,
    epic_requests: RefCell<Vec<EpicRef>>,
}

#[derive(Clone, Default)]
struct MockProvider {
    state: Rc<MockState>,
}

impl MockProvider {
    fn with_labels(self, link: &str, labels: Vec<LabelDescriptor>) -> Self {
        self.state.labels.borrow_mut().insert(link.to_string(), labels);
        self
    }

    fn failing_for(self, link: &str) -> Self {
        self.state.failing.borrow_mut().push(link.to_string());
        self
    }

    fn with_counts(self, opened_issues: u64, closed_issues: u64) -> Self {
        self.state.counts.set(DescendantCounts {
            opened_issues,
            closed_issues,
        });
        self
    }

    /// Holds the next fetch for `link` until the returned sender fires.
    fn gate(&self, link: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.gates.borrow_mut().insert(link.to_string(), rx);
        tx
    }

    fn label_requests(&self) -> Vec<String> {
        self.state.label_requests.borrow().clone()
    }

    fn epic_requests(&self) -> Vec<EpicRef> {
        self.state.epic_requests.borrow().clone()
    }
}

#[async_trait(?Send)]
impl HostDataProvider for MockProvider {
    async fn fetch_labels(&self, item_link: &str) -> Result<IssueLabels, HostDataError> {
        self.state
            .label_requests
            .borrow_mut()
            .push(item_link.to_string());
        let gate = self.state.gates.borrow_mut().remove(item_link);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.state.failing.borrow().iter().any(|l| l == item_link) {
            return Err(HostDataError::Status {
                status: 500,
                url: format!("{item_link}.json"),
            });
        }
        let labels = self
            .state
            .labels
            .borrow()
            .get(item_link)
            .cloned()
            .unwrap_or_default();
        Ok(IssueLabels {
            project_id: Some(278964),
            labels,
        })
    }

    async fn fetch_descendant_counts(
        &self,
        epic: &EpicRef,
    ) -> Result<DescendantCounts, HostDataError> {
        self.state.epic_requests.borrow_mut().push(epic.clone());
        Ok(self.state.counts.get())
    }
}

// =============================================================================
// Page fixtures
// =============================================================================

const ISSUES_PAGE: &str = "https://gitlab.com/acme/app/-/issues/1";
const EPIC_PAGE: &str = "https://gitlab.com/groups/acme/platform/-/epics/12";

fn label(id: u64, title: &str) -> LabelDescriptor {
    LabelDescriptor {
        id,
        title: title.to_string(),
        color: "#428BCA".to_string(),
        text_color: "#FFFFFF".to_string(),
        description: None,
        project_id: Some(278964),
    }
}

fn issue_link(iid: u32) -> String {
    format!("/acme/app/-/issues/{iid}")
}

fn item(iid: u32, closed: bool) -> Fragment {
    let mut contents = Fragment::new("div").classes(["item-contents", "flex-xl-nowrap"]);
    if closed {
        contents = contents.child(Fragment::new("svg").class("issue-token-state-icon-closed"));
    }
    contents = contents
        .child(
            Fragment::new("a")
                .class("sortable-link")
                .attr("href", issue_link(iid))
                .text(format!("Issue {iid}")),
        )
        .child(
            Fragment::new("div")
                .classes(["item-meta", "justify-content-start"])
                .child(Fragment::new("div").class("item-path-area").text(format!("#{iid}"))),
        );
    Fragment::new("li").child(contents)
}

/// A page with an empty related items list inside the observed container.
fn page(location: &str) -> (MemoryDocument, MemoryElement) {
    let doc = MemoryDocument::new(location);
    let block = doc
        .body()
        .append(&Fragment::new("div").class("content-block"))
        .unwrap();
    let list = block
        .append(&Fragment::new("ul").class("related-items-list"))
        .unwrap();
    (doc, list)
}

/// Runs fetches and delivers mutations until neither produces more work.
fn settle(pool: &mut LocalPool, doc: &MemoryDocument) {
    loop {
        pool.run_until_stalled();
        if doc.flush_mutations() == 0 {
            break;
        }
    }
}

// =============================================================================
// Related items
// =============================================================================

#[test]
fn inserted_closed_item_is_marked_and_labelled_after_one_fetch() {
    let (doc, list) = page(ISSUES_PAGE);
    let provider = MockProvider::default().with_labels(
        &issue_link(42),
        vec![label(1, "bug"), label(2, "area::backend")],
    );
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    assert!(enricher.start());

    let li = list.append(&item(42, true)).unwrap();
    settle(&mut pool, &doc);

    assert!(li.has_class("gitlab-focus-processed"));
    assert!(li.has_class("gitlab-focus-closed"));
    assert!(!li.has_class("gitlab-focus-failed"));
    assert_eq!(provider.label_requests(), vec![issue_link(42)]);

    let areas = li.query_all(".gitlab-focus-labels");
    assert_eq!(areas.len(), 1);
    let chips = areas[0].query_all(".gl-label");
    assert_eq!(chips.len(), 2);
    assert!(!chips[0].has_class("gl-label-scoped"));
    assert!(chips[1].has_class("gl-label-scoped"));
    assert_eq!(
        chips[1].query("a.gl-label-link").unwrap().attribute("href").as_deref(),
        Some("/acme/app/-/issues?label_name=area%3A%3Abackend")
    );
    assert_eq!(enricher.in_flight(), 0);
}

#[test]
fn open_items_are_not_marked_closed() {
    let (doc, list) = page(ISSUES_PAGE);
    let provider = MockProvider::default().with_labels(&issue_link(7), vec![label(1, "bug")]);
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider, pool.spawner(), FocusConfig::default());
    enricher.start();

    let li = list.append(&item(7, false)).unwrap();
    settle(&mut pool, &doc);

    assert!(li.has_class("gitlab-focus-processed"));
    assert!(!li.has_class("gitlab-focus-closed"));
    assert_eq!(li.query_all(".gl-label").len(), 1);
}

#[test]
fn items_rendered_before_start_are_enriched() {
    let (doc, list) = page(ISSUES_PAGE);
    let li = list.append(&item(3, false)).unwrap();
    let provider = MockProvider::default().with_labels(&issue_link(3), vec![label(1, "bug")]);
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());

    enricher.start();
    settle(&mut pool, &doc);

    assert_eq!(provider.label_requests(), vec![issue_link(3)]);
    assert_eq!(li.query_all(".gitlab-focus-labels").len(), 1);
}

#[test]
fn repeated_rescans_do_not_duplicate_requests_or_areas() {
    let (doc, list) = page(ISSUES_PAGE);
    let provider = MockProvider::default().with_labels(&issue_link(42), vec![label(1, "bug")]);
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    enricher.start();
    list.append(&item(42, false)).unwrap();
    settle(&mut pool, &doc);

    enricher.rescan();
    enricher.rescan();
    settle(&mut pool, &doc);

    assert_eq!(provider.label_requests().len(), 1);
    assert_eq!(doc.query_all(".gitlab-focus-labels").len(), 1);
    assert_eq!(doc.query_all(".gl-label").len(), 1);
}

#[test]
fn overlapping_scans_while_a_fetch_is_pending_claim_each_item_once() {
    let (doc, list) = page(ISSUES_PAGE);
    let provider = MockProvider::default()
        .with_labels(&issue_link(1), vec![label(1, "bug")])
        .with_labels(&issue_link(2), vec![label(2, "feature")]);
    let release = provider.gate(&issue_link(1));
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    enricher.start();

    let first = list.append(&item(1, false)).unwrap();
    settle(&mut pool, &doc);
    assert_eq!(enricher.in_flight(), 1);

    let second = list.append(&item(2, false)).unwrap();
    settle(&mut pool, &doc);
    assert_eq!(provider.label_requests(), vec![issue_link(1), issue_link(2)]);
    assert!(first.query(".gitlab-focus-labels").is_none());

    release.send(()).unwrap();
    settle(&mut pool, &doc);

    assert_eq!(provider.label_requests().len(), 2);
    assert_eq!(first.query_all(".gitlab-focus-labels").len(), 1);
    assert_eq!(second.query_all(".gitlab-focus-labels").len(), 1);
    assert_eq!(enricher.in_flight(), 0);
}

#[test]
fn fetch_for_a_removed_item_is_aborted_and_renders_nothing() {
    let (doc, list) = page(ISSUES_PAGE);
    let provider = MockProvider::default().with_labels(&issue_link(5), vec![label(1, "bug")]);
    let release = provider.gate(&issue_link(5));
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    enricher.start();

    let li = list.append(&item(5, false)).unwrap();
    settle(&mut pool, &doc);
    assert_eq!(enricher.in_flight(), 1);

    li.remove();
    settle(&mut pool, &doc);
    assert_eq!(enricher.in_flight(), 0);

    let _ = release.send(());
    settle(&mut pool, &doc);

    assert!(!li.is_connected());
    assert!(li.query(".gitlab-focus-labels").is_none());
    assert!(!li.has_class("gitlab-focus-processed"));
    assert_eq!(provider.label_requests().len(), 1);
}

#[test]
fn item_put_back_after_an_aborted_fetch_is_enriched() {
    let (doc, list) = page(ISSUES_PAGE);
    let provider = MockProvider::default().with_labels(&issue_link(6), vec![label(1, "bug")]);
    let _held = provider.gate(&issue_link(6));
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    enricher.start();

    let li = list.append(&item(6, false)).unwrap();
    settle(&mut pool, &doc);
    li.remove();
    settle(&mut pool, &doc);
    assert_eq!(enricher.in_flight(), 0);

    list.append_element(&li);
    settle(&mut pool, &doc);

    assert_eq!(provider.label_requests().len(), 2);
    assert!(li.has_class("gitlab-focus-processed"));
    assert_eq!(li.query_all(".gitlab-focus-labels").len(), 1);
}

#[test]
fn failed_fetch_marks_the_item_and_is_not_retried() {
    let (doc, list) = page(ISSUES_PAGE);
    let provider = MockProvider::default().failing_for(&issue_link(9));
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    enricher.start();

    let li = list.append(&item(9, false)).unwrap();
    settle(&mut pool, &doc);
    enricher.rescan();
    settle(&mut pool, &doc);

    assert!(li.has_class("gitlab-focus-failed"));
    assert!(li.query(".gitlab-focus-labels").is_none());
    assert_eq!(provider.label_requests().len(), 1);
}

#[test]
fn items_without_labels_get_no_area() {
    let (doc, list) = page(ISSUES_PAGE);
    let provider = MockProvider::default();
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    enricher.start();

    let li = list.append(&item(11, false)).unwrap();
    settle(&mut pool, &doc);

    assert_eq!(provider.label_requests().len(), 1);
    assert!(li.query(".gitlab-focus-labels").is_none());
    assert!(!li.has_class("gitlab-focus-failed"));
}

#[test]
fn missing_container_disables_everything() {
    let doc = MemoryDocument::new(ISSUES_PAGE);
    let list = doc
        .body()
        .append(&Fragment::new("ul").class("related-items-list"))
        .unwrap();
    list.append(&item(1, true)).unwrap();
    let provider = MockProvider::default();
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());

    assert!(!enricher.start());
    list.append(&item(2, true)).unwrap();
    settle(&mut pool, &doc);

    assert!(provider.label_requests().is_empty());
    assert!(doc.query(".gitlab-focus-processed").is_none());
}

// =============================================================================
// Epic weight
// =============================================================================

fn epic_header(doc: &MemoryDocument) -> MemoryElement {
    let block = doc.query(".content-block").unwrap();
    let header = block.append(&Fragment::new("div").class("card-header")).unwrap();
    header
        .append(&Fragment::new("span").class("issue-count-badge").text("10"))
        .unwrap()
}

#[test]
fn epic_page_gets_a_weight_widget_next_to_the_badge() {
    let (doc, _list) = page(EPIC_PAGE);
    let provider = MockProvider::default().with_counts(3, 7);
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    assert_eq!(enricher.epic().map(|e| e.epic_iid), Some(12));
    enricher.start();

    let badge = epic_header(&doc);
    settle(&mut pool, &doc);

    let requests = provider.epic_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].group_path, "acme/platform");
    assert_eq!(requests[0].origin, "https://gitlab.com");

    let widgets = doc.query_all(".gitlab-focus-weight");
    assert_eq!(widgets.len(), 1);
    assert_eq!(badge.parent().unwrap().children()[1], widgets[0]);
    assert_eq!(
        widgets[0].query(".gitlab-focus-weight-total").unwrap().text_content(),
        "10"
    );
    assert_eq!(
        widgets[0].query(".gitlab-focus-weight-percent").unwrap().text_content(),
        "70%"
    );
}

#[test]
fn weight_is_inert_outside_epic_pages() {
    let (doc, _list) = page(ISSUES_PAGE);
    let provider = MockProvider::default().with_counts(3, 7);
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    assert!(enricher.epic().is_none());
    enricher.start();

    let badge = epic_header(&doc);
    settle(&mut pool, &doc);

    assert!(provider.epic_requests().is_empty());
    assert!(doc.query(".gitlab-focus-weight").is_none());
    assert!(!badge.has_class("gitlab-focus-processed"));
}

#[test]
fn epic_weight_is_fetched_once_per_page() {
    let (doc, _list) = page(EPIC_PAGE);
    let provider = MockProvider::default().with_counts(1, 1);
    let mut pool = LocalPool::new();
    let enricher = Enricher::new(doc.clone(), provider.clone(), pool.spawner(), FocusConfig::default());
    enricher.start();

    let first = epic_header(&doc);
    let second = epic_header(&doc);
    settle(&mut pool, &doc);

    // A badge rendered later is a new node, not a second summary.
    let replacement = epic_header(&doc);
    settle(&mut pool, &doc);

    assert_eq!(provider.epic_requests().len(), 1);
    let widgets = doc.query_all(".gitlab-focus-weight");
    assert_eq!(widgets.len(), 1);
    assert_eq!(first.parent().unwrap().children()[1], widgets[0]);
    assert!(!second.has_class("gitlab-focus-processed"));
    assert!(!replacement.has_class("gitlab-focus-processed"));
}
