//! In-memory DOM backend.
//!
//! A [`scraper::Html`] tree implementing [`HostDocument`] and
//! [`HostElement`]. Queries go through [`scraper::Selector`], so selector
//! lists, combinators and attribute values behave as in a browser. Mutation
//! observers are queued like the browser's: records accumulate while the tree
//! changes and are delivered by [`MemoryDocument::flush_mutations`], the
//! stand-in for the microtask checkpoint.

use std::cell::RefCell;
use std::rc::Rc;

use ego_tree::{NodeId, NodeRef, Tree};
use log::warn;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};

use super::{Fragment, HostDocument, HostElement, MutationCallback, MutationRecord};

struct Observer {
    target: NodeId,
    callback: Rc<RefCell<MutationCallback>>,
    pending: Vec<MutationRecord>,
}

struct Arena {
    html: Html,
    body: NodeId,
    observers: Vec<Observer>,
}

/// First element the fragment parser produced, below its `<html>` wrapper.
fn top_level_element(parsed: &Html) -> Option<NodeRef<'_, Node>> {
    parsed
        .tree
        .root()
        .children()
        .flat_map(|wrapper| wrapper.children())
        .find(|node| node.value().is_element())
}

/// Copies `source` and its subtree into `tree` as a detached node.
fn graft(tree: &mut Tree<Node>, source: NodeRef<'_, Node>) -> NodeId {
    let id = tree.orphan(source.value().clone()).id();
    for child in source.children() {
        let child_id = graft(tree, child);
        if let Some(mut node) = tree.get_mut(id) {
            node.append_id(child_id);
        }
    }
    id
}

impl Arena {
    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    fn element(&self, id: NodeId) -> Option<&Element> {
        self.node(id)?.value().as_element()
    }

    /// Parses `fragment` into a detached subtree and returns its root.
    fn build(&mut self, fragment: &Fragment) -> Option<NodeId> {
        let parsed = Html::parse_fragment(&fragment.to_html());
        match top_level_element(&parsed) {
            Some(root) => Some(graft(&mut self.html.tree, root)),
            None => {
                warn!("Parser produced no element for <{}>", fragment.tag());
                None
            }
        }
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.node(id).is_some_and(|node| {
            node.id() == ancestor || node.ancestors().any(|parent| parent.id() == ancestor)
        })
    }

    fn is_connected(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.html.tree.root().id(), id)
    }

    /// Queues `record` for every observer whose subtree contains `parent`.
    fn record(&mut self, parent: NodeId, record: MutationRecord) {
        let targets: Vec<NodeId> = self.observers.iter().map(|o| o.target).collect();
        for (index, target) in targets.into_iter().enumerate() {
            if self.is_inclusive_ancestor(target, parent) {
                self.observers[index].pending.push(record);
            }
        }
    }

    /// Detaches `id` and returns its former parent.
    fn detach(&mut self, id: NodeId) -> Option<NodeId> {
        let parent = self.node(id)?.parent()?.id();
        self.html.tree.get_mut(id)?.detach();
        Some(parent)
    }

    fn query_all(&self, scope: NodeId, selector: &str) -> Vec<NodeId> {
        let parsed = match Selector::parse(selector) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Ignoring invalid selector '{}': {}", selector, e);
                return Vec::new();
            }
        };
        let Some(scope) = self.node(scope) else {
            return Vec::new();
        };
        scope
            .descendants()
            .skip(1)
            .filter(|node| ElementRef::wrap(*node).is_some_and(|element| parsed.matches(&element)))
            .map(|node| node.id())
            .collect()
    }

    /// Replaces the element at `id` with one carrying the updated attribute.
    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) {
        let Some(element) = self.element(id) else {
            return;
        };
        let mut rebuilt = Fragment::new(element.name());
        for (existing, current) in element.attrs() {
            rebuilt = rebuilt.attr(existing, if existing == name { value } else { current });
        }
        if element.attr(name).is_none() {
            rebuilt = rebuilt.attr(name, value);
        }

        let parsed = Html::parse_fragment(&rebuilt.to_html());
        let Some(node) = top_level_element(&parsed).map(|node| node.value().clone()) else {
            warn!("Failed to set '{}' on <{}>", name, rebuilt.tag());
            return;
        };
        if let Some(mut target) = self.html.tree.get_mut(id) {
            *target.value() = node;
        }
    }
}

/// An in-memory page.
#[derive(Clone)]
pub struct MemoryDocument {
    arena: Rc<RefCell<Arena>>,
    location: String,
}

impl MemoryDocument {
    /// Creates an empty `<html><head></head><body></body></html>` for the page
    /// at `location`.
    pub fn new(location: impl Into<String>) -> Self {
        let html = Html::parse_document("<html><head></head><body></body></html>");
        let body = html
            .tree
            .root()
            .descendants()
            .find(|node| node.value().as_element().is_some_and(|e| e.name() == "body"))
            .map(|node| node.id())
            .unwrap_or_else(|| html.tree.root().id());

        Self {
            arena: Rc::new(RefCell::new(Arena {
                html,
                body,
                observers: Vec::new(),
            })),
            location: location.into(),
        }
    }

    pub fn body(&self) -> MemoryElement {
        let body = self.arena.borrow().body;
        self.element(body)
    }

    fn element(&self, id: NodeId) -> MemoryElement {
        MemoryElement {
            arena: Rc::clone(&self.arena),
            id,
        }
    }

    /// Delivers queued mutation records. Returns how many callbacks ran.
    pub fn flush_mutations(&self) -> usize {
        let deliveries: Vec<_> = {
            let mut arena = self.arena.borrow_mut();
            arena
                .observers
                .iter_mut()
                .filter(|o| !o.pending.is_empty())
                .map(|o| (Rc::clone(&o.callback), std::mem::take(&mut o.pending)))
                .collect()
        };
        for (callback, records) in &deliveries {
            let mut callback = callback.borrow_mut();
            (*callback)(records.as_slice());
        }
        deliveries.len()
    }

    /// Serialized markup of the whole body, for assertions.
    pub fn body_html(&self) -> String {
        self.body().outer_html()
    }
}

impl HostDocument for MemoryDocument {
    type Element = MemoryElement;

    fn location(&self) -> String {
        self.location.clone()
    }

    fn query(&self, selector: &str) -> Option<MemoryElement> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<MemoryElement> {
        let arena = self.arena.borrow();
        let ids = arena.query_all(arena.html.tree.root().id(), selector);
        drop(arena);
        ids.into_iter().map(|id| self.element(id)).collect()
    }

    fn observe(&self, target: &MemoryElement, callback: MutationCallback) {
        self.arena.borrow_mut().observers.push(Observer {
            target: target.id,
            callback: Rc::new(RefCell::new(callback)),
            pending: Vec::new(),
        });
    }
}

/// Handle to an element of a [`MemoryDocument`].
#[derive(Clone)]
pub struct MemoryElement {
    arena: Rc<RefCell<Arena>>,
    id: NodeId,
}

impl PartialEq for MemoryElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.arena, &other.arena) && self.id == other.id
    }
}

impl Eq for MemoryElement {}

impl std::fmt::Debug for MemoryElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryElement")
            .field("id", &self.id)
            .field("tag", &self.tag())
            .finish()
    }
}

impl MemoryElement {
    fn sibling(&self, id: NodeId) -> Self {
        Self {
            arena: Rc::clone(&self.arena),
            id,
        }
    }

    pub fn tag(&self) -> String {
        self.arena
            .borrow()
            .element(self.id)
            .map(|element| element.name().to_string())
            .unwrap_or_default()
    }

    pub fn classes(&self) -> Vec<String> {
        self.attribute("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Value of one inline style declaration.
    pub fn style(&self, property: &str) -> Option<String> {
        self.attribute("style")?.split(';').find_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            (name.trim() == property).then(|| value.trim().to_string())
        })
    }

    pub fn set_attribute(&self, name: &str, value: &str) {
        self.arena.borrow_mut().set_attribute(self.id, name, value);
    }

    pub fn text_content(&self) -> String {
        let arena = self.arena.borrow();
        arena
            .node(self.id)
            .and_then(ElementRef::wrap)
            .map(|element| element.text().collect())
            .unwrap_or_default()
    }

    pub fn parent(&self) -> Option<MemoryElement> {
        let parent = {
            let arena = self.arena.borrow();
            let parent = arena.node(self.id)?.parent()?;
            parent.value().is_element().then(|| parent.id())?
        };
        Some(self.sibling(parent))
    }

    /// Element children, text nodes excluded.
    pub fn children(&self) -> Vec<MemoryElement> {
        let ids: Vec<NodeId> = {
            let arena = self.arena.borrow();
            match arena.node(self.id) {
                Some(node) => node
                    .children()
                    .filter(|child| child.value().is_element())
                    .map(|child| child.id())
                    .collect(),
                None => Vec::new(),
            }
        };
        ids.into_iter().map(|id| self.sibling(id)).collect()
    }

    /// Detaches the node from its parent, queueing a removal record.
    pub fn remove(&self) {
        let mut arena = self.arena.borrow_mut();
        if let Some(parent) = arena.detach(self.id) {
            arena.record(parent, MutationRecord::removed(1));
        }
    }

    /// Moves `child` to the end of this element, the way a host re-renders a
    /// node it detached earlier. Queues a removal record for the old parent
    /// (if any) and an addition record for this one.
    pub fn append_element(&self, child: &MemoryElement) {
        if child.id == self.id {
            return;
        }
        let mut arena = self.arena.borrow_mut();
        if let Some(parent) = arena.detach(child.id) {
            arena.record(parent, MutationRecord::removed(1));
        }
        if let Some(mut node) = arena.html.tree.get_mut(self.id) {
            node.append_id(child.id);
        }
        arena.record(self.id, MutationRecord::added(1));
    }

    pub fn outer_html(&self) -> String {
        let arena = self.arena.borrow();
        arena
            .node(self.id)
            .and_then(ElementRef::wrap)
            .map(|element| element.html())
            .unwrap_or_default()
    }
}

impl HostElement for MemoryElement {
    fn has_class(&self, class: &str) -> bool {
        self.classes().iter().any(|c| c == class)
    }

    fn add_class(&self, class: &str) {
        let mut classes = self.classes();
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
            self.set_attribute("class", &classes.join(" "));
        }
    }

    fn remove_class(&self, class: &str) {
        let classes = self.classes();
        if classes.iter().any(|c| c == class) {
            let kept: Vec<_> = classes.into_iter().filter(|c| c != class).collect();
            self.set_attribute("class", &kept.join(" "));
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.arena
            .borrow()
            .element(self.id)?
            .attr(name)
            .map(str::to_string)
    }

    fn query(&self, selector: &str) -> Option<Self> {
        self.query_all(selector).into_iter().next()
    }

    fn query_all(&self, selector: &str) -> Vec<Self> {
        let ids = self.arena.borrow().query_all(self.id, selector);
        ids.into_iter().map(|id| self.sibling(id)).collect()
    }

    fn insert_after(&self, fragment: &Fragment) -> Option<Self> {
        let mut arena = self.arena.borrow_mut();
        let parent = arena.node(self.id)?.parent()?.id();
        let id = arena.build(fragment)?;
        arena.html.tree.get_mut(self.id)?.insert_id_after(id);
        arena.record(parent, MutationRecord::added(1));
        drop(arena);
        Some(self.sibling(id))
    }

    fn append(&self, fragment: &Fragment) -> Option<Self> {
        let mut arena = self.arena.borrow_mut();
        arena.element(self.id)?;
        let id = arena.build(fragment)?;
        arena.html.tree.get_mut(self.id)?.append_id(id);
        arena.record(self.id, MutationRecord::added(1));
        drop(arena);
        Some(self.sibling(id))
    }

    fn is_connected(&self) -> bool {
        self.arena.borrow().is_connected(self.id)
    }
}
