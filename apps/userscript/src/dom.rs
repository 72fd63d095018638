//! `web-sys` backend for the host DOM capabilities.

use gitlab_focus_core::dom::{
    Fragment, FragmentChild, HostDocument, HostElement, MutationCallback, MutationRecord,
};
use log::warn;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, MutationObserver, MutationObserverInit, NodeList};

pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{:?}", value))
}

fn elements(nodes: NodeList) -> Vec<BrowserElement> {
    (0..nodes.length())
        .filter_map(|i| nodes.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .map(BrowserElement)
        .collect()
}

/// Materializes `fragment` as a detached element owned by `document`.
fn build(document: &Document, fragment: &Fragment) -> Result<Element, JsValue> {
    let element = document.create_element(fragment.tag())?;
    for (name, value) in fragment.all_attributes() {
        element.set_attribute(&name, &value)?;
    }
    for child in fragment.children() {
        match child {
            FragmentChild::Element(child) => {
                let child = build(document, child)?;
                element.append_child(&child)?;
            }
            FragmentChild::Text(text) => {
                element.append_child(&document.create_text_node(text))?;
            }
        }
    }
    Ok(element)
}

#[derive(Clone, Debug, PartialEq)]
pub struct BrowserElement(Element);

impl BrowserElement {
    fn build(&self, fragment: &Fragment) -> Option<Element> {
        let document = self.0.owner_document()?;
        build(&document, fragment)
            .map_err(|e| warn!("Failed to build <{}>: {}", fragment.tag(), describe(&e)))
            .ok()
    }
}

impl HostElement for BrowserElement {
    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn add_class(&self, class: &str) {
        if let Err(e) = self.0.class_list().add_1(class) {
            warn!("Failed to add class '{}': {}", class, describe(&e));
        }
    }

    fn remove_class(&self, class: &str) {
        if let Err(e) = self.0.class_list().remove_1(class) {
            warn!("Failed to remove class '{}': {}", class, describe(&e));
        }
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.0.get_attribute(name)
    }

    fn query(&self, selector: &str) -> Option<Self> {
        self.0.query_selector(selector).ok().flatten().map(Self)
    }

    fn query_all(&self, selector: &str) -> Vec<Self> {
        self.0
            .query_selector_all(selector)
            .map(elements)
            .unwrap_or_default()
    }

    fn insert_after(&self, fragment: &Fragment) -> Option<Self> {
        self.0.parent_node()?;
        let element = self.build(fragment)?;
        match self.0.after_with_node_1(&element) {
            Ok(()) => Some(Self(element)),
            Err(e) => {
                warn!("Failed to insert <{}>: {}", fragment.tag(), describe(&e));
                None
            }
        }
    }

    fn append(&self, fragment: &Fragment) -> Option<Self> {
        let element = self.build(fragment)?;
        match self.0.append_child(&element) {
            Ok(_) => Some(Self(element)),
            Err(e) => {
                warn!("Failed to append <{}>: {}", fragment.tag(), describe(&e));
                None
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.0.is_connected()
    }
}

pub struct BrowserDocument {
    document: Document,
}

impl BrowserDocument {
    pub fn new(document: Document) -> Self {
        Self { document }
    }
}

impl HostDocument for BrowserDocument {
    type Element = BrowserElement;

    fn location(&self) -> String {
        self.document
            .location()
            .and_then(|location| location.href().ok())
            .unwrap_or_default()
    }

    fn query(&self, selector: &str) -> Option<BrowserElement> {
        self.document
            .query_selector(selector)
            .ok()
            .flatten()
            .map(BrowserElement)
    }

    fn query_all(&self, selector: &str) -> Vec<BrowserElement> {
        self.document
            .query_selector_all(selector)
            .map(elements)
            .unwrap_or_default()
    }

    fn observe(&self, target: &BrowserElement, mut callback: MutationCallback) {
        let closure = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let batch: Vec<MutationRecord> = records
                    .iter()
                    .filter_map(|record| record.dyn_into::<web_sys::MutationRecord>().ok())
                    .map(|record| MutationRecord {
                        added_nodes: record.added_nodes().length() as usize,
                        removed_nodes: record.removed_nodes().length() as usize,
                    })
                    .collect();
                callback(batch.as_slice());
            },
        );

        let observer = match MutationObserver::new(closure.as_ref().unchecked_ref()) {
            Ok(observer) => observer,
            Err(e) => {
                warn!("Failed to create mutation observer: {}", describe(&e));
                return;
            }
        };
        let options = MutationObserverInit::new();
        options.set_child_list(true);
        options.set_subtree(true);
        if let Err(e) = observer.observe_with_options(&target.0, &options) {
            warn!("Failed to observe container: {}", describe(&e));
            return;
        }

        // The observer lives as long as the page, and so does its callback.
        closure.forget();
    }
}
