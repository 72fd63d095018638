//! Typed markup fragments.
//!
//! Every piece of markup the enrichment injects is assembled from typed
//! fields into a [`Fragment`] tree. DOM backends materialize the tree node by
//! node (no `innerHTML`), and [`Fragment::to_html`] serializes it with
//! escaping for logs and tests.

use std::fmt::Write as _;

/// A child of a fragment: a nested element or a text run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FragmentChild {
    Element(Fragment),
    Text(String),
}

/// An element to be created in the host document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fragment {
    tag: String,
    classes: Vec<String>,
    attributes: Vec<(String, String)>,
    styles: Vec<(String, String)>,
    children: Vec<FragmentChild>,
}

impl Fragment {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            classes: Vec::new(),
            attributes: Vec::new(),
            styles: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds one class. Duplicates are ignored.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        if !class.is_empty() && !self.classes.contains(&class) {
            self.classes.push(class);
        }
        self
    }

    pub fn classes<I, S>(self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        classes.into_iter().fold(self, |fragment, class| fragment.class(class))
    }

    /// Sets an attribute. `class` and `style` have their own builders.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
        self
    }

    /// Adds an inline style declaration, custom properties included.
    pub fn style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.push((property.into(), value.into()));
        self
    }

    pub fn child(mut self, child: Fragment) -> Self {
        self.children.push(FragmentChild::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(FragmentChild::Text(text.into()));
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn class_list(&self) -> &[String] {
        &self.classes
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    pub fn children(&self) -> &[FragmentChild] {
        &self.children
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the `class` attribute, `None` when there are no classes.
    pub fn class_attribute(&self) -> Option<String> {
        (!self.classes.is_empty()).then(|| self.classes.join(" "))
    }

    /// Value of the `style` attribute, `None` when there are no declarations.
    pub fn style_attribute(&self) -> Option<String> {
        (!self.styles.is_empty()).then(|| {
            self.styles
                .iter()
                .map(|(property, value)| format!("{property}: {value}"))
                .collect::<Vec<_>>()
                .join("; ")
        })
    }

    /// All attributes in the order a backend should set them.
    pub fn all_attributes(&self) -> Vec<(String, String)> {
        let mut all = Vec::with_capacity(self.attributes.len() + 2);
        if let Some(class) = self.class_attribute() {
            all.push(("class".to_string(), class));
        }
        if let Some(style) = self.style_attribute() {
            all.push(("style".to_string(), style));
        }
        all.extend(self.attributes.iter().cloned());
        all
    }

    /// Concatenated text of the whole subtree.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                FragmentChild::Element(element) => out.push_str(&element.text_content()),
                FragmentChild::Text(text) => out.push_str(text),
            }
        }
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        for (name, value) in self.all_attributes() {
            let _ = write!(out, " {}=\"{}\"", name, escape_attribute(&value));
        }
        out.push('>');
        for child in &self.children {
            match child {
                FragmentChild::Element(element) => element.write_html(out),
                FragmentChild::Text(text) => out.push_str(&escape_text(text)),
            }
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}
