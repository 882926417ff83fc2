//! Retained UI tree — the DOM-equivalent every renderer writes into.
//!
//! Nodes are plain owned data: a tag, optional id, classes, string attributes,
//! optional text, a hidden flag and children. Canvas nodes additionally own a
//! [`Surface`] that records draw operations. Front ends only read this tree;
//! all state a control exposes lives in its node's attributes.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::chart::Surface;

/// Element kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tag {
    Root,
    Section,
    Div,
    Form,
    Label,
    Small,
    Span,
    Input,
    Textarea,
    Select,
    Option,
    Fieldset,
    Legend,
    Button,
    Nav,
    Canvas,
    Table,
    Thead,
    Tbody,
    Tr,
    Th,
    Td,
    Pre,
    H2,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::Root => "root",
            Tag::Section => "section",
            Tag::Div => "div",
            Tag::Form => "form",
            Tag::Label => "label",
            Tag::Small => "small",
            Tag::Span => "span",
            Tag::Input => "input",
            Tag::Textarea => "textarea",
            Tag::Select => "select",
            Tag::Option => "option",
            Tag::Fieldset => "fieldset",
            Tag::Legend => "legend",
            Tag::Button => "button",
            Tag::Nav => "nav",
            Tag::Canvas => "canvas",
            Tag::Table => "table",
            Tag::Thead => "thead",
            Tag::Tbody => "tbody",
            Tag::Tr => "tr",
            Tag::Th => "th",
            Tag::Td => "td",
            Tag::Pre => "pre",
            Tag::H2 => "h2",
        }
    }
}

/// One element of the UI tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub tag: Tag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub hidden: bool,
    #[serde(skip)]
    pub surface: Option<Surface>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag,
            id: None,
            classes: Vec::new(),
            attrs: BTreeMap::new(),
            text: None,
            hidden: false,
            surface: None,
            children: Vec::new(),
        }
    }

    /// An empty root container.
    pub fn root() -> Self {
        Self::new(Tag::Root)
    }

    // ── Builders ────────────────────────────────────────────────────

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    // ── Attributes and classes ──────────────────────────────────────

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    pub fn has_attr(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(key.into(), value.into());
    }

    pub fn remove_attr(&mut self, key: &str) -> Option<String> {
        self.attrs.remove(key)
    }

    /// Set or clear a boolean attribute (present with an empty value, or absent).
    pub fn set_flag(&mut self, key: &str, on: bool) {
        if on {
            self.attrs.insert(key.to_string(), String::new());
        } else {
            self.attrs.remove(key);
        }
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !self.has_class(&class) {
            self.classes.push(class);
        }
    }

    /// Concatenated text of this node and all descendants, depth first.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        if let Some(text) = &self.text {
            out.push_str(text);
        }
        for child in &self.children {
            child.collect_text(out);
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        self.find(&|n| n.id.as_deref() == Some(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.find_mut(&|n| n.id.as_deref() == Some(id))
    }

    /// First node (pre-order) matching the predicate, including `self`.
    pub fn find(&self, pred: &dyn Fn(&Node) -> bool) -> Option<&Node> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(pred))
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Node) -> bool) -> Option<&mut Node> {
        if pred(self) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(pred))
    }

    /// All nodes (pre-order) matching the predicate.
    pub fn find_all(&self, pred: &dyn Fn(&Node) -> bool) -> Vec<&Node> {
        let mut out = Vec::new();
        self.walk(&mut |n| {
            if pred(n) {
                out.push(n);
            }
        });
        out
    }

    pub fn find_by_class(&self, class: &str) -> Vec<&Node> {
        self.find_all(&|n| n.has_class(class))
    }

    /// Pre-order visit of this node and every descendant.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Node)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub fn walk_mut(&mut self, visit: &mut dyn FnMut(&mut Node)) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }

    /// Number of nodes in this subtree, `self` included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Node::count).sum::<usize>()
    }

    /// Drop all children and text, keeping tag, id and classes.
    pub fn clear(&mut self) {
        self.children.clear();
        self.text = None;
        self.surface = None;
    }

    /// Indented one-line-per-node outline, used by the CLI and in tests.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(0, &mut out);
        out
    }

    fn write_outline(&self, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(self.tag.as_str());
        if let Some(id) = &self.id {
            out.push('#');
            out.push_str(id);
        }
        for class in &self.classes {
            out.push('.');
            out.push_str(class);
        }
        for (k, v) in &self.attrs {
            if v.is_empty() {
                out.push_str(&format!(" [{k}]"));
            } else {
                out.push_str(&format!(" [{k}={v}]"));
            }
        }
        if self.hidden {
            out.push_str(" (hidden)");
        }
        if let Some(surface) = &self.surface {
            out.push_str(&format!(" <{} ops>", surface.ops().len()));
        }
        if let Some(text) = &self.text {
            out.push_str(&format!(" \"{text}\""));
        }
        out.push('\n');
        for child in &self.children {
            child.write_outline(depth + 1, out);
        }
    }
}
