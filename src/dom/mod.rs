//! In-memory page snapshot the capture core operates on.
//!
//! The embedding host hands the core an element tree with layout
//! rectangles; the core only ever reads it. Elements are addressed by
//! [`NodeId`] handles (child-index paths from the root) so the picker
//! can hold on to a hovered element without owning or mutating it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned layout rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns true if the rectangle has a positive area.
    pub fn is_visible(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        self.is_visible()
            && px >= self.x
            && px < self.x + self.width
            && py >= self.y
            && py < self.y + self.height
    }

    /// Centre point, used for pixel sampling.
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// A node in the snapshot tree: either an element or a run of text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Text { text: String },
    Element(Element),
}

/// One element of the snapshot, with its layout box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub tag: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub children: Vec<Node>,
}

/// A `<meta>` entry captured from the page head.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// The whole page snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub meta: Vec<MetaTag>,
    #[serde(default)]
    pub canonical: String,
    pub root: Element,
}

/// Stable handle for an element: the child-index path from the root.
///
/// An empty path addresses the root itself. Paths stay valid for the
/// lifetime of the snapshot because the core never mutates the tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(Vec<usize>);

impl NodeId {
    pub fn root() -> Self {
        Self(Vec::new())
    }
}

impl Document {
    /// Resolves a [`NodeId`] back to its element.
    pub fn get(&self, id: &NodeId) -> Option<&Element> {
        let mut current = &self.root;
        for &idx in &id.0 {
            match current.children.get(idx) {
                Some(Node::Element(el)) => current = el,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Topmost element under the given point.
    ///
    /// "Topmost" means the deepest, latest-in-document-order element
    /// whose rect contains the point, which matches how a rendered
    /// page stacks statically positioned boxes. Overlay nodes never
    /// appear here because the picker keeps its overlay outside the
    /// snapshot tree.
    pub fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        fn descend(el: &Element, x: f64, y: f64, path: &mut Vec<usize>) -> Option<NodeId> {
            let mut best: Option<NodeId> = None;
            if el.rect.contains(x, y) {
                best = Some(NodeId(path.clone()));
            }
            for (idx, child) in el.children.iter().enumerate() {
                if let Node::Element(child_el) = child {
                    path.push(idx);
                    if let Some(hit) = descend(child_el, x, y, path) {
                        best = Some(hit);
                    }
                    path.pop();
                }
            }
            best
        }
        descend(&self.root, x, y, &mut Vec::new())
    }

    /// Looks up a meta entry by its `name` or `property` attribute.
    pub fn meta_content(&self, name: &str) -> &str {
        self.meta
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// Host portion of the page URL, used to key site rules.
    pub fn host(&self) -> String {
        url::Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
            .unwrap_or_default()
    }
}

/// Tags that introduce a line break in the readable-text rendering.
fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "br"
            | "div"
            | "dl"
            | "dd"
            | "dt"
            | "fieldset"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "table"
            | "tr"
            | "ul"
    )
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(|s| s.as_str())
    }

    /// Child elements only (text runs skipped).
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(el) => Some(el),
            Node::Text { .. } => None,
        })
    }

    /// Depth-first descendants (self excluded), in document order.
    pub fn descendants(&self) -> Vec<&Element> {
        let mut out = Vec::new();
        fn walk<'a>(el: &'a Element, out: &mut Vec<&'a Element>) {
            for child in el.child_elements() {
                out.push(child);
                walk(child, out);
            }
        }
        walk(self, &mut out);
        out
    }

    /// First descendant with the given tag, in document order.
    pub fn find_descendant(&self, tag: &str) -> Option<&Element> {
        self.descendants().into_iter().find(|el| el.tag == tag)
    }

    /// Readable text of the element, normalized the way a user would
    /// see it: NBSP becomes a plain space, trailing spaces before a
    /// newline are dropped, runs of three or more newlines collapse to
    /// a blank line, and the result is trimmed.
    pub fn inner_text(&self) -> String {
        let mut raw = String::new();
        fn collect(el: &Element, out: &mut String) {
            if is_block(&el.tag) && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            for child in &el.children {
                match child {
                    Node::Text { text } => out.push_str(text),
                    Node::Element(child_el) => collect(child_el, out),
                }
            }
            if is_block(&el.tag) && !out.ends_with('\n') {
                out.push('\n');
            }
        }
        collect(self, &mut raw);
        normalize_text(&raw)
    }

    /// Serializes the element back to markup.
    pub fn outer_html(&self) -> String {
        let mut out = String::new();
        write_html(self, &mut out);
        out
    }
}

/// The normalization applied to readable text extraction.
pub fn normalize_text(raw: &str) -> String {
    let replaced = raw.replace('\u{a0}', " ");
    let mut lines: Vec<&str> = replaced.lines().map(|l| l.trim_end()).collect();
    // Collapse 3+ newlines down to a single blank line.
    let mut collapsed: Vec<&str> = Vec::with_capacity(lines.len());
    let mut blanks = 0usize;
    for line in lines.drain(..) {
        if line.is_empty() {
            blanks += 1;
            if blanks >= 2 {
                continue;
            }
        } else {
            blanks = 0;
        }
        collapsed.push(line);
    }
    collapsed.join("\n").trim().to_string()
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn write_html(el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.tag);
    for (name, value) in &el.attrs {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&value.replace('"', "&quot;"));
        out.push('"');
    }
    if el.children.is_empty() && matches!(el.tag.as_str(), "br" | "hr" | "img" | "input" | "meta")
    {
        out.push_str(" />");
        return;
    }
    out.push('>');
    for child in &el.children {
        match child {
            Node::Text { text } => out.push_str(&escape_text(text)),
            Node::Element(child_el) => write_html(child_el, out),
        }
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
}
