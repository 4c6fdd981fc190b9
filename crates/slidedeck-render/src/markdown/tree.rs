//! The presentation tree produced by the markdown pipeline.

use crate::error::RenderError;

/// Elements serialized without a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source",
    "track", "wbr",
];

/// A node of the render tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    /// Text, escaped on serialization.
    Text(String),
    /// Markup passed through unescaped.
    Raw(String),
}

/// An element with ordered attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Adds an attribute, returning `self` for chaining.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Adds a child node, returning `self` for chaining.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Sets an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name, value)),
        }
    }

    /// Concatenated text of all descendants (raw markup excluded).
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn is_void(&self) -> bool {
        VOID_ELEMENTS.contains(&self.tag.as_str())
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
            Node::Raw(_) => {}
        }
    }
}

/// Escapes text content.
pub fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

/// Escapes an attribute value for double-quoted output.
pub fn escape_attr(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

fn write_nodes(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => escape_text(text, out),
            Node::Raw(raw) => out.push_str(raw),
            Node::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    escape_attr(value, out);
                    out.push('"');
                }
                if el.is_void() {
                    out.push_str(" />");
                    continue;
                }
                out.push('>');
                write_nodes(&el.children, out);
                out.push_str("</");
                out.push_str(&el.tag);
                out.push('>');
            }
        }
    }
}

fn try_walk(
    nodes: &mut [Node],
    f: &mut dyn FnMut(&mut Node) -> Result<(), RenderError>,
) -> Result<(), RenderError> {
    for node in nodes.iter_mut() {
        f(node)?;
        if let Node::Element(el) = node {
            try_walk(&mut el.children, f)?;
        }
    }
    Ok(())
}

fn retain_nodes(nodes: &mut Vec<Node>, keep: &mut dyn FnMut(&Node) -> bool) {
    nodes.retain(|node| keep(node));
    for node in nodes.iter_mut() {
        if let Node::Element(el) = node {
            retain_nodes(&mut el.children, keep);
        }
    }
}

/// Parsed slide body, ready for stages and serialization.
///
/// Trees are built fresh for every body; nothing is cached between versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderTree {
    pub children: Vec<Node>,
}

impl RenderTree {
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Visits every node in document order; the callback may replace the
    /// node it is given. Replaced nodes are descended into afterwards.
    pub fn try_walk_mut(
        &mut self,
        mut f: impl FnMut(&mut Node) -> Result<(), RenderError>,
    ) -> Result<(), RenderError> {
        try_walk(&mut self.children, &mut f)
    }

    /// Removes every node, at any depth, for which `keep` returns `false`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Node) -> bool) {
        retain_nodes(&mut self.children, &mut keep);
    }

    /// Collects references to every element with the given tag.
    pub fn find_all(&self, tag: &str) -> Vec<&Element> {
        fn find<'a>(nodes: &'a [Node], tag: &str, out: &mut Vec<&'a Element>) {
            for node in nodes {
                if let Node::Element(el) = node {
                    if el.tag == tag {
                        out.push(el);
                    }
                    find(&el.children, tag, out);
                }
            }
        }
        let mut out = Vec::new();
        find(&self.children, tag, &mut out);
        out
    }

    /// Serializes the tree to static markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.children, &mut out);
        out
    }
}
