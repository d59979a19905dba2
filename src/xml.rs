//!
//! A minimal element tree used to assemble XML VTK documents.
//!
//! The tree is append-only: elements collect attributes and an ordered list of children, which
//! may be literal text or nested elements. Serialization mirrors the output expected by VTK
//! readers, one tag per line, with attribute values and text written verbatim unless
//! [`Escaping::Strict`] is requested.
//!

use std::fmt;
use std::io::{self, Write};

/// Controls how attribute values and text children are written.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Escaping {
    /// Write everything verbatim. This is what VTK readers have always been given.
    #[default]
    Lenient,
    /// Escape markup characters in attribute values and text.
    Strict,
}

impl Escaping {
    fn apply<'a>(&self, s: &'a str) -> std::borrow::Cow<'a, str> {
        match self {
            Escaping::Lenient => std::borrow::Cow::Borrowed(s),
            Escaping::Strict => quick_xml::escape::escape(s),
        }
    }
}

/// A child of an element.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl From<Element> for Node {
    fn from(e: Element) -> Node {
        Node::Element(e)
    }
}

impl From<String> for Node {
    fn from(s: String) -> Node {
        Node::Text(s)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Node {
        Node::Text(s.to_string())
    }
}

impl Node {
    fn write_with<W: Write>(&self, w: &mut W, escaping: Escaping) -> io::Result<()> {
        match self {
            Node::Text(text) => w.write_all(escaping.apply(text).as_bytes()),
            Node::Element(elem) => elem.write_with(w, escaping),
        }
    }

    /// Returns the contained element if this node is not text.
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    /// Returns the contained text if this node is not an element.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(t) => Some(t.as_str()),
            Node::Element(_) => None,
        }
    }
}

/// An XML element with a tag, attributes and children.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// Construct an element with no attributes and no children.
    pub fn new(tag: impl Into<String>) -> Self {
        Element {
            tag: tag.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing any previous value under the same key.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.set_attr(key, value);
        self
    }

    /// Set an attribute only if `value` is `Some`. `None` values are not written at all.
    pub fn with_opt_attr(self, key: impl Into<String>, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(value) => self.with_attr(key, value),
            None => self,
        }
    }

    pub fn set_attr(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        let key = key.into();
        let value = value.to_string();
        match self.attributes.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.attributes.push((key, value)),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Look up the value of an attribute.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(key, value)` attribute pairs in the order they will be written.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Iterate over child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(Node::as_element)
    }

    /// Append a child. Children are written in insertion order.
    pub fn add_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    /// Duplicate this element's tag and attributes.
    ///
    /// The children are replaced by `new_children` if given, otherwise they are cloned.
    pub fn copy(&self, new_children: Option<Vec<Node>>) -> Element {
        Element {
            tag: self.tag.clone(),
            attributes: self.attributes.clone(),
            children: new_children.unwrap_or_else(|| self.children.clone()),
        }
    }

    /// Write this element and its subtree without escaping.
    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.write_with(w, Escaping::Lenient)
    }

    pub fn write_with<W: Write>(&self, w: &mut W, escaping: Escaping) -> io::Result<()> {
        write!(w, "<{}", self.tag)?;
        for (key, value) in self.attributes.iter() {
            write!(w, " {}=\"{}\"", key, escaping.apply(value))?;
        }
        if self.children.is_empty() {
            return writeln!(w, "/>");
        }
        writeln!(w, ">")?;
        for child in self.children.iter() {
            child.write_with(w, escaping)?;
        }
        writeln!(w, "</{}>", self.tag)
    }
}

/// The document root: an XML declaration followed by its children.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Root {
    children: Vec<Node>,
}

impl Root {
    pub fn new(child: impl Into<Node>) -> Self {
        Root {
            children: vec![child.into()],
        }
    }

    pub fn add_child(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// The first element below the root, which is the `VTKFile` element for generated documents.
    pub fn file_element(&self) -> Option<&Element> {
        self.children.iter().find_map(Node::as_element)
    }

    pub fn write<W: Write>(&self, w: &mut W) -> io::Result<()> {
        self.write_with(w, Escaping::Lenient)
    }

    pub fn write_with<W: Write>(&self, w: &mut W, escaping: Escaping) -> io::Result<()> {
        writeln!(w, "<?xml version=\"1.0\"?>")?;
        for child in self.children.iter() {
            child.write_with(w, escaping)?;
        }
        Ok(())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = Vec::new();
        self.write(&mut out).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&out))
    }
}

impl fmt::Display for Root {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut out = Vec::new();
        self.write(&mut out).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&out))
    }
}
