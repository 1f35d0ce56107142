//! Minimal mutable XML tree for OOXML parts.
//!
//! Parts are read with quick-xml into owned elements so that text and
//! formatting can be edited in place, then written back. Everything the
//! tree does not model (declaration, comments, processing instructions,
//! CDATA) is kept as raw events and re-emitted verbatim.

use deck_core::{Error, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node inside an element.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
    Raw(Event<'static>),
}

/// An XML element with its qualified name (e.g. `a:r`).
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    /// Create an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = Self::new(name);

        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::XmlError(format!("Bad attribute: {}", e)))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|e| Error::XmlError(format!("Bad attribute value: {}", e)))?
                .into_owned();
            element.attributes.push((key, value));
        }

        Ok(element)
    }

    /// Local part of the name, without the namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Whether the local name matches.
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Name for a new sibling/child that shares this element's prefix.
    pub fn qualified(&self, local: &str) -> String {
        match self.name.split_once(':') {
            Some((prefix, _)) => format!("{}:{}", prefix, local),
            None => local.to_string(),
        }
    }

    /// Attribute value by qualified key.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set or overwrite an attribute.
    pub fn set_attr(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((key.to_string(), value)),
        }
    }

    /// Child elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// Mutable child elements in document order.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|el| el.is(local))
    }

    /// First mutable child element with the given local name.
    pub fn child_mut(&mut self, local: &str) -> Option<&mut Element> {
        self.elements_mut().find(|el| el.is(local))
    }

    /// Child elements with the given local name.
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements().filter(move |el| el.is(local))
    }

    /// Mutable child elements with the given local name.
    pub fn children_named_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut Element> + 'a {
        self.elements_mut().filter(move |el| el.is(local))
    }

    /// First descendant (depth-first, self excluded) with the given local name.
    pub fn find(&self, local: &str) -> Option<&Element> {
        for el in self.elements() {
            if el.is(local) {
                return Some(el);
            }
            if let Some(found) = el.find(local) {
                return Some(found);
            }
        }
        None
    }

    /// Drop every child element whose local name is in `locals`.
    pub fn remove_children(&mut self, locals: &[&str]) {
        self.children.retain(|node| match node {
            Node::Element(el) => !locals.contains(&el.local_name()),
            _ => true,
        });
    }

    /// Insert `child` before the first existing child whose local name is in
    /// `successors`, or append it. Keeps schema sequence order intact.
    pub fn insert_ordered(&mut self, child: Element, successors: &[&str]) -> &mut Element {
        let position = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(el) if successors.contains(&el.local_name())))
            .unwrap_or(self.children.len());

        self.children.insert(position, Node::Element(child));
        match &mut self.children[position] {
            Node::Element(el) => el,
            _ => unreachable!("just inserted an element"),
        }
    }

    /// First child with the given local name, inserted in schema order
    /// (see [`Element::insert_ordered`]) when missing.
    pub fn ensure_child(&mut self, local: &str, successors: &[&str]) -> &mut Element {
        let existing = self
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(el) if el.is(local)));

        match existing {
            Some(position) => match &mut self.children[position] {
                Node::Element(el) => el,
                _ => unreachable!("position points at an element"),
            },
            None => {
                let name = self.qualified(local);
                self.insert_ordered(Element::new(name), successors)
            }
        }
    }

    /// Concatenated character data of direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    fn write<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            return write_event(writer, Event::Empty(start));
        }

        write_event(writer, Event::Start(start))?;
        for node in &self.children {
            match node {
                Node::Element(el) => el.write(writer)?,
                Node::Text(text) => write_event(writer, Event::Text(BytesText::new(text)))?,
                Node::Raw(event) => write_event(writer, event.clone())?,
            }
        }
        write_event(writer, Event::End(BytesEnd::new(self.name.as_str())))
    }
}

/// A parsed XML part.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    /// Declaration and anything else before the root element.
    prolog: Vec<Event<'static>>,
    pub root: Element,
}

impl XmlDocument {
    /// Parse a complete document. Any syntax error aborts the parse.
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(false);

        let mut prolog = Vec::new();
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::XmlError(format!(
                    "Parse error at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(ref e) => stack.push(Element::from_start(e)?),
                Event::Empty(ref e) => {
                    let element = Element::from_start(e)?;
                    attach(&mut stack, &mut root, Node::Element(element))?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("Unbalanced end tag".to_string()))?;
                    attach(&mut stack, &mut root, Node::Element(element))?;
                }
                Event::Text(ref e) => {
                    // Whitespace between the prolog and the root is not kept
                    if stack.is_empty() {
                        continue;
                    }
                    let text = e
                        .unescape()
                        .map_err(|e| Error::XmlError(format!("Bad text content: {}", e)))?;
                    attach(&mut stack, &mut root, Node::Text(text.into_owned()))?;
                }
                Event::Eof => break,
                other => {
                    if stack.is_empty() {
                        if root.is_none() {
                            prolog.push(other.into_owned());
                        }
                    } else {
                        attach(&mut stack, &mut root, Node::Raw(other.into_owned()))?;
                    }
                }
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError(format!(
                "Unexpected end of document inside <{}>",
                stack.last().map(|el| el.name.as_str()).unwrap_or_default()
            )));
        }

        let root = root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))?;
        Ok(Self { prolog, root })
    }

    /// Serialize back to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());

        for (i, event) in self.prolog.iter().enumerate() {
            write_event(&mut writer, event.clone())?;
            // Office writes a line break after the declaration
            if i == 0 && matches!(event, Event::Decl(_)) {
                write_event(&mut writer, Event::Text(BytesText::from_escaped("\r\n")))?;
            }
        }
        self.root.write(&mut writer)?;

        Ok(writer.into_inner())
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, node: Node) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(node);
            Ok(())
        }
        None => match node {
            Node::Element(el) if root.is_none() => {
                *root = Some(el);
                Ok(())
            }
            Node::Element(el) => Err(Error::XmlError(format!(
                "Second root element <{}>",
                el.name
            ))),
            _ => Ok(()),
        },
    }
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::XmlError(format!("Write error: {}", e)))
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &str) -> &str {
    match name.split_once(':') {
        Some((_, local)) => local,
        None => name,
    }
}
