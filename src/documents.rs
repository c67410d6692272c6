//! XML document handling
//!
//! This module builds a namespace-resolved element tree from XML text. Every
//! element remembers the line and column of its start tag so validation
//! diagnostics can point back into the original text.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{NamespaceContext, QName};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An attribute with its resolved name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Resolved attribute name
    pub qname: QName,
    /// Name as written in the document (`xsi:type`, `id`, ...)
    pub raw_name: String,
    /// Unescaped value
    pub value: String,
}

/// XML Element in the document tree
#[derive(Debug, Clone)]
pub struct Element {
    /// Element qualified name
    pub qname: QName,
    /// Element attributes, in document order (namespace declarations excluded)
    pub attributes: Vec<Attribute>,
    /// Concatenated character data (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespaces in scope for this element
    pub namespaces: NamespaceContext,
    /// 1-based line of the start tag
    pub line: usize,
    /// 1-based column of the start tag
    pub column: usize,
}

impl Element {
    /// Create a new element
    pub fn new(qname: QName) -> Self {
        Self {
            qname,
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
            line: 1,
            column: 1,
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        &self.qname.local_name
    }

    /// Get the namespace of the element
    pub fn namespace(&self) -> Option<&str> {
        self.qname.namespace.as_deref()
    }

    /// Get an unqualified attribute value by local name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.qname.namespace.is_none() && a.qname.local_name == name)
            .map(|a| a.value.as_str())
    }

    /// Get an attribute value by qualified name
    pub fn get_attribute_qname(&self, qname: &QName) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| &a.qname == qname)
            .map(|a| a.value.as_str())
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append character data
    pub fn append_text(&mut self, text: &str) {
        match self.text {
            Some(ref mut existing) => existing.push_str(text),
            None => self.text = Some(text.to_string()),
        }
    }

    /// Text content, empty when the element has none
    pub fn text_content(&self) -> &str {
        self.text.as_deref().unwrap_or("")
    }

    /// Whether the element carries character data other than whitespace
    pub fn has_significant_text(&self) -> bool {
        self.text.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Iterate over child elements in a given namespace
    pub fn children_in<'a>(&'a self, namespace: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.qname.is_in(namespace))
    }
}

/// XML Document representation
#[derive(Debug, Clone)]
pub struct Document {
    /// Root element of the document
    pub root: Element,
}

impl Document {
    /// Parse an XML document from a string with default limits
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::from_string_with_limits(xml, &Limits::default())
    }

    /// Parse an XML document from a string
    pub fn from_string_with_limits(xml: &str, limits: &Limits) -> Result<Self> {
        limits.check_xml_size(xml.len())?;

        let positions = LineIndex::new(xml);
        let mut reader = Reader::from_str(xml);

        let mut root: Option<Element> = None;
        let mut element_stack: Vec<Element> = Vec::new();

        loop {
            let offset = reader.buffer_position();
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    ensure_single_root(&root, &element_stack, &positions, offset)?;
                    let element =
                        Self::parse_element(&e, &element_stack, &positions, offset, xml, limits)?;
                    element_stack.push(element);
                    limits.check_xml_depth(element_stack.len())?;
                }
                Ok(Event::End(_)) => match element_stack.pop() {
                    Some(current) => match element_stack.last_mut() {
                        Some(parent) => parent.add_child(current),
                        None => root = Some(current),
                    },
                    None => {
                        return Err(positions.error("Unexpected end tag", offset));
                    }
                },
                Ok(Event::Empty(e)) => {
                    ensure_single_root(&root, &element_stack, &positions, offset)?;
                    let element =
                        Self::parse_element(&e, &element_stack, &positions, offset, xml, limits)?;
                    limits.check_xml_depth(element_stack.len() + 1)?;
                    match element_stack.last_mut() {
                        Some(parent) => parent.add_child(element),
                        None => root = Some(element),
                    }
                }
                Ok(Event::Text(e)) => {
                    let text = e.unescape().map_err(|err| {
                        positions.error(&format!("Failed to unescape text: {}", err), offset)
                    })?;
                    match element_stack.last_mut() {
                        Some(current) => current.append_text(&text),
                        None if text.trim().is_empty() => {}
                        None => {
                            let message = if root.is_some() {
                                "Extra content at the end of the document"
                            } else {
                                "Start tag expected, '<' not found"
                            };
                            return Err(positions.error(message, offset));
                        }
                    }
                }
                Ok(Event::CData(e)) => {
                    let text = std::str::from_utf8(&e).map_err(|err| {
                        positions.error(&format!("Invalid CDATA section: {}", err), offset)
                    })?;
                    match element_stack.last_mut() {
                        Some(current) => current.append_text(text),
                        None => {
                            return Err(positions.error("CDATA section outside of the root element", offset))
                        }
                    }
                }
                Ok(Event::DocType(_)) => {
                    return Err(positions.error("DOCTYPE declarations are not supported", offset));
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(positions.error(&e.to_string(), reader.buffer_position()));
                }
                _ => {} // Ignore other events (comments, processing instructions, declaration)
            }
        }

        if let Some(open) = element_stack.last() {
            return Err(Error::Xml(format!(
                "Premature end of data: element '{}' opened at line {}, column {} is not closed",
                open.qname, open.line, open.column
            )));
        }

        match root {
            Some(root) => Ok(Document { root }),
            None => Err(Error::Xml("Document is empty".to_string())),
        }
    }

    /// Parse element from a start tag, resolving names against the parent scope
    fn parse_element(
        start: &BytesStart,
        stack: &[Element],
        positions: &LineIndex,
        offset: usize,
        xml: &str,
        limits: &Limits,
    ) -> Result<Element> {
        let tag_offset = tag_start(xml, offset);
        let (line, column) = positions.position(tag_offset);
        let located = |message: String| positions.error(&message, tag_offset);

        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| located(format!("Invalid element name: {}", e)))?
            .to_string();

        let mut namespaces = stack
            .last()
            .map(|parent| parent.namespaces.clone())
            .unwrap_or_default();

        // Namespace declarations apply to the element's own name and attributes
        let mut raw_attributes = Vec::new();
        for attr_result in start.attributes() {
            let attr = attr_result.map_err(|e| located(format!("Failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| located(format!("Invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| located(format!("Failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                namespaces.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                namespaces.add_prefix(prefix, attr_value);
            } else {
                raw_attributes.push((attr_name, attr_value));
            }
        }
        limits.check_attributes(raw_attributes.len())?;

        let qname = namespaces.resolve(&name).map_err(|_| {
            located(format!("Namespace prefix on element '{}' is not defined", name))
        })?;

        let mut attributes = Vec::with_capacity(raw_attributes.len());
        for (raw_name, value) in raw_attributes {
            let attr_qname = namespaces.resolve_attribute(&raw_name).map_err(|_| {
                located(format!("Namespace prefix on attribute '{}' is not defined", raw_name))
            })?;
            attributes.push(Attribute {
                qname: attr_qname,
                raw_name,
                value,
            });
        }

        let mut element = Element::new(qname);
        element.attributes = attributes;
        element.namespaces = namespaces;
        element.line = line;
        element.column = column;
        Ok(element)
    }
}

fn ensure_single_root(
    root: &Option<Element>,
    stack: &[Element],
    positions: &LineIndex,
    offset: usize,
) -> Result<()> {
    if root.is_some() && stack.is_empty() {
        Err(positions.error("Extra content at the end of the document", offset))
    } else {
        Ok(())
    }
}

/// The reader may already have consumed the `<` of the tag it is about to report
fn tag_start(xml: &str, offset: usize) -> usize {
    if xml.as_bytes().get(offset) == Some(&b'<') {
        offset
    } else {
        offset.saturating_sub(1)
    }
}

/// Byte offset to line/column mapping
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    /// Index the line starts of a text
    pub fn new(text: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { text, line_starts }
    }

    /// 1-based (line, column) of a byte offset; columns count characters
    pub fn position(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let line_start = self.line_starts[line - 1];
        let column = match self.text.get(line_start..offset) {
            Some(prefix) => prefix.chars().count(),
            None => offset - line_start,
        };
        (line, column + 1)
    }

    fn error(&self, message: &str, offset: usize) -> Error {
        let (line, column) = self.position(offset);
        Error::Xml(format!("{} (line: {}, column: {})", message, line, column))
    }
}
