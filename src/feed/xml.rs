//! Minimal namespace-aware XML element tree
//!
//! Feeds are small, so the whole document is built into memory from quick-xml
//! events and then queried by `(namespace, local name)`.
//!
//! Input is raw bytes. The character encoding comes from the BOM or the
//! `<?xml encoding="..."?>` declaration and defaults to UTF-8. Elements may nest
//! at most [`MAX_DEPTH`] levels.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{Decoder, NsReader};
use tracing::trace;

use crate::error::{ResolverError, Result};

pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Maximum element nesting accepted in a document
pub const MAX_DEPTH: usize = 256;

/// Namespace selector for element lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ns<'a> {
    /// No namespace at all (plain RSS 2.0 elements)
    None,
    /// No namespace, or the Atom namespace
    Atom,
    /// Exactly this namespace URI
    Uri(&'a str),
}

impl Ns<'_> {
    fn matches(&self, namespace: Option<&str>) -> bool {
        match self {
            Ns::None => namespace.is_none(),
            Ns::Atom => namespace.map_or(true, |ns| ns == ATOM_NS),
            Ns::Uri(uri) => namespace == Some(*uri),
        }
    }
}

/// Parsed XML element
#[derive(Debug, Clone, Default)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub name: String,
    /// Attributes by local name, in document order
    pub attributes: Vec<(String, String)>,
    /// Concatenated text and CDATA content (trimmed)
    pub text: String,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn is(&self, ns: Ns<'_>, name: &str) -> bool {
        self.name == name && ns.matches(self.namespace.as_deref())
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn children_named<'a>(
        &'a self,
        ns: Ns<'a>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.is(ns, name))
    }

    pub fn child(&self, ns: Ns<'_>, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.is(ns, name))
    }

    /// Text of the first matching child, if it has any
    pub fn child_text(&self, ns: Ns<'_>, name: &str) -> Option<&str> {
        self.child(ns, name)
            .map(|child| child.text.as_str())
            .filter(|text| !text.is_empty())
    }

    /// All matching descendants in document order
    pub fn descendants_named<'a>(&'a self, ns: Ns<'_>, name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        let mut pending: Vec<&XmlElement> = self.children.iter().rev().collect();
        while let Some(element) = pending.pop() {
            if element.is(ns, name) {
                found.push(element);
            }
            pending.extend(element.children.iter().rev());
        }
        found
    }
}

/// Parse a complete document and return its root element
pub fn parse_document(xml: impl AsRef<[u8]>) -> Result<XmlElement> {
    let mut reader = NsReader::from_reader(xml.as_ref());
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        buf.clear();
        let position = reader.buffer_position();
        let (namespace, event) = match reader.read_resolved_event_into(&mut buf) {
            Ok((ns, event)) => (namespace_uri(&ns), event),
            Err(e) => {
                return Err(ResolverError::feed_parse_error_with_source(
                    format!("Malformed XML near byte {}", position),
                    e.to_string(),
                ))
            }
        };
        let decoder = reader.decoder();

        match event {
            Event::Start(e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ResolverError::feed_parse_error(format!(
                        "Elements nested deeper than {} levels",
                        MAX_DEPTH
                    )));
                }
                stack.push(element_from(namespace, &e, decoder)?);
            }
            Event::Empty(e) => {
                let element = element_from(namespace, &e, decoder)?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ResolverError::feed_parse_error("Unexpected closing tag"))?;
                attach(element, &mut stack, &mut root)?;
            }
            Event::Text(t) => {
                if let Some(current) = stack.last_mut() {
                    let text = t.unescape().map_err(|e| {
                        ResolverError::feed_parse_error_with_source("Invalid text content", e.to_string())
                    })?;
                    current.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(current) = stack.last_mut() {
                    let text = decoder.decode(&c).map_err(|e| {
                        ResolverError::feed_parse_error_with_source("Invalid CDATA content", e.to_string())
                    })?;
                    current.text.push_str(text.trim());
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ResolverError::feed_parse_error(format!(
            "Document ended inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| ResolverError::feed_parse_error("Document has no root element"))
}

fn namespace_uri(resolved: &ResolveResult<'_>) -> Option<String> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        _ => None,
    }
}

fn element_from(namespace: Option<String>, start: &BytesStart<'_>, decoder: Decoder) -> Result<XmlElement> {
    let name = decoder
        .decode(start.local_name().as_ref())
        .map(Cow::into_owned)
        .unwrap_or_else(|_| String::from_utf8_lossy(start.local_name().as_ref()).into_owned());

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            ResolverError::feed_parse_error_with_source(format!("Invalid attribute on <{}>", name), e.to_string())
        })?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .decode_and_unescape_value(decoder)
            .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&attr.value).into_owned()));
        attributes.push((key, value.into_owned()));
    }

    Ok(XmlElement {
        namespace,
        name,
        attributes,
        text: String::new(),
        children: Vec::new(),
    })
}

fn attach(element: XmlElement, stack: &mut [XmlElement], root: &mut Option<XmlElement>) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => {
            trace!("Parsed root element <{}>", element.name);
            *root = Some(element);
        }
        None => {
            return Err(ResolverError::feed_parse_error(format!(
                "Unexpected second root element <{}>",
                element.name
            )))
        }
    }
    Ok(())
}
