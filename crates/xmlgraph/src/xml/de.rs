//! XML deserialization: the default reader.
//!
//! The requested type's [`TypeKind`] decides how the token stream is read:
//!
//! - **Simple**: all character data of the document, parsed with
//!   [`FromXml::from_xml_text`].
//! - **Enumerable**: the text of every `Item` element below the root, in
//!   document order.
//! - **Dictionary**: `Item` elements below the root, keyed by their `name`
//!   attribute.
//! - **Complex**: every attribute and the joined text of each member element
//!   is captured by local name, the root's own text separately, and handed
//!   to [`FromXml::reconstruct`]. Members holding child elements (nested
//!   objects or non-empty collections) are not readable.
//! - **Type**: not readable.
//!
//! Collection items and dictionary values must be scalar; an item with
//! child elements makes the document unsupported. A converter registered for
//! the requested type reads the whole document instead.

use crate::converter::ConverterChain;
use crate::error::{Result, XmlGraphError};
use crate::graph::XmlGraph;
use crate::reconstruct::{Captured, FromXml};
use crate::reflect::TypeKind;
use crate::xml::reader::{TokenKind, TokenReader, XmlRead};
use crate::xml::utils::{ITEM_ELEMENT, KEY_ATTRIBUTE};
use std::io::BufRead;
use std::sync::Arc;

/// Deserialize a value from an XML string with default settings.
///
/// # Examples
///
/// ```rust
/// use helios_xmlgraph::xml::from_xml_str;
///
/// let values: Vec<i32> = from_xml_str("<Vec><Item>1</Item><Item>2</Item></Vec>")?;
/// assert_eq!(values, vec![1, 2]);
/// # Ok::<(), helios_xmlgraph::XmlGraphError>(())
/// ```
pub fn from_xml_str<T: FromXml>(xml: &str) -> Result<T> {
    from_xml_slice(xml.as_bytes())
}

/// Deserialize a value from XML bytes with default settings.
pub fn from_xml_slice<T: FromXml>(xml: &[u8]) -> Result<T> {
    XmlGraph::new().deserialize_reader(xml)
}

/// Deserialize a value from an XML reader with default settings.
pub fn from_xml_reader<R: BufRead, T: FromXml>(reader: R) -> Result<T> {
    XmlGraph::new().deserialize_reader(reader)
}

/// Reads whole documents into values.
pub struct XmlDeserializer {
    converters: Arc<ConverterChain>,
}

impl XmlDeserializer {
    /// Creates a deserializer consulting `converters` for the requested type
    /// and for captured member values.
    pub fn new(converters: Arc<ConverterChain>) -> Self {
        Self { converters }
    }

    /// Reads a `T` from buffered input.
    pub fn read_from<R: BufRead, T: FromXml>(&self, input: R) -> Result<T> {
        self.read_root(&mut TokenReader::new(input))
    }

    /// Reads a `T` from a token stream positioned before the root element.
    pub fn read_root<T: FromXml>(&self, reader: &mut dyn XmlRead) -> Result<T> {
        let info = T::type_info();
        tracing::debug!(type_path = info.type_path(), kind = ?info.kind(), "reading document");

        if let Some(converter) = self.converters.first_reader(info) {
            tracing::trace!(type_path = info.type_path(), "converter reads root");
            let value = converter.read(reader)?;
            return T::from_converted(value).map_err(|_| {
                XmlGraphError::unsupported::<T>(format!(
                    "converter for `{}` produced a value of another type",
                    info.type_path()
                ))
            });
        }

        match info.kind() {
            TypeKind::Simple => read_simple(reader),
            TypeKind::Type => Err(XmlGraphError::unsupported::<T>("type values cannot be read")),
            TypeKind::Enumerable { .. } => T::from_xml_items(read_items::<T>(reader)?),
            TypeKind::Dictionary { .. } => T::from_xml_entries(read_entries::<T>(reader)?),
            TypeKind::Complex => {
                let captured = self.capture::<T>(reader)?;
                T::reconstruct(&captured)
            }
        }
    }

    /// Flattens the document into names and texts.
    ///
    /// Attributes are captured when their element starts; the character data
    /// of a member element is joined and captured under its name when the
    /// element ends, and empty members are captured as empty text. The
    /// root's own character data becomes [`Captured::text`] whatever the
    /// root is called. Members are the elements directly below the root; an
    /// element inside a member makes the document unsupported.
    fn capture<T: FromXml>(&self, reader: &mut dyn XmlRead) -> Result<Captured> {
        struct Open {
            name: String,
            text: String,
            has_text: bool,
            has_children: bool,
        }

        let mut captured = Captured::with_converters(Arc::clone(&self.converters));
        let mut open: Vec<Open> = Vec::new();
        let mut saw_root = false;

        while let Some(token) = reader.next_token()? {
            match token.kind {
                TokenKind::StartElement => {
                    if let Some(member) = open.get(1) {
                        return Err(XmlGraphError::unsupported::<T>(format!(
                            "member <{}> contains the element <{}>; nested members cannot be read",
                            member.name, token.name
                        )));
                    }
                    saw_root = true;
                    if let Some(parent) = open.last_mut() {
                        parent.has_children = true;
                    }
                    for (name, value) in token.attributes {
                        captured.insert(name, value);
                    }
                    open.push(Open {
                        name: token.name,
                        text: String::new(),
                        has_text: false,
                        has_children: false,
                    });
                }
                TokenKind::Text | TokenKind::CData => {
                    if let Some(current) = open.last_mut() {
                        current.text.push_str(&token.value);
                        current.has_text = true;
                    }
                }
                TokenKind::EndElement => {
                    let Some(closed) = open.pop() else { continue };
                    if open.is_empty() {
                        if closed.has_text {
                            captured.set_text(closed.name, closed.text);
                        }
                    } else if closed.has_text || !closed.has_children {
                        captured.insert(closed.name, closed.text);
                    }
                }
            }
        }

        if !saw_root {
            return Err(XmlGraphError::unsupported::<T>("document has no root element"));
        }
        Ok(captured)
    }
}

fn read_simple<T: FromXml>(reader: &mut dyn XmlRead) -> Result<T> {
    let mut root = None;
    let mut text = String::new();
    while let Some(token) = reader.next_token()? {
        match token.kind {
            TokenKind::StartElement if root.is_none() => root = Some(token.name),
            TokenKind::Text | TokenKind::CData => text.push_str(&token.value),
            _ => {}
        }
    }
    let Some(root) = root else {
        return Err(XmlGraphError::unsupported::<T>("document has no root element"));
    };
    T::from_xml_text(&text).map_err(|source| XmlGraphError::UnsupportedDeserialization {
        type_name: std::any::type_name::<T>(),
        reason: format!("content of <{}> is not a valid value", root),
        source: Some(Box::new(XmlGraphError::Conversion { name: root, source })),
    })
}

/// One `Item` element directly below the root.
struct ItemText {
    key: Option<String>,
    text: String,
}

fn read_item_elements<T>(reader: &mut dyn XmlRead, keyed: bool) -> Result<Vec<ItemText>> {
    let mut items = Vec::new();
    let mut current: Option<ItemText> = None;
    let mut saw_root = false;

    while let Some(token) = reader.next_token()? {
        match (token.kind, token.depth) {
            (TokenKind::StartElement, 0) => saw_root = true,
            (TokenKind::StartElement, 1) if token.name == ITEM_ELEMENT => {
                let key = token.attribute(KEY_ATTRIBUTE).map(str::to_string);
                if keyed && key.is_none() {
                    return Err(XmlGraphError::unsupported::<T>(format!(
                        "dictionary item #{} has no `{}` attribute",
                        items.len(),
                        KEY_ATTRIBUTE
                    )));
                }
                current = Some(ItemText {
                    key,
                    text: String::new(),
                });
            }
            (TokenKind::StartElement, depth) if depth >= 2 && current.is_some() => {
                return Err(XmlGraphError::unsupported::<T>(format!(
                    "item #{} contains the element <{}>; items must be scalar",
                    items.len(),
                    token.name
                )));
            }
            (TokenKind::Text | TokenKind::CData, 1) => {
                if let Some(item) = current.as_mut() {
                    item.text.push_str(&token.value);
                }
            }
            (TokenKind::EndElement, 1) => {
                if let Some(item) = current.take() {
                    items.push(item);
                }
            }
            _ => {}
        }
    }

    if !saw_root {
        return Err(XmlGraphError::unsupported::<T>("document has no root element"));
    }
    Ok(items)
}

fn read_items<T>(reader: &mut dyn XmlRead) -> Result<Vec<String>> {
    Ok(read_item_elements::<T>(reader, false)?
        .into_iter()
        .map(|item| item.text)
        .collect())
}

fn read_entries<T>(reader: &mut dyn XmlRead) -> Result<Vec<(String, String)>> {
    Ok(read_item_elements::<T>(reader, true)?
        .into_iter()
        .map(|item| (item.key.unwrap_or_default(), item.text))
        .collect())
}
