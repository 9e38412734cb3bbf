//! XML serialization: root emission and the default writer.
//!
//! [`XmlSerializer::write_root`] builds the hierarchy of a value once,
//! resolves the root name and writes the root element around the body. The
//! body walks the hierarchy:
//!
//! - children hinted as attributes come first, the rest keep declaration
//!   order; ignored members, null values and empty collections are skipped;
//! - a registered converter for a child's type writes the whole child;
//! - complex children with members become nested elements;
//! - everything else is a leaf, written as an attribute, an element or
//!   character data according to its naming hint.
//!
//! List items become `Item` elements; dictionary entries become `Item`
//! elements carrying the key in a `name` attribute. A bare type value at the
//! root is written as text without any element.
//!
//! Any failure is reported as one [`XmlGraphError::MalformedDocument`]
//! carrying the member path where the walk stopped.

use crate::config::XmlConfig;
use crate::converter::ConverterChain;
use crate::error::{Result, XmlGraphError};
use crate::graph::XmlGraph;
use crate::hierarchy::{Hierarchy, NodeId, WalkGuard};
use crate::name::{resolve, NamingHint, QualifiedName};
use crate::reflect::{Reflect, ReflectRef};
use crate::xml::utils::{item_name, needs_cdata, ITEM_ELEMENT, KEY_ATTRIBUTE};
use crate::xml::writer::{QuickXmlWriter, XmlWrite};
use std::io::Write;

/// Serialize a value to an XML string with default settings.
///
/// # Examples
///
/// ```rust
/// use helios_xmlgraph::xml::to_xml_string;
///
/// let xml = to_xml_string(&vec![1, 2, 3])?;
/// assert_eq!(
///     xml,
///     r#"<?xml version="1.0" encoding="UTF-8"?><Vec><Item>1</Item><Item>2</Item><Item>3</Item></Vec>"#
/// );
/// # Ok::<(), helios_xmlgraph::XmlGraphError>(())
/// ```
pub fn to_xml_string<T: Reflect>(value: &T) -> Result<String> {
    XmlGraph::new().serialize_to_string(value)
}

/// Serialize a value to an XML byte vector with default settings.
pub fn to_xml_vec<T: Reflect>(value: &T) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    to_xml_writer(value, &mut buffer)?;
    Ok(buffer)
}

/// Serialize a value to an XML writer with default settings.
pub fn to_xml_writer<T, W>(value: &T, writer: W) -> Result<()>
where
    T: Reflect,
    W: Write,
{
    XmlGraph::new().serialize_to_writer(value, writer)
}

/// Creates the structured writer configured by `config`.
pub(crate) fn writer_for<W: Write>(sink: W, config: &XmlConfig) -> QuickXmlWriter<W> {
    match config.indent {
        Some(width) => QuickXmlWriter::with_indent(sink, width),
        None => QuickXmlWriter::new(sink),
    }
}

/// Writes whole documents for object graphs.
pub struct XmlSerializer<'c> {
    converters: &'c ConverterChain,
    config: &'c XmlConfig,
}

impl<'c> XmlSerializer<'c> {
    /// Creates a serializer using `converters` before the default writer.
    pub fn new(converters: &'c ConverterChain, config: &'c XmlConfig) -> Self {
        Self { converters, config }
    }

    /// Writes `value` as a complete document.
    ///
    /// The root element is named `root_override` when given, otherwise by
    /// the usual name resolution.
    pub fn write_root(
        &self,
        writer: &mut dyn XmlWrite,
        value: &dyn Reflect,
        root_override: Option<&QualifiedName>,
    ) -> Result<()> {
        let mut walk = Walk::new(self.converters, self.config.max_depth);
        let result = self.emit(writer, value, root_override, &mut walk, |writer, hierarchy, walk| {
            walk.body(writer, hierarchy, NodeId::ROOT)
        });
        result.map_err(|source| malformed(source, value, root_override, &walk.path))
    }

    /// Writes `value` as a complete document, with `tree_writer` producing
    /// the content of the root element.
    ///
    /// The hierarchy is built once and handed to `tree_writer` after the
    /// root start tag has been written, so it may still add attributes.
    /// [`XmlSerializer::write_body`] is the default content.
    pub fn write_root_with<F>(
        &self,
        writer: &mut dyn XmlWrite,
        value: &dyn Reflect,
        root_override: Option<&QualifiedName>,
        tree_writer: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut dyn XmlWrite, &Hierarchy<'_>) -> Result<()>,
    {
        let mut walk = Walk::new(self.converters, self.config.max_depth);
        let result = self.emit(writer, value, root_override, &mut walk, |writer, hierarchy, _| {
            tree_writer(writer, hierarchy)
        });
        result.map_err(|source| malformed(source, value, root_override, &walk.path))
    }

    /// Writes the content of the root element of `hierarchy` with the
    /// default rules.
    pub fn write_body(&self, writer: &mut dyn XmlWrite, hierarchy: &Hierarchy<'_>) -> Result<()> {
        let mut walk = Walk::new(self.converters, self.config.max_depth);
        walk.body(writer, hierarchy, NodeId::ROOT)
    }

    fn emit<'v, F>(
        &self,
        writer: &mut dyn XmlWrite,
        value: &'v dyn Reflect,
        root_override: Option<&QualifiedName>,
        walk: &mut Walk<'_>,
        body: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut dyn XmlWrite, &Hierarchy<'v>, &mut Walk<'_>) -> Result<()>,
    {
        let hierarchy = Hierarchy::build_guarded(value, &mut walk.guard)?;
        let root = hierarchy.root();
        let name = resolve(root, root_override);
        walk.path.push(name.local_name().to_string());
        tracing::debug!(
            root_type = root.type_info().type_path(),
            root_name = %name,
            "writing document"
        );

        if let Some(instance) = root.instance() {
            if root.type_info().is_type() {
                walk.value(writer, instance)?;
                return writer.flush();
            }

            if let Some(converter) = self.converters.first_writer(root.type_info()) {
                tracing::trace!(type_path = root.type_info().type_path(), "converter writes root");
                if self.config.xml_declaration {
                    writer.declaration()?;
                }
                converter.write(writer, instance, &name)?;
                return writer.flush();
            }
        }

        if self.config.xml_declaration {
            writer.declaration()?;
        }
        writer.start_element(&name)?;
        if !root.is_null() {
            body(writer, &hierarchy, walk)?;
        }
        writer.end_element()?;
        writer.flush()
    }
}

fn malformed(
    source: XmlGraphError,
    value: &dyn Reflect,
    root_override: Option<&QualifiedName>,
    path: &[String],
) -> XmlGraphError {
    if source.is_malformed() {
        return source;
    }
    let path = match &source {
        XmlGraphError::Cycle { path: at, .. } | XmlGraphError::DepthExceeded { path: at, .. }
            if path.is_empty() =>
        {
            at.clone()
        }
        _ => path.join("."),
    };
    XmlGraphError::MalformedDocument {
        root_type: value.reflect_type_info().type_path(),
        path,
        context: match root_override {
            Some(name) => format!("root override: {}", name),
            None => "root override: none".to_string(),
        },
        source: Box::new(source),
    }
}

/// State of one default-writer walk.
struct Walk<'c> {
    converters: &'c ConverterChain,
    guard: WalkGuard,
    path: Vec<String>,
}

impl<'c> Walk<'c> {
    fn new(converters: &'c ConverterChain, max_depth: usize) -> Self {
        Self {
            converters,
            guard: WalkGuard::new(max_depth),
            path: Vec::new(),
        }
    }

    fn body(&mut self, writer: &mut dyn XmlWrite, hierarchy: &Hierarchy<'_>, id: NodeId) -> Result<()> {
        if hierarchy.node(id).children().is_empty() {
            let node = hierarchy.node(id);
            let name = resolve(node, None);
            self.leaf(writer, hierarchy, id, &name)
        } else {
            self.children(writer, hierarchy, id)
        }
    }

    fn children(&mut self, writer: &mut dyn XmlWrite, hierarchy: &Hierarchy<'_>, id: NodeId) -> Result<()> {
        let mut children = hierarchy.node(id).children().to_vec();
        children.sort_by_key(|child| !hierarchy.node(*child).hint().is_attribute());

        for child in children {
            let node = hierarchy.node(child);
            if node.is_ignored() || node.is_empty_collection() {
                continue;
            }
            let Some(instance) = node.instance() else {
                continue;
            };

            let name = resolve(node, None);
            self.path
                .push(node.member().map_or_else(|| name.local_name().to_string(), |m| m.name().to_string()));

            if let Some(converter) = self.converters.first_writer(node.type_info()) {
                tracing::trace!(
                    type_path = node.type_info().type_path(),
                    member = %name,
                    "converter writes member"
                );
                converter.write(writer, instance, &name)?;
            } else if node.type_info().is_complex() && !node.children().is_empty() {
                writer.start_element(&name)?;
                self.body(writer, hierarchy, child)?;
                writer.end_element()?;
            } else {
                self.leaf(writer, hierarchy, child, &name)?;
            }

            self.path.pop();
        }
        Ok(())
    }

    fn leaf(
        &mut self,
        writer: &mut dyn XmlWrite,
        hierarchy: &Hierarchy<'_>,
        id: NodeId,
        name: &QualifiedName,
    ) -> Result<()> {
        let node = hierarchy.node(id);
        let Some(value) = node.instance() else {
            return Ok(());
        };

        let hint = match node.hint() {
            NamingHint::None | NamingHint::Ignore if node.type_info().is_type() => NamingHint::Text,
            // Unhinted leaves default to elements.
            NamingHint::None | NamingHint::Ignore => NamingHint::Element(Default::default()),
            hint => hint,
        };

        match hint {
            NamingHint::Attribute(_) => writer.attribute(name, &scalar_text(value)?),
            NamingHint::Text => self.value(writer, value),
            _ if node.member().is_some() => {
                writer.start_element(name)?;
                self.value(writer, value)?;
                writer.end_element()
            }
            _ => self.value(writer, value),
        }
    }

    /// Writes the content of `value`.
    fn value(&mut self, writer: &mut dyn XmlWrite, value: &dyn Reflect) -> Result<()> {
        match value.reflect_ref() {
            ReflectRef::Null | ReflectRef::Struct(_) => Ok(()),
            ReflectRef::Pointer(inner) => self.value(writer, inner),
            ReflectRef::Value(text) => write_text(writer, &text),
            ReflectRef::Type(info) => writer.text(info.type_path()),
            ReflectRef::List(list) => {
                self.guard.enter(value, || self.path.join("."))?;
                for (index, item) in list.iter().enumerate() {
                    self.path.push(item_name(index));
                    self.item(writer, item, None)?;
                    self.path.pop();
                }
                self.guard.leave();
                Ok(())
            }
            ReflectRef::Map(map) => {
                self.guard.enter(value, || self.path.join("."))?;
                for (index, (key, item)) in map.iter().enumerate() {
                    self.path.push(item_name(index));
                    let key = scalar_text(key)?;
                    self.item(writer, item, Some(&key))?;
                    self.path.pop();
                }
                self.guard.leave();
                Ok(())
            }
        }
    }

    /// Writes one `Item` element. Converters apply to list items only.
    fn item(&mut self, writer: &mut dyn XmlWrite, item: &dyn Reflect, key: Option<&str>) -> Result<()> {
        let item_element = QualifiedName::new(ITEM_ELEMENT);
        let hierarchy = Hierarchy::build_guarded(item, &mut self.guard)?;
        let root = hierarchy.root();

        if key.is_none()
            && let Some(instance) = root.instance()
            && let Some(converter) = self.converters.first_writer(root.type_info())
        {
            tracing::trace!(type_path = root.type_info().type_path(), "converter writes item");
            return converter.write(writer, instance, &item_element);
        }

        writer.start_element(&item_element)?;
        if let Some(key) = key {
            writer.attribute(&QualifiedName::new(KEY_ATTRIBUTE), key)?;
        }
        if let Some(instance) = root.instance() {
            if root.children().is_empty() {
                self.value(writer, instance)?;
            } else {
                self.children(writer, &hierarchy, NodeId::ROOT)?;
            }
        }
        writer.end_element()
    }
}

/// Text of a value written as an attribute or dictionary key.
fn scalar_text(value: &dyn Reflect) -> Result<String> {
    match value.reflect_ref() {
        ReflectRef::Value(text) => Ok(text.into_owned()),
        ReflectRef::Type(info) => Ok(info.type_path().to_string()),
        ReflectRef::Pointer(inner) => scalar_text(inner),
        ReflectRef::Null => Ok(String::new()),
        _ => Err(XmlGraphError::Custom(format!(
            "`{}` has no scalar text form",
            value.reflect_type_info().type_path()
        ))),
    }
}

/// Writes character data, as CDATA when escaping would not round-trip.
fn write_text(writer: &mut dyn XmlWrite, text: &str) -> Result<()> {
    if needs_cdata(text) {
        writer.cdata(text)
    } else {
        writer.text(text)
    }
}
