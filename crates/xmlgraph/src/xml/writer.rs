//! Structured XML output.
//!
//! [`XmlWrite`] is the element-level writer the engine and converters talk
//! to. [`QuickXmlWriter`] implements it over `quick-xml`, keeping the start
//! tag of the innermost element open until content arrives so attributes
//! can still be added, and declaring namespaces the first time a prefix is
//! used in a scope.

use crate::error::{Result, XmlGraphError};
use crate::name::QualifiedName;
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

/// Element-level XML writer.
pub trait XmlWrite {
    /// Writes the XML declaration. Must come before the root element.
    fn declaration(&mut self) -> Result<()>;

    /// Opens an element.
    fn start_element(&mut self, name: &QualifiedName) -> Result<()>;

    /// Adds an attribute to the element opened last. Fails once the element
    /// has content.
    fn attribute(&mut self, name: &QualifiedName, value: &str) -> Result<()>;

    /// Writes escaped character data.
    fn text(&mut self, text: &str) -> Result<()>;

    /// Writes a CDATA section.
    fn cdata(&mut self, text: &str) -> Result<()>;

    /// Closes the innermost open element.
    fn end_element(&mut self) -> Result<()>;

    /// Flushes buffered output to the underlying sink.
    fn flush(&mut self) -> Result<()>;

    /// Writes `<name>text</name>`.
    fn element(&mut self, name: &QualifiedName, text: &str) -> Result<()> {
        self.start_element(name)?;
        self.text(text)?;
        self.end_element()
    }
}

/// Namespace bindings declared on one open element.
struct Scope {
    qualified: String,
    bindings: Vec<(Option<String>, String)>,
}

/// [`XmlWrite`] implementation over a `quick-xml` [`Writer`].
pub struct QuickXmlWriter<W: Write> {
    writer: Writer<W>,
    pending: Option<BytesStart<'static>>,
    open: Vec<Scope>,
    generated_prefixes: usize,
}

impl<W: Write> QuickXmlWriter<W> {
    /// Creates a writer producing a single line.
    pub fn new(inner: W) -> Self {
        Self::from_writer(Writer::new(inner))
    }

    /// Creates a writer indenting nested elements by `width` spaces.
    pub fn with_indent(inner: W, width: usize) -> Self {
        Self::from_writer(Writer::new_with_indent(inner, b' ', width))
    }

    fn from_writer(writer: Writer<W>) -> Self {
        Self {
            writer,
            pending: None,
            open: Vec::new(),
            generated_prefixes: 0,
        }
    }

    /// Returns the underlying sink.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    /// Number of open elements.
    pub fn open_elements(&self) -> usize {
        self.open.len()
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.writer.write_event(Event::Start(start))?;
        }
        Ok(())
    }

    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.open
            .iter()
            .rev()
            .flat_map(|scope| scope.bindings.iter())
            .find(|(bound, _)| bound.as_deref() == prefix)
            .map(|(_, namespace)| namespace.as_str())
    }

    fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.open
            .iter()
            .rev()
            .flat_map(|scope| scope.bindings.iter())
            .find(|(prefix, bound)| prefix.is_some() && bound == namespace)
            .and_then(|(prefix, _)| prefix.as_deref())
    }

    /// Declares `prefix` for `namespace` on the innermost element unless the
    /// binding is already in scope.
    fn bind(&mut self, prefix: Option<&str>, namespace: &str) -> Result<()> {
        if self.lookup(prefix) == Some(namespace) {
            return Ok(());
        }
        let attribute = match prefix {
            Some(prefix) => format!("xmlns:{}", prefix),
            None => "xmlns".to_string(),
        };
        let (Some(start), Some(scope)) = (self.pending.as_mut(), self.open.last_mut()) else {
            return Err(XmlGraphError::Custom(format!(
                "cannot declare namespace `{}` outside an open start tag",
                namespace
            )));
        };
        start.push_attribute((attribute.as_str(), namespace));
        scope
            .bindings
            .push((prefix.map(str::to_string), namespace.to_string()));
        Ok(())
    }
}

impl<W: Write> XmlWrite for QuickXmlWriter<W> {
    fn declaration(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    fn start_element(&mut self, name: &QualifiedName) -> Result<()> {
        self.flush_pending()?;
        let qualified = name.qualified().into_owned();
        self.pending = Some(BytesStart::new(qualified.clone()));
        self.open.push(Scope {
            qualified,
            bindings: Vec::new(),
        });
        if let Some(namespace) = name.namespace() {
            self.bind(name.prefix().filter(|p| !p.is_empty()), namespace)?;
        }
        Ok(())
    }

    fn attribute(&mut self, name: &QualifiedName, value: &str) -> Result<()> {
        if self.pending.is_none() {
            return Err(XmlGraphError::Custom(format!(
                "attribute `{}` written after element content",
                name
            )));
        }

        let key = match name.namespace() {
            None => name.qualified().into_owned(),
            Some(namespace) => {
                let prefix = match name.prefix().filter(|p| !p.is_empty()) {
                    Some(prefix) => prefix.to_string(),
                    None => match self.prefix_for(namespace) {
                        Some(prefix) => prefix.to_string(),
                        None => {
                            self.generated_prefixes += 1;
                            format!("ns{}", self.generated_prefixes)
                        }
                    },
                };
                self.bind(Some(&prefix), namespace)?;
                format!("{}:{}", prefix, name.local_name())
            }
        };

        if let Some(start) = self.pending.as_mut() {
            start.push_attribute((key.as_str(), value));
        }
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        if !text.is_empty() {
            self.writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        Ok(())
    }

    fn cdata(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        // "]]>" cannot appear inside a section; split it across two.
        let mut rest = text;
        while let Some(index) = rest.find("]]>") {
            let (head, tail) = rest.split_at(index + 2);
            self.writer.write_event(Event::CData(BytesCData::new(head)))?;
            rest = tail;
        }
        self.writer.write_event(Event::CData(BytesCData::new(rest)))?;
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        let scope = self
            .open
            .pop()
            .ok_or_else(|| XmlGraphError::Custom("end_element without open element".to_string()))?;
        match self.pending.take() {
            Some(start) => self.writer.write_event(Event::Empty(start))?,
            None => self
                .writer
                .write_event(Event::End(BytesEnd::new(scope.qualified)))?,
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.flush_pending()?;
        self.writer.get_mut().flush()?;
        Ok(())
    }
}
