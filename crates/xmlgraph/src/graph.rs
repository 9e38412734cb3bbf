//! The engine facade.
//!
//! [`XmlGraph`] bundles an [`XmlConfig`] with a shared [`ConverterChain`]
//! and exposes whole-document operations. It is cheap to clone and can be
//! shared between threads.
//!
//! ```rust
//! use helios_xmlgraph::{XmlConfig, XmlGraph};
//!
//! let graph = XmlGraph::new().with_config(XmlConfig::new().with_xml_declaration(false));
//! let xml = graph.serialize_to_string_as(&vec![1u8, 2], "numbers")?;
//! assert_eq!(xml, "<numbers><Item>1</Item><Item>2</Item></numbers>");
//!
//! let numbers: Vec<u8> = graph.deserialize_str(&xml)?;
//! assert_eq!(numbers, vec![1, 2]);
//! # Ok::<(), helios_xmlgraph::XmlGraphError>(())
//! ```

use crate::config::XmlConfig;
use crate::converter::ConverterChain;
use crate::error::{Result, XmlGraphError};
use crate::name::QualifiedName;
use crate::reconstruct::FromXml;
use crate::reflect::Reflect;
use crate::xml::de::XmlDeserializer;
use crate::xml::ser::{XmlSerializer, writer_for};
use std::io::{BufRead, Write};
use std::sync::Arc;

/// XML object graph engine.
#[derive(Debug, Clone, Default)]
pub struct XmlGraph {
    config: XmlConfig,
    converters: Arc<ConverterChain>,
}

impl XmlGraph {
    /// Creates an engine with the default configuration and no converters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, config: XmlConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the converter chain.
    pub fn with_converters(mut self, converters: impl Into<Arc<ConverterChain>>) -> Self {
        self.converters = converters.into();
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &XmlConfig {
        &self.config
    }

    /// The converter chain consulted before the default writer and reader.
    pub fn converters(&self) -> &Arc<ConverterChain> {
        &self.converters
    }

    /// A serializer bound to this engine's converters and configuration.
    pub fn serializer(&self) -> XmlSerializer<'_> {
        XmlSerializer::new(&self.converters, &self.config)
    }

    /// A deserializer bound to this engine's converters.
    pub fn deserializer(&self) -> XmlDeserializer {
        XmlDeserializer::new(Arc::clone(&self.converters))
    }

    /// Serializes `value` to a string.
    pub fn serialize_to_string(&self, value: &dyn Reflect) -> Result<String> {
        self.to_string_with_root(value, None)
    }

    /// Serializes `value` to a string with the root element named `root`.
    pub fn serialize_to_string_as(
        &self,
        value: &dyn Reflect,
        root: impl Into<QualifiedName>,
    ) -> Result<String> {
        self.to_string_with_root(value, Some(&root.into()))
    }

    /// Serializes `value` into `sink`.
    pub fn serialize_to_writer<W: Write>(&self, value: &dyn Reflect, sink: W) -> Result<()> {
        self.check_config()?;
        let mut writer = writer_for(sink, &self.config);
        self.serializer().write_root(&mut writer, value, None)
    }

    /// Deserializes a `T` from a string.
    pub fn deserialize_str<T: FromXml>(&self, xml: &str) -> Result<T> {
        self.deserialize_reader(xml.as_bytes())
    }

    /// Deserializes a `T` from buffered input.
    pub fn deserialize_reader<R: BufRead, T: FromXml>(&self, input: R) -> Result<T> {
        self.deserializer().read_from(input)
    }

    fn to_string_with_root(
        &self,
        value: &dyn Reflect,
        root: Option<&QualifiedName>,
    ) -> Result<String> {
        self.check_config()?;
        let mut writer = writer_for(Vec::new(), &self.config);
        self.serializer().write_root(&mut writer, value, root)?;
        String::from_utf8(writer.into_inner()).map_err(|e| XmlGraphError::Custom(e.to_string()))
    }

    fn check_config(&self) -> Result<()> {
        self.config
            .validate()
            .map_err(|errors| XmlGraphError::Config(errors.join("; ")))
    }
}
