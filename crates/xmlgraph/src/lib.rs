///! # Helios XML Object Graph Serialization
///!
///! This crate writes arbitrary typed object graphs to XML and reads them back,
///! driven by type descriptors instead of per-type serialization code.
///!
///! ## Features
///!
///! - **Descriptor Driven**: Every serializable type implements [`reflect::Typed`]
///!   and [`reflect::Reflect`]. `#[derive(XmlType)]` generates both, plus the
///!   read-side [`FromXml`] hooks.
///! - **Naming Rules**: Element and attribute names come from explicit
///!   overrides, member names, naming hints and type names, in that order.
///! - **Converters**: A [`ConverterChain`] of predicate-selected converters
///!   replaces the default writer or reader for matching types.
///! - **Best-Effort Reading**: Complex values are rebuilt from captured names
///!   through matching constructors, factories and setters.
///!
///! ## Architecture
///!
///! - **Hierarchy Layer**: [`Hierarchy`] captures the member tree of a value
///!   once, with cycle and depth checks.
///! - **XML Layer**: [`xml::XmlSerializer`] walks the hierarchy and drives a
///!   `quick-xml` writer; [`xml::XmlDeserializer`] consumes a token stream.
///! - **Facade**: [`XmlGraph`] bundles configuration and converters.
///!
///! ## Examples
///!
///! ```ignore
///! use helios_xmlgraph::{XmlGraph, XmlType};
///!
///! #[derive(XmlType)]
///! struct Person {
///!     #[xml(attribute)]
///!     id: u32,
///!     name: String,
///! }
///!
///! let graph = XmlGraph::new();
///! let xml = graph.serialize_to_string(&Person { id: 7, name: "Ann".into() })?;
///! let person: Person = graph.deserialize_str(&xml)?;
///! ```

extern crate self as helios_xmlgraph;

pub mod config;
pub mod converter;
pub mod error;
pub mod graph;
pub mod hierarchy;
pub mod name;
pub mod reconstruct;
pub mod reflect;
pub mod xml;

// Re-export common types
pub use config::XmlConfig;
pub use converter::{ConverterChain, ConverterDescriptor, TypedConverter};
pub use error::{ConversionError, Result, XmlGraphError};
pub use graph::XmlGraph;
pub use hierarchy::{Hierarchy, Node, NodeId};
pub use name::{NameHint, NamingHint, QualifiedName};
pub use reconstruct::{Captured, FromXml, Reconstruction};
pub use reflect::{Named, TypeRef};

// Re-export XML functions at top level for convenience
pub use xml::{from_xml_reader, from_xml_slice, from_xml_str, to_xml_string, to_xml_vec, to_xml_writer};

#[cfg(feature = "derive")]
pub use helios_xmlgraph_macro::XmlType;
