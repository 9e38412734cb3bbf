//! XML serialization and deserialization of object graphs.
//!
//! ## Architecture
//!
//! - **Writing**: [`ser::XmlSerializer`] builds the [`Hierarchy`](crate::Hierarchy)
//!   of a value, resolves the root name and drives an [`XmlWrite`]
//!   implementation. [`QuickXmlWriter`] writes `quick-xml` events to any
//!   `std::io::Write`.
//!
//! - **Reading**: [`TokenReader`] turns `quick-xml` events into a flat
//!   [`Token`] stream; [`de::XmlDeserializer`] consumes it according to the
//!   kind of the requested type.
//!
//! ## Mapping
//!
//! | Value | XML |
//! |-------|-----|
//! | `42i32` | `<i32>42</i32>` |
//! | `vec![1, 2]` | `<Vec><Item>1</Item><Item>2</Item></Vec>` |
//! | `{"a": 1}` | `<HashMap><Item name="a">1</Item></HashMap>` |
//! | struct with `#[xml(attribute)] id` and `name` | `<Person id="7"><name>Ann</name></Person>` |
//! | `TypeRef::of::<u8>()` | `u8` |
//!
//! Text containing markup characters, or consisting only of whitespace, is
//! written as CDATA.

pub mod de;
pub mod reader;
pub mod ser;
pub(crate) mod utils;
pub mod writer;

pub use de::{XmlDeserializer, from_xml_reader, from_xml_slice, from_xml_str};
pub use reader::{Token, TokenKind, TokenReader, XmlRead, read_text};
pub use ser::{XmlSerializer, to_xml_string, to_xml_vec, to_xml_writer};
pub use writer::{QuickXmlWriter, XmlWrite};
