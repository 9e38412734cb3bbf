//! Derive macro for `helios-xmlgraph`.
//!
//! `#[derive(XmlType)]` implements the descriptor and value-access traits the
//! engine walks (`Typed`, `Reflect`, and `Struct` for structs) plus the
//! read-side `FromXml` hooks.
//!
//! Structs must have named fields; enums must have unit variants only and
//! are written as their variant name.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod expand;

/// Derives XML object graph support.
///
/// ## Container attributes
///
/// ```rust, ignore
/// #[derive(XmlType)]
/// #[xml(
///     root = "person",            // root element name
///     namespace = "urn:people",   // root element namespace
///     prefix = "p",               // root element prefix
///     rename = "Person",          // friendly type name
///     rename_all = "camelCase",   // member / variant name case
///     constructor(Person::new, name, id),
///     factory(Person::anonymous, id),
/// )]
/// struct Person { /* ... */ }
/// ```
///
/// `constructor` and `factory` name a function returning `Self` and the
/// captured names bound to its arguments in order.
///
/// ## Field attributes
///
/// - `attribute` or `attribute = "name"`: write as an attribute
/// - `element` or `element = "name"`: write as a child element
/// - `text`: write as character data of the owning element
/// - `ignore`: never written or read; filled with `Default` when reading
/// - `rename = ".."`, `namespace = ".."`, `prefix = ".."`
///
/// ## Variant attributes
///
/// - `rename = ".."`
///
/// ## Reading
///
/// Besides the declared constructors and factories, a memberwise
/// constructor is generated. Its parameters are the names members are
/// written under, sanitized the way the writer sanitizes them; `Option` and
/// collection members may be missing. A `text` member reads the root's own
/// character data whatever the root is called, and an argument naming it
/// in `constructor` or `factory` gets that text. Public fields get setters
/// applied after a constructor.
///
/// Only members written as attributes or as elements holding text read
/// back; a member element with children (a nested struct or a non-empty
/// collection) makes the document unsupported.
#[proc_macro_derive(XmlType, attributes(xml))]
pub fn derive_xml_type(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    expand::derive_xml_type(&ast)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
