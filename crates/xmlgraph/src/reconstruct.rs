//! Best-effort object reconstruction for the read path.
//!
//! The reader flattens a complex element into a [`Captured`] map of
//! attribute and element names to their text. A type then picks a way to
//! build itself from that map through [`Reconstruction`]:
//!
//! 1. a constructor whose parameter names equal the captured names
//!    (compared case-insensitively); parameters declared optional may be
//!    missing,
//! 2. otherwise the first static factory matching the same way, whose
//!    result is returned as is,
//! 3. otherwise a [`XmlGraphError::Reconstruction`] error.
//!
//! After a constructor has run, every setter whose name was captured is
//! applied to the new instance.
//!
//! `#[derive(XmlType)]` generates all of this; hand-written impls look like:
//!
//! ```rust
//! use helios_xmlgraph::{Captured, FromXml, Reconstruction, Result};
//! # use helios_xmlgraph::reflect::{NonGenericTypeInfoCell, TypeInfo, Typed};
//! # struct Point { x: i32, y: i32 }
//! # impl Typed for Point {
//! #     fn type_info() -> &'static TypeInfo {
//! #         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
//! #         CELL.get_or_init(|| TypeInfo::complex::<Self>("Point", Vec::new()))
//! #     }
//! # }
//!
//! impl FromXml for Point {
//!     fn reconstruct(captured: &Captured) -> Result<Self> {
//!         Reconstruction::new()
//!             .constructor("new", &["x", "y"], |c| {
//!                 Ok(Point { x: c.take("x")?, y: c.take("y")? })
//!             })
//!             .reconstruct(captured)
//!     }
//! }
//! ```

use crate::converter::ConverterChain;
use crate::error::{ConversionError, Result, XmlGraphError};
use crate::reflect::Typed;
use crate::xml::reader::ScalarTokens;
use std::any::Any;
use std::sync::Arc;

/// Read-side construction hooks.
///
/// Which hook the reader calls depends on the [`TypeKind`](crate::reflect::TypeKind)
/// of the requested type. Hooks a type does not support keep their default,
/// which reports a typed error.
pub trait FromXml: Typed + Sized {
    /// Parses a simple value from its invariant text form.
    fn from_xml_text(text: &str) -> std::result::Result<Self, ConversionError> {
        Err(ConversionError::new::<Self>(text, "type has no text form"))
    }

    /// Builds a collection from item texts in document order.
    fn from_xml_items(items: Vec<String>) -> Result<Self> {
        let _ = items;
        Err(XmlGraphError::unsupported::<Self>("type is not a collection"))
    }

    /// Builds a map from key/value texts in document order.
    fn from_xml_entries(entries: Vec<(String, String)>) -> Result<Self> {
        let _ = entries;
        Err(XmlGraphError::unsupported::<Self>("type is not a dictionary"))
    }

    /// Builds a complex value from captured names.
    fn reconstruct(captured: &Captured) -> Result<Self> {
        Err(XmlGraphError::Reconstruction {
            type_name: std::any::type_name::<Self>(),
            captured: captured.names().map(str::to_string).collect(),
        })
    }

    /// Takes the value a reading converter produced for this type's
    /// descriptor. Hands the value back when it is of another type.
    fn from_converted(value: Box<dyn Any>) -> std::result::Result<Self, Box<dyn Any>> {
        value.downcast::<Self>().map(|value| *value)
    }
}

/// Names and texts captured from an element and its descendants.
///
/// Names compare case-insensitively. Inserting a name again replaces its
/// value and keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    entries: Vec<(String, String)>,
    text: Option<(String, String)>,
    converters: Option<Arc<ConverterChain>>,
}

impl Captured {
    /// Creates an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty capture whose values are read through `converters`
    /// where one matches.
    pub(crate) fn with_converters(converters: Arc<ConverterChain>) -> Self {
        Self {
            entries: Vec::new(),
            text: None,
            converters: Some(converters),
        }
    }

    /// Records `value` under `name`; the last write wins.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Records the character data of the element itself, written as
    /// `<element>text</element>`. It is not one of the captured names.
    pub fn set_text(&mut self, element: impl Into<String>, text: impl Into<String>) {
        self.text = Some((element.into(), text.into()));
    }

    /// Returns the element's own character data.
    pub fn text(&self) -> Option<&str> {
        self.text.as_ref().map(|(_, text)| text.as_str())
    }

    /// Converts the element's own character data to `V`, like [`Captured::take`].
    pub fn take_text<V: FromXml>(&self) -> Result<V> {
        let (element, text) = self.text.as_ref().ok_or_else(|| XmlGraphError::Conversion {
            name: "#text".to_string(),
            source: ConversionError::new::<V>("", "element has no character data"),
        })?;
        self.convert(element, text)
    }

    /// Returns the text captured under `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|index| self.entries[index].1.as_str())
    }

    /// Returns true if `name` was captured.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Captured names in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if neither names nor character data were captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.text.is_none()
    }

    /// Converts the text captured under `name` to `V`.
    ///
    /// A reading converter registered for `V` gets the value as a
    /// `<name>text</name>` element; a converter producing anything but `V`
    /// is an [`XmlGraphError::UnsupportedDeserialization`]. Otherwise the
    /// text is parsed with [`FromXml::from_xml_text`]. Fails with
    /// [`XmlGraphError::Conversion`] naming `name` when the text is missing
    /// or does not parse.
    pub fn take<V: FromXml>(&self, name: &str) -> Result<V> {
        let text = self.get(name).ok_or_else(|| XmlGraphError::Conversion {
            name: name.to_string(),
            source: ConversionError::new::<V>("", "value was not captured"),
        })?;
        self.convert(name, text)
    }

    fn convert<V: FromXml>(&self, name: &str, text: &str) -> Result<V> {
        if let Some(converter) = self
            .converters
            .as_deref()
            .and_then(|chain| chain.first_reader(V::type_info()))
        {
            let value = converter.read(&mut ScalarTokens::new(name, text))?;
            return V::from_converted(value).map_err(|_| {
                XmlGraphError::unsupported::<V>(format!(
                    "converter for `{}` produced a value of another type for `{}`",
                    V::type_info().type_path(),
                    name
                ))
            });
        }

        V::from_xml_text(text).map_err(|source| XmlGraphError::Conversion {
            name: name.to_string(),
            source,
        })
    }

    /// Returns true if `params` and the captured names are the same set.
    pub fn matches(&self, params: &[&str]) -> bool {
        self.matches_with(params, &[])
    }

    /// Returns true if every name in `required` was captured and every
    /// captured name is in `required` or `optional`.
    pub fn matches_with(&self, required: &[&str], optional: &[&str]) -> bool {
        required.iter().all(|param| self.contains(param))
            && self.names().all(|name| {
                required
                    .iter()
                    .chain(optional)
                    .any(|param| eq_ignore_case(param, name))
            })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| eq_ignore_case(existing, name))
    }
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

impl FromIterator<(String, String)> for Captured {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut captured = Captured::new();
        for (name, value) in iter {
            captured.insert(name, value);
        }
        captured
    }
}

type BuildFn<T> = Box<dyn Fn(&Captured) -> Result<T>>;
type SetFn<T> = Box<dyn Fn(&mut T, &Captured) -> Result<()>>;

struct Candidate<T> {
    name: &'static str,
    params: &'static [&'static str],
    optional: &'static [&'static str],
    build: BuildFn<T>,
}

impl<T> Candidate<T> {
    fn accepts(&self, captured: &Captured) -> bool {
        captured.matches_with(self.params, self.optional)
    }
}

struct Setter<T> {
    /// `None` for the element's own character data.
    name: Option<&'static str>,
    apply: SetFn<T>,
}

impl<T> Setter<T> {
    fn applies(&self, captured: &Captured) -> bool {
        match self.name {
            Some(name) => captured.contains(name),
            None => captured.text().is_some(),
        }
    }
}

/// Candidate constructors, factories and setters for one type.
pub struct Reconstruction<T> {
    constructors: Vec<Candidate<T>>,
    factories: Vec<Candidate<T>>,
    setters: Vec<Setter<T>>,
}

impl<T> Default for Reconstruction<T> {
    fn default() -> Self {
        Self {
            constructors: Vec::new(),
            factories: Vec::new(),
            setters: Vec::new(),
        }
    }
}

impl<T> Reconstruction<T> {
    /// Creates an empty candidate set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a constructor taking the captured values named in `params`.
    pub fn constructor(
        self,
        name: &'static str,
        params: &'static [&'static str],
        build: impl Fn(&Captured) -> Result<T> + 'static,
    ) -> Self {
        self.constructor_with_optional(name, params, &[], build)
    }

    /// Adds a constructor taking the values named in `params` and, when
    /// captured, those named in `optional`.
    pub fn constructor_with_optional(
        mut self,
        name: &'static str,
        params: &'static [&'static str],
        optional: &'static [&'static str],
        build: impl Fn(&Captured) -> Result<T> + 'static,
    ) -> Self {
        self.constructors.push(Candidate {
            name,
            params,
            optional,
            build: Box::new(build),
        });
        self
    }

    /// Adds a static factory taking the captured values named in `params`.
    pub fn factory(
        mut self,
        name: &'static str,
        params: &'static [&'static str],
        build: impl Fn(&Captured) -> Result<T> + 'static,
    ) -> Self {
        self.factories.push(Candidate {
            name,
            params,
            optional: &[],
            build: Box::new(build),
        });
        self
    }

    /// Adds a setter applied after a constructor when `name` was captured.
    pub fn setter(
        mut self,
        name: &'static str,
        apply: impl Fn(&mut T, &Captured) -> Result<()> + 'static,
    ) -> Self {
        self.setters.push(Setter {
            name: Some(name),
            apply: Box::new(apply),
        });
        self
    }

    /// Adds a setter applied after a constructor when the element had
    /// character data of its own.
    pub fn text_setter(
        mut self,
        apply: impl Fn(&mut T, &Captured) -> Result<()> + 'static,
    ) -> Self {
        self.setters.push(Setter {
            name: None,
            apply: Box::new(apply),
        });
        self
    }

    /// Builds a value from `captured` with the first matching candidate.
    pub fn reconstruct(&self, captured: &Captured) -> Result<T> {
        let type_name = std::any::type_name::<T>();

        if let Some(candidate) = self.constructors.iter().find(|c| c.accepts(captured)) {
            tracing::trace!(type_name, constructor = candidate.name, "constructor matches captured names");
            let mut value = (candidate.build)(captured)?;
            for setter in self.setters.iter().filter(|s| s.applies(captured)) {
                tracing::trace!(type_name, setter = setter.name.unwrap_or("#text"), "applying setter");
                (setter.apply)(&mut value, captured)?;
            }
            return Ok(value);
        }

        if let Some(candidate) = self.factories.iter().find(|c| c.accepts(captured)) {
            tracing::trace!(type_name, factory = candidate.name, "factory matches captured names");
            return (candidate.build)(captured);
        }

        let captured: Vec<String> = captured.names().map(str::to_string).collect();
        tracing::warn!(type_name, ?captured, "no suitable constructor or factory");
        Err(XmlGraphError::Reconstruction {
            type_name,
            captured,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
        y: i32,
        label: String,
    }

    fn candidates() -> Reconstruction<Point> {
        Reconstruction::new()
            .constructor("new", &["x", "y"], |c| {
                Ok(Point {
                    x: c.take("x")?,
                    y: c.take("y")?,
                    label: String::new(),
                })
            })
            .factory("origin", &["label"], |c| {
                Ok(Point {
                    x: 0,
                    y: 0,
                    label: c.take("label")?,
                })
            })
            .setter("label", |p, c| {
                p.label = c.take("label")?;
                Ok(())
            })
    }

    fn captured(pairs: &[(&str, &str)]) -> Captured {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_captured_is_case_insensitive_and_last_write_wins() {
        let mut c = Captured::new();
        c.insert("Name", "a");
        c.insert("name", "b");
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("NAME"), Some("b"));
        assert_eq!(c.names().collect::<Vec<_>>(), vec!["Name"]);
    }

    #[test]
    fn test_matches_requires_equal_sets() {
        let c = captured(&[("X", "1"), ("y", "2")]);
        assert!(c.matches(&["x", "Y"]));
        assert!(!c.matches(&["x"]));
        assert!(!c.matches(&["x", "y", "z"]));
    }

    #[test]
    fn test_optional_params() {
        let c = captured(&[("x", "1")]);
        assert!(c.matches_with(&["x"], &["y"]));
        assert!(!c.matches_with(&["x", "y"], &[]));
        assert!(!captured(&[("x", "1"), ("z", "2")]).matches_with(&["x"], &["y"]));
    }

    #[test]
    fn test_constructor_match() {
        let point = candidates().reconstruct(&captured(&[("x", "1"), ("y", "2")])).unwrap();
        assert_eq!(
            point,
            Point {
                x: 1,
                y: 2,
                label: String::new()
            }
        );
    }

    #[test]
    fn test_factory_fallback() {
        let point = candidates().reconstruct(&captured(&[("label", "o")])).unwrap();
        assert_eq!(point.label, "o");
        assert_eq!((point.x, point.y), (0, 0));
    }

    #[test]
    fn test_no_candidate() {
        let err = candidates()
            .reconstruct(&captured(&[("x", "1"), ("z", "3")]))
            .unwrap_err();
        match err {
            XmlGraphError::Reconstruction { captured, .. } => {
                assert_eq!(captured, vec!["x".to_string(), "z".to_string()])
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_conversion_error_names_member() {
        let err = candidates()
            .reconstruct(&captured(&[("x", "one"), ("y", "2")]))
            .unwrap_err();
        match err {
            XmlGraphError::Conversion { name, source } => {
                assert_eq!(name, "x");
                assert_eq!(source.target, "i32");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    fn with_reader(value: fn() -> Box<dyn Any>) -> Captured {
        let mut chain = ConverterChain::new();
        chain.push(
            crate::converter::ConverterDescriptor::new(|info| info.is::<i32>())
                .with_read(move |_| Ok(value())),
        );
        let mut c = Captured::with_converters(Arc::new(chain));
        c.insert("x", "seven");
        c
    }

    #[test]
    fn test_take_through_converter() {
        let c = with_reader(|| Box::new(7i32) as Box<dyn Any>);
        assert_eq!(c.take::<i32>("x").unwrap(), 7);
        assert_eq!(c.take::<Option<i32>>("x").unwrap(), Some(7));
        assert_eq!(*c.take::<Box<i32>>("x").unwrap(), 7);
    }

    #[test]
    fn test_take_rejects_converter_of_another_type() {
        let c = with_reader(|| Box::new("seven".to_string()) as Box<dyn Any>);
        let err = c.take::<i32>("x").unwrap_err();
        assert!(err.is_unsupported(), "{err:?}");
    }
}
