//! Pluggable, type-specific converters.
//!
//! A [`ConverterChain`] is an ordered list of [`ConverterDescriptor`]s. Each
//! descriptor has a predicate over [`TypeInfo`] and optional read and write
//! functions. Lookups return the first descriptor whose predicate matches
//! and which supports the requested direction; no match means the default
//! writer or reader handles the value.
//!
//! A write function receives the resolved name and writes the complete
//! element for its value. A read function receives the token stream
//! positioned before the root element and returns the finished value.
//!
//! ```rust
//! use chrono::{DateTime, Utc};
//! use helios_xmlgraph::{ConverterChain, ConverterDescriptor};
//! use helios_xmlgraph::xml::read_text;
//!
//! let mut chain = ConverterChain::new();
//! chain.push(
//!     ConverterDescriptor::for_type::<DateTime<Utc>>()
//!         .writer(|w, value: &DateTime<Utc>, name| {
//!             w.start_element(name)?;
//!             w.text(&value.format("%Y%m%dT%H%M%SZ").to_string())?;
//!             w.end_element()
//!         })
//!         .reader(|r| {
//!             let text = read_text(r)?;
//!             chrono::NaiveDateTime::parse_from_str(&text, "%Y%m%dT%H%M%SZ")
//!                 .map(|dt| dt.and_utc())
//!                 .map_err(|e| e.to_string().into())
//!         }),
//! );
//! assert_eq!(chain.len(), 1);
//! ```

use crate::error::{Result, XmlGraphError};
use crate::name::QualifiedName;
use crate::reflect::{Reflect, TypeInfo, Typed};
use crate::xml::{XmlRead, XmlWrite};
use std::any::Any;
use std::fmt;

/// Predicate selecting the types a converter handles.
pub type Predicate = Box<dyn Fn(&TypeInfo) -> bool + Send + Sync>;

/// Reads a complete value from the token stream.
pub type ReadFn = Box<dyn Fn(&mut dyn XmlRead) -> Result<Box<dyn Any>> + Send + Sync>;

/// Writes a complete element for a value under the given name.
pub type WriteFn =
    Box<dyn Fn(&mut dyn XmlWrite, &dyn Reflect, &QualifiedName) -> Result<()> + Send + Sync>;

/// One converter: a type predicate plus optional read and write functions.
pub struct ConverterDescriptor {
    predicate: Predicate,
    read: Option<ReadFn>,
    write: Option<WriteFn>,
}

impl ConverterDescriptor {
    /// Creates a converter for types matching `predicate`, with no functions yet.
    pub fn new(predicate: impl Fn(&TypeInfo) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
            read: None,
            write: None,
        }
    }

    /// Creates a converter for exactly `T`.
    pub fn for_type<T: Typed>() -> TypedConverter<T> {
        TypedConverter {
            descriptor: Self::new(|info| info.is::<T>()),
            marker: std::marker::PhantomData,
        }
    }

    /// Sets the untyped read function.
    pub fn with_read(
        mut self,
        read: impl Fn(&mut dyn XmlRead) -> Result<Box<dyn Any>> + Send + Sync + 'static,
    ) -> Self {
        self.read = Some(Box::new(read));
        self
    }

    /// Sets the untyped write function.
    pub fn with_write(
        mut self,
        write: impl Fn(&mut dyn XmlWrite, &dyn Reflect, &QualifiedName) -> Result<()>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.write = Some(Box::new(write));
        self
    }

    /// Returns true if the converter applies to `info`.
    pub fn matches(&self, info: &TypeInfo) -> bool {
        (self.predicate)(info)
    }

    /// Returns true if a read function is present.
    pub fn can_read(&self) -> bool {
        self.read.is_some()
    }

    /// Returns true if a write function is present.
    pub fn can_write(&self) -> bool {
        self.write.is_some()
    }

    /// Writes `value` with this converter.
    pub fn write(
        &self,
        writer: &mut dyn XmlWrite,
        value: &dyn Reflect,
        name: &QualifiedName,
    ) -> Result<()> {
        match &self.write {
            Some(write) => write(writer, value, name),
            None => Err(XmlGraphError::Custom(
                "converter has no write function".to_string(),
            )),
        }
    }

    /// Reads a value with this converter.
    pub fn read(&self, reader: &mut dyn XmlRead) -> Result<Box<dyn Any>> {
        match &self.read {
            Some(read) => read(reader),
            None => Err(XmlGraphError::Custom(
                "converter has no read function".to_string(),
            )),
        }
    }
}

impl fmt::Debug for ConverterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterDescriptor")
            .field("can_read", &self.can_read())
            .field("can_write", &self.can_write())
            .finish()
    }
}

/// Builder for a converter bound to one concrete type.
///
/// The typed functions receive and return `T` directly; downcasting happens
/// inside the converter.
pub struct TypedConverter<T> {
    descriptor: ConverterDescriptor,
    marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Typed> TypedConverter<T> {
    /// Sets the write function.
    pub fn writer(
        mut self,
        write: impl Fn(&mut dyn XmlWrite, &T, &QualifiedName) -> Result<()> + Send + Sync + 'static,
    ) -> Self {
        self.descriptor = self.descriptor.with_write(move |writer, value, name| {
            let typed = value.downcast_ref::<T>().ok_or_else(|| {
                XmlGraphError::Custom(format!(
                    "converter for `{}` received a `{}`",
                    std::any::type_name::<T>(),
                    value.reflect_type_info().type_path()
                ))
            })?;
            write(writer, typed, name)
        });
        self
    }

    /// Sets the read function.
    pub fn reader(
        mut self,
        read: impl Fn(&mut dyn XmlRead) -> Result<T> + Send + Sync + 'static,
    ) -> Self {
        self.descriptor = self
            .descriptor
            .with_read(move |reader| read(reader).map(|value| Box::new(value) as Box<dyn Any>));
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> ConverterDescriptor {
        self.descriptor
    }
}

impl<T> From<TypedConverter<T>> for ConverterDescriptor {
    fn from(typed: TypedConverter<T>) -> Self {
        typed.descriptor
    }
}

/// Ordered converters; the first match wins.
#[derive(Debug, Default)]
pub struct ConverterChain {
    converters: Vec<ConverterDescriptor>,
}

impl ConverterChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a converter built from its parts.
    pub fn register(
        &mut self,
        predicate: impl Fn(&TypeInfo) -> bool + Send + Sync + 'static,
        read: Option<ReadFn>,
        write: Option<WriteFn>,
    ) -> &mut Self {
        self.converters.push(ConverterDescriptor {
            predicate: Box::new(predicate),
            read,
            write,
        });
        self
    }

    /// Appends a converter.
    pub fn push(&mut self, converter: impl Into<ConverterDescriptor>) -> &mut Self {
        self.converters.push(converter.into());
        self
    }

    /// First converter matching `info` that can write.
    pub fn first_writer(&self, info: &TypeInfo) -> Option<&ConverterDescriptor> {
        self.converters
            .iter()
            .find(|c| c.can_write() && c.matches(info))
    }

    /// First converter matching `info` that can read.
    pub fn first_reader(&self, info: &TypeInfo) -> Option<&ConverterDescriptor> {
        self.converters
            .iter()
            .find(|c| c.can_read() && c.matches(info))
    }

    /// Number of converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns true if the chain is empty.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}
