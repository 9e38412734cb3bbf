//! Value wrappers with special meaning to the writer.

use crate::name::QualifiedName;
use crate::reflect::{NonGenericTypeInfoCell, Reflect, ReflectRef, TypeInfo, Typed};
use std::any::Any;
use std::fmt;

/// A value that denotes a type.
///
/// Written as character data holding the type path. A `TypeRef` at the
/// root of a document is written without a surrounding element.
#[derive(Clone, Copy)]
pub struct TypeRef(&'static TypeInfo);

impl TypeRef {
    /// Refers to `T`.
    pub fn of<T: Typed>() -> Self {
        TypeRef(T::type_info())
    }

    /// The referenced descriptor.
    pub fn info(&self) -> &'static TypeInfo {
        self.0
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TypeRef").field(&self.0.type_path()).finish()
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.type_id() == other.0.type_id()
    }
}

impl Typed for TypeRef {
    fn type_info() -> &'static TypeInfo {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::type_value::<Self>("Type"))
    }
}

impl Reflect for TypeRef {
    fn reflect_type_info(&self) -> &'static TypeInfo {
        Self::type_info()
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Type(self.0)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A value carrying the name it must be written under.
///
/// The name takes precedence over member names and hints; only an explicit
/// caller override beats it.
#[derive(Debug, Clone, PartialEq)]
pub struct Named<T> {
    name: QualifiedName,
    value: T,
}

impl<T> Named<T> {
    /// Wraps `value` with `name`.
    pub fn new(name: impl Into<QualifiedName>, value: T) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// The carried name.
    pub fn name(&self) -> &QualifiedName {
        &self.name
    }

    /// The wrapped value.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Unwraps the value.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Typed> Typed for Named<T> {
    fn type_info() -> &'static TypeInfo {
        T::type_info()
    }
}

impl<T: Reflect + Typed> Reflect for Named<T> {
    fn reflect_type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Pointer(&self.value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn name_override(&self) -> Option<&QualifiedName> {
        Some(&self.name)
    }
}
