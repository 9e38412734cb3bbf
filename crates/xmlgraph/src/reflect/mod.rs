//! Runtime type descriptors and value access.
//!
//! Rust has no runtime reflection, so the engine walks values through the
//! traits defined here:
//!
//! - [`Typed`]: static access to a cached [`TypeInfo`].
//! - [`Reflect`]: dynamic access to a value's descriptor and structure.
//! - [`Struct`], [`List`], [`Map`]: member, item and entry access.
//!
//! `#[derive(XmlType)]` implements them for named-field structs and unit
//! enums; this module implements them for primitives, strings, decimals,
//! UUIDs, `chrono` date/time types, smart pointers and the standard
//! collections.
//!
//! Pointer-like wrappers (`Option`, `Box`, `Rc`, `Arc`, `OnceCell`) are
//! transparent: their descriptor is the wrapped type's and their value is
//! exposed through [`ReflectRef::Pointer`] or [`ReflectRef::Null`].

mod cell;
mod impls;
mod info;
mod wrappers;

pub use cell::{GenericTypeInfoCell, NonGenericTypeInfoCell};
pub use info::{MemberInfo, TypeInfo, TypeKind};
pub use wrappers::{Named, TypeRef};

use crate::name::QualifiedName;
use std::any::{Any, TypeId};
use std::borrow::Cow;

/// Static access to a type's descriptor.
pub trait Typed: 'static {
    /// Returns the cached descriptor of this type.
    fn type_info() -> &'static TypeInfo;
}

/// Dynamic access to a value.
pub trait Reflect: Any {
    /// Descriptor of the value's type.
    fn reflect_type_info(&self) -> &'static TypeInfo;

    /// Structural view of the value.
    fn reflect_ref(&self) -> ReflectRef<'_>;

    /// Upcast for downcasting to the concrete type.
    fn as_any(&self) -> &dyn Any;

    /// An explicit name the value wants to be written under.
    fn name_override(&self) -> Option<&QualifiedName> {
        None
    }
}

/// Structural view returned by [`Reflect::reflect_ref`].
pub enum ReflectRef<'a> {
    /// No value (`None`, an empty `OnceCell`).
    Null,
    /// A transparent wrapper around another value.
    Pointer(&'a dyn Reflect),
    /// A simple value in its invariant text form.
    Value(Cow<'a, str>),
    /// A bare type value.
    Type(&'static TypeInfo),
    /// A value with named members.
    Struct(&'a dyn Struct),
    /// A sequence.
    List(&'a dyn List),
    /// A key/value map.
    Map(&'a dyn Map),
}

/// Member access for complex values.
///
/// Indices follow [`TypeInfo::members`]. Ignored members return `None`.
pub trait Struct: Reflect {
    /// Returns the value of the member at `index`.
    fn field_at(&self, index: usize) -> Option<&dyn Reflect>;

    /// Number of declared members, ignored ones included.
    fn field_len(&self) -> usize;
}

/// Item access for sequences.
pub trait List: Reflect {
    /// Number of items.
    fn len(&self) -> usize;

    /// Returns true when there are no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the items in order.
    fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_>;
}

/// Entry access for maps.
pub trait Map: Reflect {
    /// Number of entries.
    fn len(&self) -> usize;

    /// Returns true when there are no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the entries in the map's own order.
    fn iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_>;
}

/// A value after transparent wrappers have been removed.
#[derive(Clone, Copy)]
pub struct Resolved<'a> {
    /// The innermost value, `None` when a wrapper held nothing.
    pub value: Option<&'a dyn Reflect>,
    /// The first name override found while unwrapping.
    pub name_override: Option<&'a QualifiedName>,
}

/// Follows [`ReflectRef::Pointer`] links down to the wrapped value.
pub fn resolve_value(value: &dyn Reflect) -> Resolved<'_> {
    let mut current = value;
    let mut name_override = None;
    loop {
        if name_override.is_none() {
            name_override = current.name_override();
        }
        match current.reflect_ref() {
            ReflectRef::Pointer(inner) => current = inner,
            ReflectRef::Null => {
                return Resolved {
                    value: None,
                    name_override,
                };
            }
            _ => {
                return Resolved {
                    value: Some(current),
                    name_override,
                };
            }
        }
    }
}

/// Identity of a value on the current walk branch: address and concrete type.
///
/// A struct and its first field can share an address, so the type is part
/// of the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Identity(usize, TypeId);

impl Identity {
    pub(crate) fn of(value: &dyn Reflect) -> Self {
        let address = value as *const dyn Reflect as *const () as usize;
        Identity(address, Any::type_id(value.as_any()))
    }
}

impl dyn Reflect {
    /// Downcasts to a concrete type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Returns true if the concrete type is `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_resolve_value_unwraps_pointers() {
        let value: Option<Box<Rc<i32>>> = Some(Box::new(Rc::new(5)));
        let resolved = resolve_value(&value);
        let inner = resolved.value.expect("value");
        assert_eq!(inner.downcast_ref::<i32>(), Some(&5));
    }

    #[test]
    fn test_resolve_value_null() {
        let value: Option<String> = None;
        assert!(resolve_value(&value).value.is_none());
    }

    #[test]
    fn test_resolve_value_keeps_name_override() {
        let value = Named::new(QualifiedName::new("total"), Some(3u8));
        let resolved = resolve_value(&value);
        assert_eq!(resolved.name_override.map(|n| n.local_name()), Some("total"));
        assert_eq!(resolved.value.and_then(|v| v.downcast_ref::<u8>()), Some(&3));
    }

    #[test]
    fn test_identity_distinguishes_types_at_same_address() {
        struct Outer {
            inner: u32,
        }
        impl Reflect for Outer {
            fn reflect_type_info(&self) -> &'static TypeInfo {
                TypeInfo::ignored()
            }
            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::Pointer(&self.inner)
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
        }
        let outer = Outer { inner: 1 };
        assert_ne!(Identity::of(&outer), Identity::of(&outer.inner));
        assert_eq!(Identity::of(&outer), Identity::of(&outer));
    }
}
