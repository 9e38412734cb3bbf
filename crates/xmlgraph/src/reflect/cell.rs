//! Containers for static storage of type information.
//!
//! These are used to implement [`Typed`](crate::reflect::Typed).
//!
//! For non-generic types, [`NonGenericTypeInfoCell`] wraps a [`OnceLock`].
//!
//! For generic types the `static CELL` inside `type_info` is shared by every
//! instantiation, so [`GenericTypeInfoCell`] keys the stored descriptors by
//! [`TypeId`] behind a [`RwLock`]. Entries are leaked once and live for the
//! rest of the process.

use crate::reflect::TypeInfo;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Cache for the [`TypeInfo`] of a non-generic type.
///
/// ```ignore
/// impl Typed for Celsius {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
///         CELL.get_or_init(|| TypeInfo::simple::<Self>("Celsius"))
///     }
/// }
/// ```
pub struct NonGenericTypeInfoCell(OnceLock<TypeInfo>);

impl NonGenericTypeInfoCell {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored descriptor, building it with `f` on first use.
    #[inline]
    pub fn get_or_init<F>(&self, f: F) -> &TypeInfo
    where
        F: FnOnce() -> TypeInfo,
    {
        self.0.get_or_init(f)
    }
}

impl Default for NonGenericTypeInfoCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache for the [`TypeInfo`] of every instantiation of a generic type.
///
/// ```ignore
/// impl<T: Typed> Typed for Wrapper<T> {
///     fn type_info() -> &'static TypeInfo {
///         static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
///         CELL.get_or_insert::<Self>(|| TypeInfo::complex::<Self>("Wrapper", vec![]))
///     }
/// }
/// ```
pub struct GenericTypeInfoCell(OnceLock<RwLock<HashMap<TypeId, &'static TypeInfo>>>);

impl GenericTypeInfoCell {
    /// Creates an empty cell.
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the descriptor stored for `G`, building it with `f` on first use.
    ///
    /// `f` runs without the lock held, so it may ask for other descriptors
    /// stored in the same cell.
    pub fn get_or_insert<G: Any + ?Sized>(&self, f: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        let map = self.0.get_or_init(|| RwLock::new(HashMap::new()));
        let type_id = TypeId::of::<G>();

        if let Some(info) = map.read().get(&type_id).copied() {
            return info;
        }

        let built = f();
        *map.write()
            .entry(type_id)
            .or_insert_with(|| &*Box::leak(Box::new(built)))
    }
}

impl Default for GenericTypeInfoCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker<T>(std::marker::PhantomData<T>);

    fn info_for<T: 'static>() -> &'static TypeInfo {
        static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
        CELL.get_or_insert::<Marker<T>>(|| TypeInfo::complex::<Marker<T>>("Marker", Vec::new()))
    }

    #[test]
    fn test_generic_cell_separates_instantiations() {
        let a = info_for::<u8>();
        let b = info_for::<u16>();
        assert!(!std::ptr::eq(a, b));
        assert!(a.is::<Marker<u8>>());
        assert!(b.is::<Marker<u16>>());
        assert!(std::ptr::eq(a, info_for::<u8>()));
    }

    #[test]
    fn test_non_generic_cell_initializes_once() {
        static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
        let first = CELL.get_or_init(|| TypeInfo::simple::<u8>("u8"));
        let second = CELL.get_or_init(|| TypeInfo::simple::<u16>("u16"));
        assert!(std::ptr::eq(first, second));
        assert!(second.is::<u8>());
    }
}
