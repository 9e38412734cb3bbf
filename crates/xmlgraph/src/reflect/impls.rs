//! Descriptor and value-access implementations for standard and ecosystem types.

use crate::error::{ConversionError, Result, XmlGraphError};
use crate::reconstruct::{Captured, FromXml};
use crate::reflect::{
    GenericTypeInfoCell, List, Map, NonGenericTypeInfoCell, Reflect, ReflectRef, TypeInfo,
    TypeRef, Typed,
};
use crate::xml::utils::{bool_to_string, item_name};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use std::any::Any;
use std::borrow::Cow;
use std::cell::OnceCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Implements the simple-value traits for types with matching
/// `Display`/`FromStr` forms.
macro_rules! impl_simple_value {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn type_info() -> &'static TypeInfo {
                    static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                    CELL.get_or_init(|| TypeInfo::simple::<Self>($name))
                }
            }

            impl Reflect for $ty {
                fn reflect_type_info(&self) -> &'static TypeInfo {
                    Self::type_info()
                }

                fn reflect_ref(&self) -> ReflectRef<'_> {
                    ReflectRef::Value(Cow::Owned(self.to_string()))
                }

                fn as_any(&self) -> &dyn Any {
                    self
                }
            }

            impl FromXml for $ty {
                fn from_xml_text(text: &str) -> std::result::Result<Self, ConversionError> {
                    text.trim()
                        .parse::<Self>()
                        .map_err(|e| ConversionError::new::<Self>(text, e))
                }
            }
        )*
    };
}

impl_simple_value! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    u128 => "u128",
    usize => "usize",
    f32 => "f32",
    f64 => "f64",
    Decimal => "Decimal",
    Uuid => "Uuid",
    NaiveDate => "NaiveDate",
}

/// Implements the simple-value traits with explicit format and parse steps.
macro_rules! impl_formatted_value {
    ($ty:ty, $name:literal, |$v:ident| $format:expr, |$t:ident| $parse:expr) => {
        impl Typed for $ty {
            fn type_info() -> &'static TypeInfo {
                static CELL: NonGenericTypeInfoCell = NonGenericTypeInfoCell::new();
                CELL.get_or_init(|| TypeInfo::simple::<Self>($name))
            }
        }

        impl Reflect for $ty {
            fn reflect_type_info(&self) -> &'static TypeInfo {
                Self::type_info()
            }

            fn reflect_ref(&self) -> ReflectRef<'_> {
                let $v = self;
                ReflectRef::Value($format)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl FromXml for $ty {
            fn from_xml_text($t: &str) -> std::result::Result<Self, ConversionError> {
                $parse
            }
        }
    };
}

impl_formatted_value!(
    bool,
    "bool",
    |v| Cow::Borrowed(bool_to_string(*v)),
    |text| match text.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConversionError::new::<bool>(text, "expected true, false, 1 or 0")),
    }
);

impl_formatted_value!(
    char,
    "char",
    |v| Cow::Owned(v.to_string()),
    |text| {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(ConversionError::new::<char>(text, "expected exactly one character")),
        }
    }
);

impl_formatted_value!(
    String,
    "String",
    |v| Cow::Borrowed(v.as_str()),
    |text| Ok(text.to_string())
);

impl_formatted_value!(
    DateTime<Utc>,
    "DateTime",
    |v| Cow::Owned(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    |text| DateTime::parse_from_rfc3339(text.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ConversionError::new::<DateTime<Utc>>(text, e))
);

impl_formatted_value!(
    DateTime<FixedOffset>,
    "DateTime",
    |v| Cow::Owned(v.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    |text| DateTime::parse_from_rfc3339(text.trim())
        .map_err(|e| ConversionError::new::<DateTime<FixedOffset>>(text, e))
);

const NAIVE_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

impl_formatted_value!(
    NaiveDateTime,
    "NaiveDateTime",
    |v| Cow::Owned(v.format(NAIVE_DATE_TIME_FORMAT).to_string()),
    |text| NaiveDateTime::parse_from_str(text.trim(), NAIVE_DATE_TIME_FORMAT)
        .map_err(|e| ConversionError::new::<NaiveDateTime>(text, e))
);

// Type values are written but never read.
impl FromXml for TypeRef {}

/// Implements the traits for single-value wrappers. Their descriptor is the
/// wrapped type's and reading builds the inner value first.
macro_rules! impl_transparent {
    ($wrapper:ident, |$v:ident| $get:expr, |$inner:ident| $wrap:expr) => {
        impl<T: Typed> Typed for $wrapper<T> {
            fn type_info() -> &'static TypeInfo {
                T::type_info()
            }
        }

        impl<T: Reflect + Typed> Reflect for $wrapper<T> {
            fn reflect_type_info(&self) -> &'static TypeInfo {
                T::type_info()
            }

            fn reflect_ref(&self) -> ReflectRef<'_> {
                let $v = self;
                match $get {
                    Some(inner) => ReflectRef::Pointer(inner),
                    None => ReflectRef::Null,
                }
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl<T: FromXml> FromXml for $wrapper<T> {
            fn from_xml_text(text: &str) -> std::result::Result<Self, ConversionError> {
                T::from_xml_text(text).map(|$inner| $wrap)
            }

            fn from_xml_items(items: Vec<String>) -> Result<Self> {
                T::from_xml_items(items).map(|$inner| $wrap)
            }

            fn from_xml_entries(entries: Vec<(String, String)>) -> Result<Self> {
                T::from_xml_entries(entries).map(|$inner| $wrap)
            }

            fn reconstruct(captured: &Captured) -> Result<Self> {
                T::reconstruct(captured).map(|$inner| $wrap)
            }

            fn from_converted(value: Box<dyn Any>) -> std::result::Result<Self, Box<dyn Any>> {
                T::from_converted(value).map(|$inner| $wrap)
            }
        }
    };
}

impl_transparent!(Box, |v| Some(&**v), |inner| Box::new(inner));
impl_transparent!(Rc, |v| Some(&**v), |inner| Rc::new(inner));
impl_transparent!(Arc, |v| Some(&**v), |inner| Arc::new(inner));
impl_transparent!(OnceCell, |v| v.get(), |inner| OnceCell::from(inner));

impl<T: Typed> Typed for Option<T> {
    fn type_info() -> &'static TypeInfo {
        T::type_info()
    }
}

impl<T: Reflect + Typed> Reflect for Option<T> {
    fn reflect_type_info(&self) -> &'static TypeInfo {
        T::type_info()
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        match self {
            Some(inner) => ReflectRef::Pointer(inner),
            None => ReflectRef::Null,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: FromXml> FromXml for Option<T> {
    /// Empty text reads as `None`.
    fn from_xml_text(text: &str) -> std::result::Result<Self, ConversionError> {
        if text.is_empty() {
            Ok(None)
        } else {
            T::from_xml_text(text).map(Some)
        }
    }

    fn from_xml_items(items: Vec<String>) -> Result<Self> {
        T::from_xml_items(items).map(Some)
    }

    fn from_xml_entries(entries: Vec<(String, String)>) -> Result<Self> {
        T::from_xml_entries(entries).map(Some)
    }

    fn reconstruct(captured: &Captured) -> Result<Self> {
        T::reconstruct(captured).map(Some)
    }

    fn from_converted(value: Box<dyn Any>) -> std::result::Result<Self, Box<dyn Any>> {
        T::from_converted(value).map(Some)
    }
}

fn convert_items<T, C>(items: Vec<String>) -> Result<C>
where
    T: FromXml,
    C: FromIterator<T>,
{
    items
        .into_iter()
        .enumerate()
        .map(|(index, text)| {
            T::from_xml_text(&text).map_err(|source| XmlGraphError::Conversion {
                name: item_name(index),
                source,
            })
        })
        .collect()
}

fn convert_entries<K, V, C>(entries: Vec<(String, String)>) -> Result<C>
where
    K: FromXml,
    V: FromXml,
    C: FromIterator<(K, V)>,
{
    entries
        .into_iter()
        .enumerate()
        .map(|(index, (key, value))| {
            let key_value = K::from_xml_text(&key).map_err(|source| XmlGraphError::Conversion {
                name: format!("{}.name", item_name(index)),
                source,
            })?;
            let value = V::from_xml_text(&value).map_err(|source| XmlGraphError::Conversion {
                name: key,
                source,
            })?;
            Ok((key_value, value))
        })
        .collect()
}

/// Implements the traits for sequence types.
macro_rules! impl_list {
    ($collection:ident, $name:literal, $iter:expr $(, $bound:path)*) => {
        impl<T: Typed> Typed for $collection<T> {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| TypeInfo::enumerable::<Self, T>($name))
            }
        }

        impl<T: Reflect + Typed> Reflect for $collection<T> {
            fn reflect_type_info(&self) -> &'static TypeInfo {
                Self::type_info()
            }

            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::List(self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl<T: Reflect + Typed> List for $collection<T> {
            fn len(&self) -> usize {
                $collection::len(self)
            }

            fn iter(&self) -> Box<dyn Iterator<Item = &dyn Reflect> + '_> {
                Box::new($iter(self).map(|item| item as &dyn Reflect))
            }
        }

        impl<T: FromXml $(+ $bound)*> FromXml for $collection<T> {
            fn from_xml_items(items: Vec<String>) -> Result<Self> {
                convert_items::<T, Self>(items)
            }
        }
    };
}

impl_list!(Vec, "Vec", <[T]>::iter);
impl_list!(VecDeque, "VecDeque", VecDeque::iter);
impl_list!(HashSet, "HashSet", HashSet::iter, Eq, Hash);
impl_list!(BTreeSet, "BTreeSet", BTreeSet::iter, Ord);

/// Implements the traits for map types.
macro_rules! impl_map {
    ($collection:ident, $name:literal $(, $bound:path)*) => {
        impl<K: Typed, V: Typed> Typed for $collection<K, V> {
            fn type_info() -> &'static TypeInfo {
                static CELL: GenericTypeInfoCell = GenericTypeInfoCell::new();
                CELL.get_or_insert::<Self>(|| TypeInfo::dictionary::<Self, K, V>($name))
            }
        }

        impl<K: Reflect + Typed, V: Reflect + Typed> Reflect for $collection<K, V> {
            fn reflect_type_info(&self) -> &'static TypeInfo {
                Self::type_info()
            }

            fn reflect_ref(&self) -> ReflectRef<'_> {
                ReflectRef::Map(self)
            }

            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        impl<K: Reflect + Typed, V: Reflect + Typed> Map for $collection<K, V> {
            fn len(&self) -> usize {
                $collection::len(self)
            }

            fn iter(&self) -> Box<dyn Iterator<Item = (&dyn Reflect, &dyn Reflect)> + '_> {
                Box::new(
                    $collection::iter(self)
                        .map(|(key, value)| (key as &dyn Reflect, value as &dyn Reflect)),
                )
            }
        }

        impl<K: FromXml $(+ $bound)*, V: FromXml> FromXml for $collection<K, V> {
            fn from_xml_entries(entries: Vec<(String, String)>) -> Result<Self> {
                convert_entries::<K, V, Self>(entries)
            }
        }
    };
}

impl_map!(HashMap, "HashMap", Eq, Hash);
impl_map!(BTreeMap, "BTreeMap", Ord);
