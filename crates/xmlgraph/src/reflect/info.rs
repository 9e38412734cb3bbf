//! Static type descriptors.

use crate::name::{NameHint, NamingHint};
use crate::reflect::Typed;
use std::any::TypeId;
use std::fmt;

/// Structural classification of a type, decided once per type.
#[derive(Clone, Copy)]
pub enum TypeKind {
    /// Primitive, string, decimal, UUID, date/time and unit enums.
    Simple,
    /// A bare type value ([`TypeRef`](crate::reflect::TypeRef)).
    Type,
    /// A sequence of items written as repeated `Item` elements.
    Enumerable {
        /// Descriptor of the item type.
        item: fn() -> &'static TypeInfo,
    },
    /// A key/value map written as `Item` elements with a `name` key attribute.
    Dictionary {
        /// Descriptor of the key type.
        key: fn() -> &'static TypeInfo,
        /// Descriptor of the value type.
        value: fn() -> &'static TypeInfo,
    },
    /// Everything else: a type made of named members.
    Complex,
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Simple => f.write_str("Simple"),
            TypeKind::Type => f.write_str("Type"),
            TypeKind::Enumerable { item } => f
                .debug_struct("Enumerable")
                .field("item", &item().type_path())
                .finish(),
            TypeKind::Dictionary { key, value } => f
                .debug_struct("Dictionary")
                .field("key", &key().type_path())
                .field("value", &value().type_path())
                .finish(),
            TypeKind::Complex => f.write_str("Complex"),
        }
    }
}

/// One member (field) of a complex type.
pub struct MemberInfo {
    name: &'static str,
    hint: NamingHint,
    type_info: fn() -> &'static TypeInfo,
}

impl MemberInfo {
    /// Creates a member of type `T` without a naming hint.
    pub fn new<T: Typed>(name: &'static str) -> Self {
        Self {
            name,
            hint: NamingHint::None,
            type_info: T::type_info,
        }
    }

    /// Creates an ignored member. Ignored members carry no value access.
    pub fn ignored(name: &'static str) -> Self {
        Self {
            name,
            hint: NamingHint::Ignore,
            type_info: TypeInfo::ignored,
        }
    }

    /// Attaches a naming hint.
    pub fn with_hint(mut self, hint: NamingHint) -> Self {
        self.hint = hint;
        self
    }

    /// The member name as declared (after any rename).
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The naming hint attached to this member.
    pub fn hint(&self) -> NamingHint {
        self.hint
    }

    /// Returns true when the member is excluded from documents.
    pub fn is_ignored(&self) -> bool {
        matches!(self.hint, NamingHint::Ignore)
    }

    /// Descriptor of the declared member type.
    pub fn type_info(&self) -> &'static TypeInfo {
        (self.type_info)()
    }
}

impl fmt::Debug for MemberInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberInfo")
            .field("name", &self.name)
            .field("hint", &self.hint)
            .finish()
    }
}

/// Compile-time information about a type, built once and cached.
///
/// Obtain it with [`Typed::type_info`] or, from a value, with
/// [`Reflect::reflect_type_info`](crate::reflect::Reflect::reflect_type_info).
#[derive(Debug)]
pub struct TypeInfo {
    type_id: TypeId,
    type_path: &'static str,
    name: &'static str,
    kind: TypeKind,
    root: Option<NameHint>,
    members: Vec<MemberInfo>,
}

impl TypeInfo {
    fn new<T: 'static>(name: &'static str, kind: TypeKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_path: std::any::type_name::<T>(),
            name,
            kind,
            root: None,
            members: Vec::new(),
        }
    }

    /// Describes a simple value type.
    pub fn simple<T: 'static>(name: &'static str) -> Self {
        Self::new::<T>(name, TypeKind::Simple)
    }

    /// Describes a type whose values denote types.
    pub fn type_value<T: 'static>(name: &'static str) -> Self {
        Self::new::<T>(name, TypeKind::Type)
    }

    /// Describes a sequence type with items of type `I`.
    pub fn enumerable<T: 'static, I: Typed>(name: &'static str) -> Self {
        Self::new::<T>(name, TypeKind::Enumerable { item: I::type_info })
    }

    /// Describes a map type with keys `K` and values `V`.
    pub fn dictionary<T: 'static, K: Typed, V: Typed>(name: &'static str) -> Self {
        Self::new::<T>(
            name,
            TypeKind::Dictionary {
                key: K::type_info,
                value: V::type_info,
            },
        )
    }

    /// Describes a complex type made of `members`, in declaration order.
    pub fn complex<T: 'static>(name: &'static str, members: Vec<MemberInfo>) -> Self {
        let mut info = Self::new::<T>(name, TypeKind::Complex);
        info.members = members;
        info
    }

    /// Attaches a root-name hint.
    pub fn with_root(mut self, root: NameHint) -> Self {
        self.root = Some(root);
        self
    }

    /// Descriptor used for ignored members.
    pub fn ignored() -> &'static TypeInfo {
        struct Ignored;
        static CELL: crate::reflect::NonGenericTypeInfoCell =
            crate::reflect::NonGenericTypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::complex::<Ignored>("Ignored", Vec::new()))
    }

    /// The [`TypeId`] of the described type.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The full type path, e.g. `alloc::vec::Vec<i32>`.
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// The friendly name without module path or generic arguments, e.g. `Vec`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The structural kind.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// The root-name hint, if declared.
    pub fn root_hint(&self) -> Option<&NameHint> {
        self.root.as_ref()
    }

    /// Members in declaration order (complex types only).
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    /// Looks up a member by name.
    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Returns true if this describes `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Returns true for simple value types.
    pub fn is_simple(&self) -> bool {
        matches!(self.kind, TypeKind::Simple)
    }

    /// Returns true for bare type values.
    pub fn is_type(&self) -> bool {
        matches!(self.kind, TypeKind::Type)
    }

    /// Returns true for sequences.
    pub fn is_enumerable(&self) -> bool {
        matches!(self.kind, TypeKind::Enumerable { .. })
    }

    /// Returns true for maps.
    pub fn is_dictionary(&self) -> bool {
        matches!(self.kind, TypeKind::Dictionary { .. })
    }

    /// Returns true for anything that is not a simple value or a type value.
    pub fn is_complex(&self) -> bool {
        !self.is_simple() && !self.is_type()
    }
}
