//! Qualified names, naming hints and the name resolver.
//!
//! Every attribute and element the writer emits is named by
//! [`resolve`], which applies, in order:
//!
//! 1. an explicit override supplied by the caller,
//! 2. a [`QualifiedName`] carried by the value itself (see
//!    [`Named`](crate::reflect::Named)),
//! 3. the type's root hint (for nodes without a member), then the member's
//!    element hint, then its attribute hint,
//! 4. the sanitized member name, or the sanitized type name for nodes that
//!    do not come from a member.
//!
//! A hint declared with an empty name takes the default name computed in
//! step 4 and keeps its namespace and prefix.

use crate::hierarchy::Node;
use std::borrow::Cow;
use std::fmt;

/// Name used when nothing else yields a valid XML name.
pub const FALLBACK_LOCAL_NAME: &str = "Item";

/// A `{prefix, local name, namespace}` triple naming an element or attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QualifiedName {
    prefix: Option<String>,
    local_name: String,
    namespace: Option<String>,
}

impl QualifiedName {
    /// Creates a name without prefix or namespace.
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: None,
        }
    }

    /// Sets the namespace URI.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the namespace prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// The local part of the name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// The namespace prefix, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// The namespace URI, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Returns true if the local name is empty.
    pub fn is_empty(&self) -> bool {
        self.local_name.is_empty()
    }

    /// The name as written in markup: `prefix:local` or `local`.
    pub fn qualified(&self) -> Cow<'_, str> {
        match &self.prefix {
            Some(prefix) if !prefix.is_empty() => {
                Cow::Owned(format!("{}:{}", prefix, self.local_name))
            }
            _ => Cow::Borrowed(&self.local_name),
        }
    }

    fn from_hint(hint: &NameHint, default_local: &str) -> Self {
        let local = sanitize(hint.name);
        Self {
            prefix: hint.prefix.map(str::to_string),
            local_name: if local.is_empty() {
                default_local.to_string()
            } else {
                local
            },
            namespace: hint.namespace.map(str::to_string),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.qualified()),
            None => f.write_str(&self.qualified()),
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(local_name: &str) -> Self {
        QualifiedName::new(local_name)
    }
}

impl From<String> for QualifiedName {
    fn from(local_name: String) -> Self {
        QualifiedName::new(local_name)
    }
}

/// A declared name with optional namespace, as attached to types and members.
///
/// An empty `name` means "use the default name".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NameHint {
    /// Local name; may be empty.
    pub name: &'static str,
    /// Namespace URI.
    pub namespace: Option<&'static str>,
    /// Namespace prefix.
    pub prefix: Option<&'static str>,
}

impl NameHint {
    /// A hint with the given local name and no namespace.
    pub const fn named(name: &'static str) -> Self {
        Self {
            name,
            namespace: None,
            prefix: None,
        }
    }

    /// A hint without a name.
    pub const fn unnamed() -> Self {
        Self::named("")
    }

    /// Sets the namespace URI.
    pub const fn in_namespace(mut self, namespace: &'static str) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// Sets the namespace prefix.
    pub const fn with_prefix(mut self, prefix: &'static str) -> Self {
        self.prefix = Some(prefix);
        self
    }
}

/// How a member is encoded.
///
/// `Attribute`, `Element` and `Text` are mutually exclusive. When a member
/// declares none of them the writer applies its structural default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamingHint {
    /// No explicit hint.
    #[default]
    None,
    /// Write as an attribute of the owning element.
    Attribute(NameHint),
    /// Write as a child element.
    Element(NameHint),
    /// Write as character data of the owning element.
    Text,
    /// Never write this member.
    Ignore,
}

impl NamingHint {
    /// Returns true for [`NamingHint::Attribute`].
    pub fn is_attribute(&self) -> bool {
        matches!(self, NamingHint::Attribute(_))
    }
}

/// Strips characters that are not valid in XML names.
///
/// Keeps letters, digits, `_`, `:`, `.` and `-`, then drops leading digits
/// and dots. `sanitize(sanitize(s)) == sanitize(s)` for every `s`.
pub fn sanitize(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
        .collect();
    kept.trim_start_matches(|c: char| c.is_numeric() || c == '.')
        .to_string()
}

/// Resolves the qualified name of a hierarchy node.
pub fn resolve(node: &Node<'_>, explicit: Option<&QualifiedName>) -> QualifiedName {
    if let Some(name) = explicit.filter(|n| !n.is_empty()) {
        return name.clone();
    }
    if let Some(name) = node.name_override().filter(|n| !n.is_empty()) {
        return name.clone();
    }

    let default_local = default_local_name(node);

    let hint = match node.member() {
        None => node.type_info().root_hint().copied(),
        Some(member) => match member.hint() {
            NamingHint::Element(hint) | NamingHint::Attribute(hint) => Some(hint),
            _ => None,
        },
    };

    match hint {
        Some(hint) => QualifiedName::from_hint(&hint, &default_local),
        None => QualifiedName::new(default_local),
    }
}

fn default_local_name(node: &Node<'_>) -> String {
    let type_name = sanitize(node.type_info().name());
    let local = match node.member() {
        Some(member) => sanitize(member.name()),
        None => type_name.clone(),
    };
    if !local.is_empty() {
        local
    } else if !type_name.is_empty() {
        type_name
    } else {
        FALLBACK_LOCAL_NAME.to_string()
    }
}
