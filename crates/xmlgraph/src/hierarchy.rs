//! Intermediate tree built from an object graph.
//!
//! [`Hierarchy::build`] walks a value through [`Reflect`] and records one
//! [`Node`] per value position. Complex values are expanded member by
//! member; ignored members become childless nodes without a value so the
//! writer can see and skip them. Simple values, type values, lists and maps
//! are leaves: their items are expanded by the writer, one sub-hierarchy per
//! item.
//!
//! Nodes live in an arena owned by the hierarchy and refer to each other by
//! [`NodeId`]. The builder keeps the identities of the complex values on the
//! current branch and fails with [`XmlGraphError::Cycle`] when a value
//! contains itself, or with [`XmlGraphError::DepthExceeded`] past the
//! configured nesting limit.

use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::{Result, XmlGraphError};
use crate::name::{NamingHint, QualifiedName};
use crate::reflect::{resolve_value, Identity, MemberInfo, Reflect, ReflectRef, TypeInfo};

/// Index of a node in its [`Hierarchy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    /// Id of the root node.
    pub const ROOT: NodeId = NodeId(0);
}

/// One value position in the object graph.
pub struct Node<'a> {
    instance: Option<&'a dyn Reflect>,
    type_info: &'static TypeInfo,
    member: Option<&'static MemberInfo>,
    name_override: Option<&'a QualifiedName>,
    depth: usize,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl<'a> Node<'a> {
    /// The value at this position, with transparent wrappers removed.
    /// `None` for null values and ignored members.
    pub fn instance(&self) -> Option<&'a dyn Reflect> {
        self.instance
    }

    /// Descriptor used for conversion decisions.
    pub fn type_info(&self) -> &'static TypeInfo {
        self.type_info
    }

    /// The member this node was reached through; `None` for roots.
    pub fn member(&self) -> Option<&'static MemberInfo> {
        self.member
    }

    /// Explicit name carried by the value.
    pub fn name_override(&self) -> Option<&'a QualifiedName> {
        self.name_override
    }

    /// Distance from the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Parent node; `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Child nodes in member declaration order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The member's naming hint, [`NamingHint::None`] for roots.
    pub fn hint(&self) -> NamingHint {
        self.member.map(MemberInfo::hint).unwrap_or_default()
    }

    /// Returns true for ignored members.
    pub fn is_ignored(&self) -> bool {
        self.member.is_some_and(MemberInfo::is_ignored)
    }

    /// Returns true when there is no value at this position.
    pub fn is_null(&self) -> bool {
        self.instance.is_none()
    }

    /// Returns true for lists and maps without entries.
    pub fn is_empty_collection(&self) -> bool {
        match self.instance.map(|value| value.reflect_ref()) {
            Some(ReflectRef::List(list)) => list.is_empty(),
            Some(ReflectRef::Map(map)) => map.is_empty(),
            _ => false,
        }
    }
}

/// Tracks the complex values on the current walk branch.
pub(crate) struct WalkGuard {
    branch: Vec<Identity>,
    max_depth: usize,
}

impl WalkGuard {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            branch: Vec::new(),
            max_depth,
        }
    }

    /// Pushes `value` onto the branch.
    pub(crate) fn enter(&mut self, value: &dyn Reflect, path: impl FnOnce() -> String) -> Result<()> {
        let identity = Identity::of(value);
        if self.branch.contains(&identity) {
            return Err(XmlGraphError::Cycle {
                type_name: value.reflect_type_info().type_path(),
                path: path(),
            });
        }
        if self.branch.len() >= self.max_depth {
            return Err(XmlGraphError::DepthExceeded {
                limit: self.max_depth,
                path: path(),
            });
        }
        self.branch.push(identity);
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.branch.pop();
    }
}

impl Default for WalkGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Arena tree of [`Node`]s rooted at [`NodeId::ROOT`].
pub struct Hierarchy<'a> {
    nodes: Vec<Node<'a>>,
}

impl<'a> Hierarchy<'a> {
    /// Builds the hierarchy of `value` with the default depth limit.
    pub fn build(value: &'a dyn Reflect) -> Result<Self> {
        Self::build_guarded(value, &mut WalkGuard::default())
    }

    /// Builds the hierarchy of `value`, sharing `guard` with enclosing walks.
    pub(crate) fn build_guarded(value: &'a dyn Reflect, guard: &mut WalkGuard) -> Result<Self> {
        let mut hierarchy = Hierarchy { nodes: Vec::new() };
        hierarchy.push(Some(value), value.reflect_type_info(), None, None, guard)?;
        Ok(hierarchy)
    }

    /// The root node.
    pub fn root(&self) -> &Node<'a> {
        &self.nodes[NodeId::ROOT.0]
    }

    /// The node with the given id.
    ///
    /// Ids are only handed out by this hierarchy, so lookups cannot miss.
    pub fn node(&self, id: NodeId) -> &Node<'a> {
        &self.nodes[id.0]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a hierarchy has at least its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Dotted member path of a node, e.g. `Order.customer.name`.
    pub fn path(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.node(id);
            segments.push(segment(node.member, node.type_info));
            current = node.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    fn push(
        &mut self,
        value: Option<&'a dyn Reflect>,
        declared: &'static TypeInfo,
        member: Option<&'static MemberInfo>,
        parent: Option<NodeId>,
        guard: &mut WalkGuard,
    ) -> Result<NodeId> {
        let resolved = value.map(resolve_value);
        let instance = resolved.and_then(|r| r.value);
        let name_override = resolved.and_then(|r| r.name_override);
        let type_info = instance.map_or(declared, |v| v.reflect_type_info());

        let id = NodeId(self.nodes.len());
        let depth = parent.map_or(0, |p| self.node(p).depth + 1);
        self.nodes.push(Node {
            instance,
            type_info,
            member,
            name_override,
            depth,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }

        if let Some(value) = instance
            && let ReflectRef::Struct(fields) = value.reflect_ref()
        {
            guard.enter(value, || self.path(id))?;
            let expanded = self.expand(id, fields, type_info, guard);
            guard.leave();
            expanded?;
        }

        Ok(id)
    }

    fn expand(
        &mut self,
        id: NodeId,
        fields: &'a dyn crate::reflect::Struct,
        type_info: &'static TypeInfo,
        guard: &mut WalkGuard,
    ) -> Result<()> {
        for (index, member) in type_info.members().iter().enumerate() {
            if member.is_ignored() {
                self.push(None, TypeInfo::ignored(), Some(member), Some(id), guard)?;
                continue;
            }
            let field = fields.field_at(index);
            self.push(field, member.type_info(), Some(member), Some(id), guard)?;
        }
        Ok(())
    }
}

fn segment(member: Option<&MemberInfo>, type_info: &TypeInfo) -> String {
    match member {
        Some(member) => member.name().to_string(),
        None => type_info.name().to_string(),
    }
}
