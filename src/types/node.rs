use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::expr::{Field, Logic, Operator};

/// Opaque, stable identifier of a node.
///
/// Ids are minted once when a node is created and never change afterwards.
/// They are the only handle that survives a tree replacement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Mint a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which variant a [`Node`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    Filter,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Group => f.write_str("group"),
            NodeKind::Filter => f.write_str("filter"),
        }
    }
}

/// A node of the rule tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    #[serde(rename = "GROUP")]
    Group(Group),
    #[serde(rename = "FILTER")]
    Filter(Filter),
}

/// Leaf condition: `<field> <operator> <value>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    id: NodeId,
    pub field: Field,
    pub operator: Operator,
    pub value: String,
    pub is_disabled: bool,
}

/// Internal node combining its children under one [`Logic`].
///
/// Children are reference counted so that tree versions share every subtree
/// an edit did not touch. The child list itself can only be changed through
/// the mutation engine, which keeps ids unique and the tree acyclic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    id: NodeId,
    pub name: String,
    pub logic: Logic,
    pub is_locked: bool,
    pub is_disabled: bool,
    pub is_collapsed: bool,
    #[serde(default)]
    children: Vec<Arc<Node>>,
}

impl Filter {
    #[must_use]
    pub fn new(field: Field, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            id: NodeId::generate(),
            field,
            operator,
            value: value.into(),
            is_disabled: false,
        }
    }

    /// A fresh filter as the editor creates it: `new_field equals ''`.
    #[must_use]
    pub fn blank() -> Self {
        Self::new(Field::NewField, Operator::Equals, "")
    }

    /// Replace the generated id. Only meaningful before the filter is
    /// inserted into a tree.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn disabled(mut self, is_disabled: bool) -> Self {
        self.is_disabled = is_disabled;
        self
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.operator.takes_value() {
            write!(f, "{} {} '{}'", self.field, self.operator, self.value)
        } else {
            write!(f, "{} {}", self.field, self.operator)
        }
    }
}

impl Group {
    /// An empty, enabled, unlocked, expanded `AND` group.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::generate(),
            name: name.into(),
            logic: Logic::And,
            is_locked: false,
            is_disabled: false,
            is_collapsed: false,
            children: Vec::new(),
        }
    }

    /// Replace the generated id. Only meaningful before the group is
    /// inserted into a tree.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<NodeId>) -> Self {
        self.id = id.into();
        self
    }

    /// Append a child to a detached group.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(Arc::new(child.into()));
        self
    }

    #[must_use]
    pub fn id(&self) -> &NodeId {
        &self.id
    }

    #[must_use]
    pub fn children(&self) -> &[Arc<Node>] {
        &self.children
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<Arc<Node>> {
        &mut self.children
    }

    /// Position of the direct child with the given id.
    #[must_use]
    pub fn position_of(&self, id: &NodeId) -> Option<usize> {
        self.children.iter().position(|c| c.id() == id)
    }
}

impl Node {
    #[must_use]
    pub fn id(&self) -> &NodeId {
        match self {
            Node::Group(g) => &g.id,
            Node::Filter(f) => &f.id,
        }
    }

    pub(crate) fn pin_id(&mut self, id: NodeId) {
        match self {
            Node::Group(g) => g.id = id,
            Node::Filter(f) => f.id = id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Group(_) => NodeKind::Group,
            Node::Filter(_) => NodeKind::Filter,
        }
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        match self {
            Node::Group(g) => g.is_disabled,
            Node::Filter(f) => f.is_disabled,
        }
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Filter(_) => None,
        }
    }

    #[must_use]
    pub fn as_filter(&self) -> Option<&Filter> {
        match self {
            Node::Filter(f) => Some(f),
            Node::Group(_) => None,
        }
    }

    /// Direct children; empty for filters.
    #[must_use]
    pub fn children(&self) -> &[Arc<Node>] {
        match self {
            Node::Group(g) => g.children(),
            Node::Filter(_) => &[],
        }
    }

    /// Pre-order iterator over this node and all of its descendants.
    pub fn iter(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }
}

impl From<Group> for Node {
    fn from(g: Group) -> Self {
        Node::Group(g)
    }
}

impl From<Filter> for Node {
    fn from(f: Filter) -> Self {
        Node::Filter(f)
    }
}

/// Pre-order traversal created by [`Node::iter`].
#[derive(Debug)]
pub struct Nodes<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<&'a Node> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.children().iter().rev().map(|c| c.as_ref()));
        Some(node)
    }
}

/// A concrete node variant that an update closure can operate on.
///
/// Implemented for [`Group`] and [`Filter`]; lets
/// [`update_at`](crate::update_at) pick the expected variant from the
/// closure's argument type.
pub trait Variant: Clone + Into<Node> {
    const KIND: NodeKind;

    fn from_node(node: &Node) -> Option<&Self>;
}

impl Variant for Group {
    const KIND: NodeKind = NodeKind::Group;

    fn from_node(node: &Node) -> Option<&Self> {
        node.as_group()
    }
}

impl Variant for Filter {
    const KIND: NodeKind = NodeKind::Filter;

    fn from_node(node: &Node) -> Option<&Self> {
        node.as_filter()
    }
}
