use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::error::{EditError, TreeError};
use super::expr::{Field, Logic, Operator};
use super::node::{Filter, Group, Node, NodeId, Variant};
use super::path::Path;
use crate::resolve::Located;

/// Builder for a [`RuleTree`] or a detached [`Group`].
///
/// Nested groups are defined via closures, the same way at every level.
///
/// # Example
///
/// ```
/// use ruletree::{Field, Logic, Operator, RuleTree};
///
/// let tree = RuleTree::builder("Root")
///     .group("Contact", |g| {
///         g.logic(Logic::Or)
///             .filter(Field::Channel, Operator::Equals, "email")
///             .filter(Field::Email, Operator::IsNotEmpty, "")
///     })
///     .filter(Field::Name, Operator::Contains, "Roma")
///     .build()
///     .unwrap();
///
/// assert_eq!(
///     tree.expression(),
///     "((channel equals 'email' OR email is not empty) AND name contains 'Roma')"
/// );
/// ```
#[derive(Debug)]
pub struct GroupBuilder {
    group: Group,
}

impl GroupBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            group: Group::new(name),
        }
    }

    /// Use a caller-chosen id instead of a generated one.
    #[must_use]
    pub fn id(mut self, id: impl Into<NodeId>) -> Self {
        self.group = self.group.with_id(id);
        self
    }

    #[must_use]
    pub fn logic(mut self, logic: Logic) -> Self {
        self.group.logic = logic;
        self
    }

    #[must_use]
    pub fn locked(mut self, is_locked: bool) -> Self {
        self.group.is_locked = is_locked;
        self
    }

    #[must_use]
    pub fn disabled(mut self, is_disabled: bool) -> Self {
        self.group.is_disabled = is_disabled;
        self
    }

    #[must_use]
    pub fn collapsed(mut self, is_collapsed: bool) -> Self {
        self.group.is_collapsed = is_collapsed;
        self
    }

    /// Append a filter with a generated id.
    #[must_use]
    pub fn filter(self, field: Field, operator: Operator, value: &str) -> Self {
        self.child(Filter::new(field, operator, value))
    }

    /// Append an already constructed node.
    #[must_use]
    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.group = self.group.with_child(node);
        self
    }

    /// Append a nested group defined by the closure.
    #[must_use]
    pub fn group(self, name: &str, f: impl FnOnce(GroupBuilder) -> GroupBuilder) -> Self {
        let nested = f(GroupBuilder::new(name));
        self.child(nested.group)
    }

    /// Finish as a detached group, e.g. for [`insert_into`](crate::insert_into).
    #[must_use]
    pub fn into_group(self) -> Group {
        self.group
    }

    /// Finish as a tree rooted at this group.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateId`] if two nodes share an id.
    pub fn build(self) -> Result<RuleTree, TreeError> {
        RuleTree::new(self.group)
    }
}

/// An immutable rule tree version.
///
/// The root is always a [`Group`]. Cloning is cheap and every clone is a
/// read-only snapshot: edits return a new `RuleTree` that shares all
/// untouched subtrees with the old one, so snapshots can be handed to other
/// threads while a single writer keeps producing new versions.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTree {
    pub(crate) root: Arc<Node>,
}

impl RuleTree {
    /// Wrap a group as a tree root.
    ///
    /// # Errors
    ///
    /// Returns [`TreeError::DuplicateId`] if two nodes share an id.
    pub fn new(root: Group) -> Result<Self, TreeError> {
        let root = Arc::new(Node::Group(root));
        check_unique_ids(&root)?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn builder(name: &str) -> GroupBuilder {
        GroupBuilder::new(name)
    }

    /// Wraps a root produced by the mutation engine, which preserves the
    /// invariants by construction.
    pub(crate) fn from_root(root: Arc<Node>) -> Self {
        debug_assert!(root.is_group());
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Group {
        match self.root.as_ref() {
            Node::Group(g) => g,
            Node::Filter(_) => unreachable!("rule tree root is always a group"),
        }
    }

    #[must_use]
    pub fn root_node(&self) -> &Arc<Node> {
        &self.root
    }

    #[must_use]
    pub fn root_id(&self) -> &NodeId {
        self.root.id()
    }

    #[must_use]
    pub fn root_path(&self) -> Path {
        Path::from_nodes(vec![Arc::clone(&self.root)])
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.root.iter().count()
    }

    /// Always `false`; a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn contains(&self, id: &NodeId) -> bool {
        self.root.iter().any(|n| n.id() == id)
    }

    #[must_use]
    pub fn find(&self, id: &NodeId) -> Option<Path> {
        crate::resolve::find(id, &self.root)
    }

    #[must_use]
    pub fn locate(&self, id: &NodeId) -> Option<Located<'_>> {
        crate::resolve::resolve_live(id, &self.root)
    }

    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Arc<Node>> {
        self.locate(id).map(|l| l.node)
    }

    /// Compile the whole tree into its boolean expression. Empty when no
    /// enabled filter contributes.
    #[must_use]
    pub fn expression(&self) -> String {
        crate::compile::compile_node(&self.root)
    }

    /// See [`update_at`](crate::update_at).
    ///
    /// # Errors
    ///
    /// Returns [`EditError`] if the edit is rejected; `self` is unchanged.
    pub fn update_at<T: Variant>(
        &self,
        path: &Path,
        f: impl FnOnce(T) -> T,
    ) -> Result<RuleTree, EditError> {
        crate::mutate::update_at(self, path, f)
    }

    /// See [`insert_into`](crate::insert_into).
    ///
    /// # Errors
    ///
    /// Returns [`EditError`] if the edit is rejected; `self` is unchanged.
    pub fn insert_into(
        &self,
        parent_path: &Path,
        node: impl Into<Node>,
        index: Option<usize>,
    ) -> Result<RuleTree, EditError> {
        crate::mutate::insert_into(self, parent_path, node, index)
    }

    /// See [`remove_at`](crate::remove_at).
    ///
    /// # Errors
    ///
    /// Returns [`EditError`] if the edit is rejected; `self` is unchanged.
    pub fn remove_at(&self, path: &Path) -> Result<RuleTree, EditError> {
        crate::mutate::remove_at(self, path)
    }

    /// See [`move_node`](crate::move_node).
    ///
    /// # Errors
    ///
    /// Returns [`EditError`] if the move is rejected; `self` is unchanged.
    pub fn move_node(
        &self,
        source: &NodeId,
        dest_parent: &NodeId,
        dest_index: usize,
    ) -> Result<RuleTree, EditError> {
        crate::mutate::move_node(self, source, dest_parent, dest_index)
    }

    /// Compact JSON dump. See [`to_json`](crate::to_json).
    ///
    /// # Errors
    ///
    /// Returns [`DumpError`](crate::DumpError) if encoding fails.
    pub fn to_json(&self) -> Result<String, crate::DumpError> {
        crate::serial::to_json(self)
    }

    /// Read a JSON dump. See [`from_json`](crate::from_json).
    ///
    /// # Errors
    ///
    /// Returns [`DumpError`](crate::DumpError) on malformed input or a broken
    /// invariant.
    pub fn from_json(input: &str) -> Result<Self, crate::DumpError> {
        crate::serial::from_json(input)
    }

    /// Write a pretty JSON dump to a file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTreeError`](crate::RuleTreeError) on encoding or I/O
    /// failure.
    pub fn to_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), crate::RuleTreeError> {
        let json = crate::serial::to_json_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a JSON dump from a file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTreeError`](crate::RuleTreeError) on I/O failure,
    /// malformed input, or a broken invariant.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, crate::RuleTreeError> {
        let input = std::fs::read_to_string(path)?;
        Ok(crate::serial::from_json(&input)?)
    }
}

impl TryFrom<Node> for RuleTree {
    type Error = TreeError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        match node {
            Node::Group(g) => RuleTree::new(g),
            Node::Filter(_) => Err(TreeError::RootNotGroup),
        }
    }
}

impl fmt::Display for RuleTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups = self.root.iter().filter(|n| n.is_group()).count();
        write!(
            f,
            "RuleTree('{}', {} groups, {} filters)",
            self.root().name,
            groups,
            self.len() - groups,
        )
    }
}

pub(crate) fn check_unique_ids(node: &Node) -> Result<(), TreeError> {
    let mut seen = HashSet::new();
    for n in node.iter() {
        if !seen.insert(n.id()) {
            return Err(TreeError::DuplicateId { id: n.id().clone() });
        }
    }
    Ok(())
}
