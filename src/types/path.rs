use std::sync::Arc;

use super::node::{Node, NodeId};

/// Snapshot of the nodes from the root down to a target node, inclusive.
///
/// A path is a value captured from one tree version. Operations that take a
/// path only trust its ids: the target is re-resolved against whatever tree
/// the operation is applied to, so a path taken before an edit still
/// addresses the same node afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    // never empty
    nodes: Vec<Arc<Node>>,
}

impl Path {
    pub(crate) fn from_nodes(nodes: Vec<Arc<Node>>) -> Self {
        debug_assert!(!nodes.is_empty());
        Self { nodes }
    }

    /// Extend this path by one of the target's children.
    #[must_use]
    pub fn child(&self, child: &Arc<Node>) -> Path {
        let mut nodes = self.nodes.clone();
        nodes.push(Arc::clone(child));
        Path { nodes }
    }

    #[must_use]
    pub fn nodes(&self) -> &[Arc<Node>] {
        &self.nodes
    }

    /// The node this path points at, as it was when the path was captured.
    #[must_use]
    pub fn target(&self) -> &Arc<Node> {
        &self.nodes[self.nodes.len() - 1]
    }

    #[must_use]
    pub fn target_id(&self) -> &NodeId {
        self.target().id()
    }

    /// The target's parent snapshot, `None` when the path points at the root.
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Node>> {
        self.nodes.len().checked_sub(2).map(|i| &self.nodes[i])
    }

    /// Ids from the root down to the target.
    pub fn ids(&self) -> impl DoubleEndedIterator<Item = &NodeId> {
        self.nodes.iter().map(|n| n.id())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; paths contain at least the root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.nodes.len() == 1
    }
}
