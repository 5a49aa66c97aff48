//! Locating nodes by id inside one tree version.
//!
//! Every lookup walks the tree it is given. Nothing here caches node
//! identities, so the results are always consistent with the current tree
//! even when the id came from an older snapshot.

use std::sync::Arc;

use tracing::instrument;

use crate::types::{Group, Node, NodeId, Path};

/// A node found in a live tree, together with its parentage.
#[derive(Debug, Clone, Copy)]
pub struct Located<'a> {
    pub node: &'a Arc<Node>,
    /// `None` for the root.
    pub parent: Option<&'a Group>,
    /// Position in `parent.children()`; `None` for the root.
    pub index: Option<usize>,
    /// Distance from the root.
    pub depth: usize,
}

impl Located<'_> {
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    #[must_use]
    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent.map(Group::id)
    }
}

/// Depth-first pre-order search for `id`; returns the path from `root` to
/// the first match.
#[instrument(level = "trace", skip(root))]
pub fn find(id: &NodeId, root: &Arc<Node>) -> Option<Path> {
    let mut trail = Vec::new();
    if find_inner(id, root, &mut trail) {
        Some(Path::from_nodes(trail))
    } else {
        None
    }
}

fn find_inner(id: &NodeId, node: &Arc<Node>, trail: &mut Vec<Arc<Node>>) -> bool {
    trail.push(Arc::clone(node));
    if node.id() == id {
        return true;
    }
    for child in node.children() {
        if find_inner(id, child, trail) {
            return true;
        }
    }
    trail.pop();
    false
}

/// Like [`find`], but borrows the live node together with its live parent
/// and index.
#[instrument(level = "trace", skip(root))]
pub fn resolve_live<'a>(id: &NodeId, root: &'a Arc<Node>) -> Option<Located<'a>> {
    if root.id() == id {
        return Some(Located {
            node: root,
            parent: None,
            index: None,
            depth: 0,
        });
    }
    locate_in(id, root, 1)
}

fn locate_in<'a>(id: &NodeId, node: &'a Arc<Node>, depth: usize) -> Option<Located<'a>> {
    let group = node.as_group()?;
    for (index, child) in group.children().iter().enumerate() {
        if child.id() == id {
            return Some(Located {
                node: child,
                parent: Some(group),
                index: Some(index),
                depth,
            });
        }
        if let Some(found) = locate_in(id, child, depth + 1) {
            return Some(found);
        }
    }
    None
}

/// Ids from `id` up to the root, nearest first, `id` itself included.
#[must_use]
pub fn ancestors(id: &NodeId, root: &Arc<Node>) -> Option<Vec<NodeId>> {
    let path = find(id, root)?;
    Some(path.ids().rev().cloned().collect())
}
