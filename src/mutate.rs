//! Copy-on-write edits.
//!
//! Every operation borrows the current tree and returns a new one. Only the
//! nodes on the route from the root to the edited node are copied; all other
//! subtrees are shared with the input through their `Arc`s. A rejected edit
//! returns an [`EditError`] and leaves the input as it was.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::resolve::{ancestors, find};
use crate::types::{EditError, Node, NodeId, NodeKind, Path, RuleTree, Variant};

/// Replace the node `path` points at with `f(node)`.
///
/// The expected variant is the closure's argument type: pass
/// `|g: Group| ...` to edit a group, `|f: Filter| ...` to edit a filter.
/// The path is re-resolved by its target id; the replacement keeps the
/// original id whatever the closure does with it.
///
/// # Errors
///
/// [`EditError::PathMismatch`] if the target is not in `tree`,
/// [`EditError::WrongVariant`] if it is not a `T`,
/// [`EditError::DuplicateId`] if the replacement brings in an id used
/// elsewhere in the tree or twice within itself.
#[instrument(level = "trace", skip_all, fields(target = %path.target_id()))]
pub fn update_at<T: Variant>(
    tree: &RuleTree,
    path: &Path,
    f: impl FnOnce(T) -> T,
) -> Result<RuleTree, EditError> {
    let id = path.target_id();
    let result = edit_node(tree, id, |node| {
        let current = T::from_node(node).ok_or_else(|| EditError::WrongVariant {
            id: id.clone(),
            expected: T::KIND,
        })?;
        let mut replaced: Node = f(current.clone()).into();
        replaced.pin_id(id.clone());
        check_replacement_ids(tree, node, &replaced)?;
        Ok(replaced)
    });
    report("update", result)
}

/// Insert `node` into the group `parent_path` points at, before position
/// `index`, or at the end when `index` is `None` or past the end.
///
/// # Errors
///
/// [`EditError::PathMismatch`] if the parent is not in `tree`,
/// [`EditError::WrongVariant`] if it is a filter,
/// [`EditError::DuplicateId`] if `node` or one of its descendants reuses an id.
#[instrument(level = "trace", skip_all, fields(parent = %parent_path.target_id()))]
pub fn insert_into(
    tree: &RuleTree,
    parent_path: &Path,
    node: impl Into<Node>,
    index: Option<usize>,
) -> Result<RuleTree, EditError> {
    let node = Arc::new(node.into());
    let result = check_fresh_ids(tree, &node).and_then(|()| {
        with_children(tree, parent_path.target_id(), |children| {
            let at = index.map_or(children.len(), |i| i.min(children.len()));
            children.insert(at, node);
            Ok(())
        })
    });
    report("insert", result)
}

/// Remove the node `path` points at from its live parent.
///
/// # Errors
///
/// [`EditError::PathMismatch`] if the target is not in `tree`,
/// [`EditError::InvalidRootOperation`] if it is the root.
#[instrument(level = "trace", skip_all, fields(target = %path.target_id()))]
pub fn remove_at(tree: &RuleTree, path: &Path) -> Result<RuleTree, EditError> {
    let id = path.target_id();
    let result = match tree.locate(id) {
        None => Err(EditError::PathMismatch { id: id.clone() }),
        Some(located) => match located.parent {
            None => Err(EditError::InvalidRootOperation),
            Some(parent) => with_children(tree, parent.id(), |children| {
                let pos = position(children, id)?;
                children.remove(pos);
                Ok(())
            }),
        },
    };
    report("remove", result)
}

/// Move `source` into the group `dest_parent`, before position `dest_index`.
///
/// `dest_index` addresses the destination's children as they are *before*
/// the move. When source and destination share a parent and the source sits
/// before `dest_index`, the index is shifted down by one to account for the
/// removal. Removal and insertion happen on one private working copy, so
/// the returned tree never has the node in both places or in neither.
///
/// # Errors
///
/// [`EditError::PathMismatch`] if either id is not in `tree`,
/// [`EditError::WrongVariant`] if `dest_parent` is a filter,
/// [`EditError::CycleRejected`] if `source` is a group and `dest_parent` is
/// that group or one of its descendants,
/// [`EditError::InvalidRootOperation`] if `source` is the root.
#[instrument(level = "trace", skip(tree))]
pub fn move_node(
    tree: &RuleTree,
    source: &NodeId,
    dest_parent: &NodeId,
    dest_index: usize,
) -> Result<RuleTree, EditError> {
    report("move", plan_move(tree, source, dest_parent, dest_index))
}

fn plan_move(
    tree: &RuleTree,
    source: &NodeId,
    dest_parent: &NodeId,
    dest_index: usize,
) -> Result<RuleTree, EditError> {
    let src = tree
        .locate(source)
        .ok_or_else(|| EditError::PathMismatch { id: source.clone() })?;
    let dest = tree.locate(dest_parent).ok_or_else(|| EditError::PathMismatch {
        id: dest_parent.clone(),
    })?;
    let (Some(old_parent), Some(old_index)) = (src.parent, src.index) else {
        return Err(EditError::InvalidRootOperation);
    };

    if src.node.is_group() {
        let chain = ancestors(dest_parent, tree.root_node()).unwrap_or_default();
        if chain.contains(source) {
            return Err(EditError::CycleRejected {
                group: source.clone(),
                destination: dest_parent.clone(),
            });
        }
    }
    if !dest.node.is_group() {
        return Err(EditError::WrongVariant {
            id: dest_parent.clone(),
            expected: NodeKind::Group,
        });
    }

    let index = if old_parent.id() == dest_parent && old_index < dest_index {
        dest_index - 1
    } else {
        dest_index
    };
    debug!(%source, from = %old_parent.id(), old_index, to = %dest_parent, index, "moving node");

    let moved = Arc::clone(src.node);
    let detached = with_children(tree, old_parent.id(), |children| {
        children.remove(old_index);
        Ok(())
    })?;
    with_children(&detached, dest_parent, |children| {
        let at = index.min(children.len());
        children.insert(at, moved);
        Ok(())
    })
}

/// Copy the route from the root to `target` and replace `target` with
/// `edit(target)`.
fn edit_node<F>(tree: &RuleTree, target: &NodeId, edit: F) -> Result<RuleTree, EditError>
where
    F: FnOnce(&Node) -> Result<Node, EditError>,
{
    let path = find(target, tree.root_node())
        .ok_or_else(|| EditError::PathMismatch { id: target.clone() })?;
    let root = rewrite(path.nodes(), edit)?;
    Ok(RuleTree::from_root(root))
}

fn rewrite<F>(route: &[Arc<Node>], edit: F) -> Result<Arc<Node>, EditError>
where
    F: FnOnce(&Node) -> Result<Node, EditError>,
{
    match route {
        [] => unreachable!("paths always contain the root"),
        [target] => Ok(Arc::new(edit(target)?)),
        [node, rest @ ..] => {
            let Node::Group(group) = node.as_ref() else {
                return Err(EditError::WrongVariant {
                    id: node.id().clone(),
                    expected: NodeKind::Group,
                });
            };
            let mut group = group.clone();
            let pos = position(group.children(), rest[0].id())?;
            group.children_mut()[pos] = rewrite(rest, edit)?;
            Ok(Arc::new(Node::Group(group)))
        }
    }
}

fn with_children<F>(tree: &RuleTree, group_id: &NodeId, f: F) -> Result<RuleTree, EditError>
where
    F: FnOnce(&mut Vec<Arc<Node>>) -> Result<(), EditError>,
{
    edit_node(tree, group_id, |node| match node {
        Node::Group(group) => {
            let mut group = group.clone();
            f(group.children_mut())?;
            Ok(Node::Group(group))
        }
        Node::Filter(_) => Err(EditError::WrongVariant {
            id: group_id.clone(),
            expected: NodeKind::Group,
        }),
    })
}

fn position(children: &[Arc<Node>], id: &NodeId) -> Result<usize, EditError> {
    children
        .iter()
        .position(|c| c.id() == id)
        .ok_or_else(|| EditError::PathMismatch { id: id.clone() })
}

fn check_fresh_ids(tree: &RuleTree, node: &Node) -> Result<(), EditError> {
    let seen: HashSet<&NodeId> = tree.root_node().iter().map(Node::id).collect();
    check_unseen(seen, node)
}

/// Ids of `replacement` must be unique against the tree without `old`.
fn check_replacement_ids(
    tree: &RuleTree,
    old: &Node,
    replacement: &Node,
) -> Result<(), EditError> {
    let outgoing: HashSet<&NodeId> = old.iter().map(Node::id).collect();
    let seen: HashSet<&NodeId> = tree
        .root_node()
        .iter()
        .map(Node::id)
        .filter(|id| !outgoing.contains(id))
        .collect();
    check_unseen(seen, replacement)
}

fn check_unseen<'a>(mut seen: HashSet<&'a NodeId>, node: &'a Node) -> Result<(), EditError> {
    for n in node.iter() {
        if !seen.insert(n.id()) {
            return Err(EditError::DuplicateId { id: n.id().clone() });
        }
    }
    Ok(())
}

fn report(op: &'static str, result: Result<RuleTree, EditError>) -> Result<RuleTree, EditError> {
    match &result {
        Ok(tree) => debug!(op, nodes = tree.len(), "edit applied"),
        Err(err) => warn!(op, %err, "edit rejected"),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Field, Filter, Group, Logic, Operator};

    fn ids(node: &Node) -> Vec<&str> {
        node.children().iter().map(|c| c.id().as_str()).collect()
    }

    fn flat() -> RuleTree {
        RuleTree::builder("Root")
            .id("root")
            .child(Filter::blank().with_id("a"))
            .child(Filter::blank().with_id("b"))
            .child(Filter::blank().with_id("c"))
            .build()
            .unwrap()
    }

    fn nested() -> RuleTree {
        RuleTree::builder("Root")
            .id("root")
            .group("G1", |g| {
                g.id("g1")
                    .child(Filter::blank().with_id("x"))
                    .group("G2", |g| g.id("g2").child(Filter::blank().with_id("y")))
            })
            .group("G3", |g| g.id("g3"))
            .child(Filter::blank().with_id("z"))
            .build()
            .unwrap()
    }

    fn path(tree: &RuleTree, id: &str) -> Path {
        tree.find(&id.into()).unwrap()
    }

    #[test]
    fn update_identity_is_value_equal() {
        let tree = nested();
        let updated = update_at(&tree, &path(&tree, "g2"), |g: Group| g).unwrap();
        assert_eq!(updated, tree);
        let updated = update_at(&tree, &path(&tree, "y"), |f: Filter| f).unwrap();
        assert_eq!(updated, tree);
    }

    #[test]
    fn update_changes_only_target() {
        let tree = nested();
        let updated = update_at(&tree, &path(&tree, "g2"), |mut g: Group| {
            g.logic = Logic::Or;
            g.name = "Renamed".into();
            g
        })
        .unwrap();
        let g2 = updated.node(&"g2".into()).unwrap().as_group().unwrap();
        assert_eq!(g2.logic, Logic::Or);
        assert_eq!(g2.name, "Renamed");
        // the input is untouched
        let old = tree.node(&"g2".into()).unwrap().as_group().unwrap();
        assert_eq!(old.logic, Logic::And);
        assert_eq!(old.name, "G2");
    }

    #[test]
    fn update_shares_untouched_subtrees() {
        let tree = nested();
        let updated = update_at(&tree, &path(&tree, "y"), |mut f: Filter| {
            f.value = "v".into();
            f
        })
        .unwrap();
        let before = tree.root().children();
        let after = updated.root().children();
        assert!(!Arc::ptr_eq(&before[0], &after[0]));
        assert!(Arc::ptr_eq(&before[1], &after[1]));
        assert!(Arc::ptr_eq(&before[2], &after[2]));
        assert!(Arc::ptr_eq(&before[0].children()[0], &after[0].children()[0]));
    }

    #[test]
    fn update_wrong_variant() {
        let tree = nested();
        let err = update_at(&tree, &path(&tree, "x"), |g: Group| g).unwrap_err();
        assert_eq!(
            err,
            EditError::WrongVariant {
                id: "x".into(),
                expected: NodeKind::Group
            }
        );
    }

    #[test]
    fn update_pins_id() {
        let tree = nested();
        let updated = update_at(&tree, &path(&tree, "x"), |_: Filter| {
            Filter::new(Field::City, Operator::Equals, "Moskva")
        })
        .unwrap();
        let x = updated.node(&"x".into()).unwrap().as_filter().unwrap();
        assert_eq!(x.field, Field::City);
        assert_eq!(updated.len(), tree.len());
    }

    #[test]
    fn update_stale_path_still_resolves_by_id() {
        let tree = nested();
        let stale = path(&tree, "y");
        let moved = move_node(&tree, &"y".into(), &"root".into(), 0).unwrap();
        let updated = update_at(&moved, &stale, |mut f: Filter| {
            f.value = "after move".into();
            f
        })
        .unwrap();
        let y = updated.root().children()[0].as_filter().unwrap();
        assert_eq!(y.value, "after move");
    }

    #[test]
    fn update_removed_node_is_path_mismatch() {
        let tree = nested();
        let stale = path(&tree, "y");
        let removed = remove_at(&tree, &stale).unwrap();
        let err = update_at(&removed, &stale, |f: Filter| f).unwrap_err();
        assert_eq!(err, EditError::PathMismatch { id: "y".into() });
    }

    #[test]
    fn insert_appends_by_default() {
        let tree = flat();
        let updated = insert_into(&tree, &tree.root_path(), Filter::blank().with_id("d"), None)
            .unwrap();
        assert_eq!(ids(updated.root_node()), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn insert_at_index_and_clamps() {
        let tree = flat();
        let updated =
            insert_into(&tree, &tree.root_path(), Filter::blank().with_id("d"), Some(1)).unwrap();
        assert_eq!(ids(updated.root_node()), vec!["a", "d", "b", "c"]);
        let updated =
            insert_into(&tree, &tree.root_path(), Filter::blank().with_id("d"), Some(99)).unwrap();
        assert_eq!(ids(updated.root_node()), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn insert_into_nested_group() {
        let tree = nested();
        let updated = insert_into(&tree, &path(&tree, "g3"), Group::new("New").with_id("n"), None)
            .unwrap();
        let g3 = updated.node(&"g3".into()).unwrap();
        assert_eq!(ids(g3), vec!["n"]);
    }

    #[test]
    fn insert_into_filter_fails() {
        let tree = nested();
        let err = insert_into(&tree, &path(&tree, "z"), Filter::blank(), None).unwrap_err();
        assert!(matches!(err, EditError::WrongVariant { .. }));
    }

    #[test]
    fn insert_rejects_duplicate_ids() {
        let tree = flat();
        let err =
            insert_into(&tree, &tree.root_path(), Filter::blank().with_id("b"), None).unwrap_err();
        assert_eq!(err, EditError::DuplicateId { id: "b".into() });

        let twice = Group::new("dup")
            .with_child(Filter::blank().with_id("q"))
            .with_child(Filter::blank().with_id("q"));
        let err = insert_into(&tree, &tree.root_path(), twice, None).unwrap_err();
        assert_eq!(err, EditError::DuplicateId { id: "q".into() });
    }

    #[test]
    fn update_rejects_colliding_ids() {
        let tree = nested();
        let path = path(&tree, "g3");

        let err = update_at(&tree, &path, |g: Group| {
            g.with_child(Filter::blank().with_id("x"))
        })
        .unwrap_err();
        assert_eq!(err, EditError::DuplicateId { id: "x".into() });

        let err = update_at(&tree, &path, |g: Group| {
            g.with_child(Filter::blank().with_id("n"))
                .with_child(Filter::blank().with_id("n"))
        })
        .unwrap_err();
        assert_eq!(err, EditError::DuplicateId { id: "n".into() });
    }

    #[test]
    fn update_may_keep_or_regroup_own_descendants() {
        let tree = nested();
        let g1 = path(&tree, "g1");
        let updated = update_at(&tree, &g1, |mut g: Group| {
            g.children_mut().reverse();
            g
        })
        .unwrap();
        assert_eq!(ids(updated.node(&"g1".into()).unwrap()), ["g2", "x"]);

        let grown = update_at(&tree, &g1, |g: Group| {
            g.with_child(Filter::blank().with_id("fresh"))
        })
        .unwrap();
        assert!(RuleTree::from_json(&grown.to_json().unwrap()).is_ok());
    }

    #[test]
    fn remove_node() {
        let tree = nested();
        let updated = remove_at(&tree, &path(&tree, "g1")).unwrap();
        assert_eq!(ids(updated.root_node()), vec!["g3", "z"]);
        assert!(!updated.contains(&"y".into()));
        assert_eq!(updated.len(), tree.len() - 4);
    }

    #[test]
    fn remove_root_is_rejected() {
        let tree = nested();
        let err = remove_at(&tree, &tree.root_path()).unwrap_err();
        assert_eq!(err, EditError::InvalidRootOperation);
    }

    #[test]
    fn move_same_parent_forward_adjusts_index() {
        let tree = flat();
        // index 2 is the slot before `c` in [a, b, c]
        let moved = move_node(&tree, &"a".into(), &"root".into(), 2).unwrap();
        assert_eq!(ids(moved.root_node()), vec!["b", "a", "c"]);
        // index 3 is the end slot
        let moved = move_node(&tree, &"a".into(), &"root".into(), 3).unwrap();
        assert_eq!(ids(moved.root_node()), vec!["b", "c", "a"]);
    }

    #[test]
    fn move_same_parent_to_adjacent_slot_is_stable() {
        let tree = flat();
        let moved = move_node(&tree, &"a".into(), &"root".into(), 1).unwrap();
        assert_eq!(ids(moved.root_node()), vec!["a", "b", "c"]);
    }

    #[test]
    fn move_same_parent_backward() {
        let tree = flat();
        let moved = move_node(&tree, &"c".into(), &"root".into(), 0).unwrap();
        assert_eq!(ids(moved.root_node()), vec!["c", "a", "b"]);
        let moved = move_node(&tree, &"c".into(), &"root".into(), 1).unwrap();
        assert_eq!(ids(moved.root_node()), vec!["a", "c", "b"]);
    }

    #[test]
    fn move_across_parents() {
        let tree = nested();
        let moved = move_node(&tree, &"z".into(), &"g2".into(), 0).unwrap();
        assert_eq!(ids(moved.root_node()), vec!["g1", "g3"]);
        assert_eq!(ids(moved.node(&"g2".into()).unwrap()), vec!["z", "y"]);
        let count = moved.root_node().iter().filter(|n| n.id().as_str() == "z").count();
        assert_eq!(count, 1);
        assert_eq!(moved.len(), tree.len());
    }

    #[test]
    fn move_group_keeps_its_subtree_shared() {
        let tree = nested();
        let g2 = Arc::clone(tree.node(&"g2".into()).unwrap());
        let moved = move_node(&tree, &"g2".into(), &"g3".into(), 0).unwrap();
        assert!(Arc::ptr_eq(&g2, moved.node(&"g2".into()).unwrap()));
        assert_eq!(moved.find(&"y".into()).unwrap().len(), 4);
    }

    #[test]
    fn move_group_into_itself_rejected() {
        let tree = nested();
        let err = move_node(&tree, &"g1".into(), &"g1".into(), 0).unwrap_err();
        assert!(matches!(err, EditError::CycleRejected { .. }));
    }

    #[test]
    fn move_group_into_descendant_rejected() {
        let tree = nested();
        let err = move_node(&tree, &"g1".into(), &"g2".into(), 0).unwrap_err();
        assert_eq!(
            err,
            EditError::CycleRejected {
                group: "g1".into(),
                destination: "g2".into()
            }
        );
    }

    #[test]
    fn move_root_rejected() {
        let tree = nested();
        let err = move_node(&tree, &"root".into(), &"g3".into(), 0).unwrap_err();
        assert_eq!(err, EditError::InvalidRootOperation);
    }

    #[test]
    fn move_into_filter_rejected() {
        let tree = nested();
        let err = move_node(&tree, &"x".into(), &"z".into(), 0).unwrap_err();
        assert!(matches!(err, EditError::WrongVariant { .. }));
        let err = move_node(&tree, &"x".into(), &"x".into(), 0).unwrap_err();
        assert!(matches!(err, EditError::WrongVariant { .. }));
    }

    #[test]
    fn move_unknown_ids() {
        let tree = nested();
        let err = move_node(&tree, &"nope".into(), &"g3".into(), 0).unwrap_err();
        assert_eq!(err, EditError::PathMismatch { id: "nope".into() });
        let err = move_node(&tree, &"x".into(), &"nope".into(), 0).unwrap_err();
        assert_eq!(err, EditError::PathMismatch { id: "nope".into() });
    }
}
