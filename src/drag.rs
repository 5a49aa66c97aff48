//! Drop-target resolution for drag reordering.
//!
//! Hit-testing happens elsewhere; this module receives the collision
//! candidates it produced, picks one, turns it into a `(parent, index)`
//! target and applies at most one [`move_node`](crate::move_node). The move
//! re-checks cycles on its own, so nothing here has to trust the candidate
//! set.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::{EditError, Node, NodeId, RuleTree};

/// A drop-target proposal from the hit-testing layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// The body of a group: drop inside it.
    InnerDropZone { group_id: NodeId },
    /// A filter or group row.
    Item { item_id: NodeId, is_group: bool },
    /// The root container.
    Root,
}

impl Candidate {
    fn rank(&self) -> u8 {
        match self {
            Candidate::InnerDropZone { .. } => 0,
            Candidate::Item { .. } => 1,
            Candidate::Root => 2,
        }
    }
}

/// Where a dropped node goes: before position `index` of `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTarget {
    pub parent_id: NodeId,
    pub index: usize,
}

/// Pick the winning candidate: inner drop zones beat items, items beat the
/// root. Ties go to the earliest candidate.
#[must_use]
pub fn select_candidate(candidates: &[Candidate]) -> Option<&Candidate> {
    candidates.iter().min_by_key(|c| c.rank())
}

/// Resolve the winning candidate against the live tree.
///
/// Returns `None` when there is no candidate, when the winner no longer
/// resolves, or when the dragged node is hovering over itself.
#[must_use]
pub fn resolve_target(
    tree: &RuleTree,
    dragged: &NodeId,
    candidates: &[Candidate],
) -> Option<DropTarget> {
    let winner = select_candidate(candidates)?;
    let target = match winner {
        Candidate::InnerDropZone { group_id } => end_of(tree, group_id),
        Candidate::Item { item_id, .. } if item_id == dragged => {
            debug!(%dragged, "dropped onto itself");
            return None;
        }
        Candidate::Item { item_id, is_group } => {
            let located = tree.locate(item_id);
            match located {
                Some(l) if *is_group && l.node.is_group() => end_of(tree, item_id),
                Some(l) => l.parent_id().cloned().zip(l.index).map(|(parent_id, index)| {
                    DropTarget { parent_id, index }
                }),
                None => None,
            }
        }
        Candidate::Root => end_of(tree, tree.root_id()),
    };
    if target.is_none() {
        warn!(?winner, "drop candidate does not resolve against the current tree");
    }
    target
}

fn end_of(tree: &RuleTree, group_id: &NodeId) -> Option<DropTarget> {
    let group = tree.node(group_id)?.as_group()?;
    Some(DropTarget {
        parent_id: group_id.clone(),
        index: group.children().len(),
    })
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DragError {
    #[error("a drag of '{id}' is already in progress")]
    AlreadyDragging { id: NodeId },

    #[error("node '{id}' is not in the tree")]
    Unknown { id: NodeId },

    #[error("the root group cannot be dragged")]
    Root,

    #[error("node '{id}' sits in a locked or disabled group")]
    Locked { id: NodeId },
}

#[derive(Debug, Clone, Default)]
pub enum DragState {
    #[default]
    Idle,
    /// Holds a snapshot of the dragged node for overlay display. The
    /// snapshot is never used to mutate the tree.
    Dragging { node: Arc<Node> },
}

/// What a finished drag did.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub enum DropOutcome {
    Moved(RuleTree),
    NoTarget,
    Rejected(EditError),
    NotDragging,
}

/// `Idle -> Dragging -> Idle` drag lifecycle.
#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> &DragState {
        &self.state
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// The dragged node as it was when the drag started.
    #[must_use]
    pub fn overlay(&self) -> Option<&Arc<Node>> {
        match &self.state {
            DragState::Dragging { node } => Some(node),
            DragState::Idle => None,
        }
    }

    /// # Errors
    ///
    /// Returns [`DragError`] if a drag is already running, the node is not
    /// in `tree`, or it is the root.
    pub fn start(&mut self, tree: &RuleTree, id: &NodeId) -> Result<(), DragError> {
        if let DragState::Dragging { node } = &self.state {
            return Err(DragError::AlreadyDragging {
                id: node.id().clone(),
            });
        }
        let located = tree
            .locate(id)
            .ok_or_else(|| DragError::Unknown { id: id.clone() })?;
        if located.is_root() {
            return Err(DragError::Root);
        }
        debug!(%id, "drag started");
        self.state = DragState::Dragging {
            node: Arc::clone(located.node),
        };
        Ok(())
    }

    pub fn cancel(&mut self) {
        if self.is_dragging() {
            debug!("drag cancelled");
        }
        self.state = DragState::Idle;
    }

    /// Finish the drag and apply the resolved move to `tree`.
    pub fn end(&mut self, tree: &RuleTree, candidates: &[Candidate]) -> DropOutcome {
        self.end_with(tree, candidates, |_| Ok(()))
    }

    /// Like [`end`](Self::end), with a caller check that can veto the
    /// resolved target before the move.
    pub fn end_with(
        &mut self,
        tree: &RuleTree,
        candidates: &[Candidate],
        check: impl FnOnce(&DropTarget) -> Result<(), EditError>,
    ) -> DropOutcome {
        let DragState::Dragging { node } = std::mem::take(&mut self.state) else {
            return DropOutcome::NotDragging;
        };
        let dragged = node.id();
        let Some(target) = resolve_target(tree, dragged, candidates) else {
            return DropOutcome::NoTarget;
        };
        if let Err(err) = check(&target) {
            warn!(%dragged, %err, "drop vetoed");
            return DropOutcome::Rejected(err);
        }
        match tree.move_node(dragged, &target.parent_id, target.index) {
            Ok(moved) => DropOutcome::Moved(moved),
            Err(err) => DropOutcome::Rejected(err),
        }
    }
}
