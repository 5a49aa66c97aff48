//! Editing session around a rule tree.
//!
//! [`RuleEditor`] owns the current tree version together with the state a
//! user session needs next to it: which filter is open for editing, the drag
//! in progress, and the editor settings. Each intent validates the locking
//! rules, applies one engine operation and swaps in the resulting tree. A
//! rejected intent leaves the tree as it was.
//!
//! Locking rules, per node:
//! - renaming, changing the logic, adding children and deleting a group are
//!   blocked when the group or any ancestor is locked or disabled;
//! - editing or deleting a filter is blocked when any ancestor is locked or
//!   disabled;
//! - collapsing is blocked only under a locked ancestor;
//! - unlocking is blocked only under a disabled ancestor;
//! - disabling is blocked while effectively locked, re-enabling never is.

use std::sync::Arc;

use tracing::debug;

use crate::drag::{Candidate, DragError, DragSession, DropOutcome};
use crate::serial::{self, DumpError};
use crate::settings::EditorSettings;
use crate::types::{
    EditError, Field, Filter, Group, Logic, Node, NodeId, NodeKind, Operator, Path, RuleTree,
};

/// Lock and disable state of one node, inherited state included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Access {
    pub is_root: bool,
    pub locked: bool,
    pub disabled: bool,
    pub ancestor_locked: bool,
    pub ancestor_disabled: bool,
}

impl Access {
    fn of(path: &Path) -> Self {
        let target = path.target();
        let (ancestors, _) = path.nodes().split_at(path.len() - 1);
        let groups = || ancestors.iter().filter_map(|n| n.as_group());
        let own = target.as_group();
        Self {
            is_root: path.is_root(),
            locked: own.is_some_and(|g| g.is_locked),
            disabled: target.is_disabled(),
            ancestor_locked: groups().any(|g| g.is_locked),
            ancestor_disabled: groups().any(|g| g.is_disabled),
        }
    }

    #[must_use]
    pub fn effectively_locked(&self) -> bool {
        self.locked || self.ancestor_locked
    }

    #[must_use]
    pub fn effectively_disabled(&self) -> bool {
        self.disabled || self.ancestor_disabled
    }

    /// Whether a group's own controls (rename, logic, add, delete) are off.
    #[must_use]
    pub fn controls_blocked(&self) -> bool {
        self.effectively_locked() || self.effectively_disabled()
    }

    /// Whether the enclosing groups block edits to this node.
    #[must_use]
    pub fn parent_blocked(&self) -> bool {
        self.ancestor_locked || self.ancestor_disabled
    }
}

#[derive(Debug)]
pub struct RuleEditor {
    tree: RuleTree,
    editing: Option<NodeId>,
    drag: DragSession,
    settings: EditorSettings,
}

impl Default for RuleEditor {
    fn default() -> Self {
        Self::with_settings(EditorSettings::default())
    }
}

impl RuleEditor {
    /// Edit an existing tree with default settings.
    #[must_use]
    pub fn new(tree: RuleTree) -> Self {
        Self::from_parts(tree, EditorSettings::default())
    }

    /// Start from an empty root group named by `settings`.
    #[must_use]
    pub fn with_settings(settings: EditorSettings) -> Self {
        let tree = RuleTree::from_root(Arc::new(Node::Group(Group::new(
            settings.root_group_name.as_str(),
        ))));
        Self::from_parts(tree, settings)
    }

    #[must_use]
    pub fn from_parts(tree: RuleTree, settings: EditorSettings) -> Self {
        Self {
            tree,
            editing: None,
            drag: DragSession::new(),
            settings,
        }
    }

    #[must_use]
    pub fn tree(&self) -> &RuleTree {
        &self.tree
    }

    #[must_use]
    pub fn settings(&self) -> &EditorSettings {
        &self.settings
    }

    /// The filter currently open for editing.
    #[must_use]
    pub fn editing(&self) -> Option<&NodeId> {
        self.editing.as_ref()
    }

    #[must_use]
    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    /// # Errors
    ///
    /// Returns [`EditError::PathMismatch`] if `id` is not in the tree.
    pub fn access(&self, id: &NodeId) -> Result<Access, EditError> {
        Ok(Access::of(&self.path(id)?))
    }

    /// # Errors
    ///
    /// Fails if `id` is not a group or its controls are blocked.
    pub fn rename_group(&mut self, id: &NodeId, name: &str) -> Result<(), EditError> {
        let path = self.group_controls(id)?;
        let name = if name.is_empty() {
            self.settings.untitled_group_name.clone()
        } else {
            name.to_owned()
        };
        self.commit(self.tree.update_at(&path, |mut g: Group| {
            g.name = name;
            g
        }))
    }

    /// # Errors
    ///
    /// Fails if `id` is not a group or its controls are blocked.
    pub fn set_logic(&mut self, id: &NodeId, logic: Logic) -> Result<(), EditError> {
        let path = self.group_controls(id)?;
        self.commit(self.tree.update_at(&path, |mut g: Group| {
            g.logic = logic;
            g
        }))
    }

    /// # Errors
    ///
    /// Fails if `id` is not a group or an ancestor is locked.
    pub fn toggle_collapsed(&mut self, id: &NodeId) -> Result<(), EditError> {
        let path = self.path(id)?;
        let access = Access::of(&path);
        if access.ancestor_locked {
            return Err(EditError::Locked { id: id.clone() });
        }
        self.commit(self.tree.update_at(&path, |mut g: Group| {
            g.is_collapsed = !g.is_collapsed;
            g
        }))
    }

    /// # Errors
    ///
    /// Fails if `id` is not a group, or it is locked under a disabled
    /// ancestor.
    pub fn toggle_locked(&mut self, id: &NodeId) -> Result<(), EditError> {
        let path = self.path(id)?;
        let access = Access::of(&path);
        if access.ancestor_disabled && access.locked {
            return Err(EditError::Locked { id: id.clone() });
        }
        self.commit(self.tree.update_at(&path, |mut g: Group| {
            g.is_locked = !g.is_locked;
            g
        }))
    }

    /// Toggle a group's or filter's disabled flag.
    ///
    /// # Errors
    ///
    /// Fails when disabling a node that is effectively locked.
    pub fn toggle_disabled(&mut self, id: &NodeId) -> Result<(), EditError> {
        let path = self.path(id)?;
        let access = Access::of(&path);
        if access.effectively_locked() && !access.disabled {
            return Err(EditError::Locked { id: id.clone() });
        }
        let result = match path.target().kind() {
            NodeKind::Group => self.tree.update_at(&path, |mut g: Group| {
                g.is_disabled = !g.is_disabled;
                g
            }),
            NodeKind::Filter => self.tree.update_at(&path, |mut f: Filter| {
                f.is_disabled = !f.is_disabled;
                f
            }),
        };
        self.commit(result)
    }

    /// Append a blank filter to `parent` and open it for editing.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is not a group or its controls are blocked.
    pub fn add_filter(&mut self, parent: &NodeId) -> Result<NodeId, EditError> {
        let path = self.group_controls(parent)?;
        let filter = Filter::blank();
        let id = filter.id().clone();
        self.commit(self.tree.insert_into(&path, filter, None))?;
        self.editing = Some(id.clone());
        Ok(id)
    }

    /// Append an empty group named by the settings to `parent`.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is not a group or its controls are blocked.
    pub fn add_group(&mut self, parent: &NodeId) -> Result<NodeId, EditError> {
        let path = self.group_controls(parent)?;
        let group = Group::new(self.settings.new_group_name.as_str());
        let id = group.id().clone();
        self.commit(self.tree.insert_into(&path, group, None))?;
        Ok(id)
    }

    /// Remove a node. Closes the filter editor if the edited filter went
    /// away with it.
    ///
    /// # Errors
    ///
    /// Fails for the root, or when the node's edits are blocked.
    pub fn delete(&mut self, id: &NodeId) -> Result<(), EditError> {
        let path = self.path(id)?;
        let access = Access::of(&path);
        if access.is_root {
            return Err(EditError::InvalidRootOperation);
        }
        let blocked = match path.target().kind() {
            NodeKind::Group => access.controls_blocked(),
            NodeKind::Filter => access.parent_blocked(),
        };
        if blocked {
            return Err(EditError::Locked { id: id.clone() });
        }
        self.commit(self.tree.remove_at(&path))?;
        if self.editing.as_ref().is_some_and(|e| !self.tree.contains(e)) {
            debug!("edited filter removed, closing editor");
            self.editing = None;
        }
        Ok(())
    }

    /// Open a filter for editing, closing any other.
    ///
    /// # Errors
    ///
    /// Fails if `id` is not a filter or its parent blocks edits.
    pub fn start_edit(&mut self, id: &NodeId) -> Result<(), EditError> {
        self.filter_controls(id)?;
        self.editing = Some(id.clone());
        Ok(())
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Store new field, operator and value on a filter and close the editor.
    ///
    /// # Errors
    ///
    /// Fails if `id` is not a filter or its parent blocks edits.
    pub fn save_filter(
        &mut self,
        id: &NodeId,
        field: Field,
        operator: Operator,
        value: &str,
    ) -> Result<(), EditError> {
        let path = self.filter_controls(id)?;
        self.commit(self.tree.update_at(&path, |mut f: Filter| {
            f.field = field;
            f.operator = operator;
            f.value = value.to_owned();
            f
        }))?;
        self.editing = None;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`DragError`] if a drag is running, the node is unknown, is
    /// the root, or sits in a locked or disabled group.
    pub fn drag_start(&mut self, id: &NodeId) -> Result<(), DragError> {
        let access = self
            .access(id)
            .map_err(|_| DragError::Unknown { id: id.clone() })?;
        if access.parent_blocked() {
            return Err(DragError::Locked { id: id.clone() });
        }
        self.drag.start(&self.tree, id)
    }

    pub fn drag_cancel(&mut self) {
        self.drag.cancel();
    }

    /// Finish the drag. A drop into a locked or disabled group is refused.
    pub fn drag_end(&mut self, candidates: &[Candidate]) -> DropOutcome {
        let tree = &self.tree;
        let outcome = self.drag.end_with(tree, candidates, |target| {
            let path = tree
                .find(&target.parent_id)
                .ok_or_else(|| EditError::PathMismatch {
                    id: target.parent_id.clone(),
                })?;
            if Access::of(&path).controls_blocked() {
                return Err(EditError::Locked {
                    id: target.parent_id.clone(),
                });
            }
            Ok(())
        });
        if let DropOutcome::Moved(moved) = &outcome {
            self.tree = moved.clone();
        }
        outcome
    }

    #[must_use]
    pub fn expression(&self) -> String {
        self.tree.expression()
    }

    /// The expression, or the configured placeholder when it is empty.
    #[must_use]
    pub fn display_expression(&self) -> String {
        let expr = self.tree.expression();
        if expr.is_empty() {
            self.settings.empty_expression_message.clone()
        } else {
            expr
        }
    }

    /// Pretty JSON dump of the current tree.
    ///
    /// # Errors
    ///
    /// Returns [`DumpError`] if encoding fails.
    pub fn dump(&self) -> Result<String, DumpError> {
        serial::to_json_pretty(&self.tree)
    }

    fn path(&self, id: &NodeId) -> Result<Path, EditError> {
        self.tree
            .find(id)
            .ok_or_else(|| EditError::PathMismatch { id: id.clone() })
    }

    fn group_controls(&self, id: &NodeId) -> Result<Path, EditError> {
        let path = self.path(id)?;
        if !path.target().is_group() {
            return Err(EditError::WrongVariant {
                id: id.clone(),
                expected: NodeKind::Group,
            });
        }
        if Access::of(&path).controls_blocked() {
            return Err(EditError::Locked { id: id.clone() });
        }
        Ok(path)
    }

    fn filter_controls(&self, id: &NodeId) -> Result<Path, EditError> {
        let path = self.path(id)?;
        if path.target().is_group() {
            return Err(EditError::WrongVariant {
                id: id.clone(),
                expected: NodeKind::Filter,
            });
        }
        if Access::of(&path).parent_blocked() {
            return Err(EditError::Locked { id: id.clone() });
        }
        Ok(path)
    }

    fn commit(&mut self, result: Result<RuleTree, EditError>) -> Result<(), EditError> {
        self.tree = result?;
        Ok(())
    }
}
