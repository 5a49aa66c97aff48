use thiserror::Error;

use super::node::{NodeId, NodeKind};

/// Why an edit was rejected.
///
/// Every rejection is soft: the tree the edit was applied to is left
/// untouched and the caller simply keeps using it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error("node '{id}' does not resolve against the current tree")]
    PathMismatch { id: NodeId },

    #[error("node '{id}' is not a {expected}")]
    WrongVariant { id: NodeId, expected: NodeKind },

    #[error("the root group cannot be removed or moved")]
    InvalidRootOperation,

    #[error("moving group '{group}' into '{destination}' would nest it inside itself")]
    CycleRejected { group: NodeId, destination: NodeId },

    #[error("node id '{id}' is already present in the tree")]
    DuplicateId { id: NodeId },

    #[error("node '{id}' is locked or disabled")]
    Locked { id: NodeId },
}

/// Structural invariant violations found while assembling a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("the root of a rule tree must be a group")]
    RootNotGroup,

    #[error("duplicate node id '{id}'")]
    DuplicateId { id: NodeId },
}
