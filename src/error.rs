use thiserror::Error;

use crate::drag::DragError;
use crate::serial::DumpError;
use crate::types::{EditError, TreeError};

/// Unified error type covering edits, tree validation, drags, dumps and I/O.
///
/// Returned by convenience methods like [`RuleTree::from_file()`](crate::RuleTree::from_file)
/// and [`RuleTree::to_file()`](crate::RuleTree::to_file).
#[derive(Debug, Error)]
pub enum RuleTreeError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error(transparent)]
    Drag(#[from] DragError),

    #[error(transparent)]
    Dump(#[from] DumpError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
