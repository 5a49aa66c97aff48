//! JSON dump of a rule tree.
//!
//! The dump is the plain nested-object form of the tree:
//!
//! ```text
//! {
//!   "type": "GROUP", "id": "…", "name": "Root group", "logic": "AND",
//!   "isLocked": false, "isDisabled": false, "isCollapsed": false,
//!   "children": [
//!     { "type": "FILTER", "id": "…", "field": "name",
//!       "operator": "contains", "value": "Roma", "isDisabled": false }
//!   ]
//! }
//! ```
//!
//! Reading a dump validates the tree invariants: the root must be a group
//! and ids must be unique. Ids are preserved, so a round trip yields an
//! equal tree.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::types::{Node, RuleTree, TreeError};

/// Errors produced when converting a tree to or from JSON.
#[derive(Debug, Error)]
pub enum DumpError {
    #[error("malformed rule tree JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid rule tree: {0}")]
    Invalid(#[from] TreeError),
}

/// # Errors
///
/// Returns [`DumpError::Json`] if encoding fails.
pub fn to_json(tree: &RuleTree) -> Result<String, DumpError> {
    Ok(serde_json::to_string(tree)?)
}

/// # Errors
///
/// Returns [`DumpError::Json`] if encoding fails.
pub fn to_json_pretty(tree: &RuleTree) -> Result<String, DumpError> {
    Ok(serde_json::to_string_pretty(tree)?)
}

/// # Errors
///
/// Returns [`DumpError::Json`] for malformed input and
/// [`DumpError::Invalid`] when the decoded tree breaks an invariant.
pub fn from_json(input: &str) -> Result<RuleTree, DumpError> {
    // Every group level costs two JSON nesting levels, so the default limit
    // would reject trees the engine builds.
    let mut de = serde_json::Deserializer::from_str(input);
    de.disable_recursion_limit();
    let node = Node::deserialize(&mut de)?;
    de.end()?;
    Ok(RuleTree::try_from(node)?)
}

impl Serialize for RuleTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root_node().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RuleTree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = Node::deserialize(deserializer)?;
        RuleTree::try_from(node).map_err(D::Error::custom)
    }
}
