mod error;
mod expr;
mod node;
mod path;
mod tree;

pub use error::{EditError, TreeError};
pub use expr::{Field, Logic, Operator};
pub use node::{Filter, Group, Node, NodeId, NodeKind, Nodes, Variant};
pub use path::Path;
pub use tree::{GroupBuilder, RuleTree};
