mod compile;
mod drag;
mod editor;
mod error;
mod mutate;
mod resolve;
mod serial;
mod settings;
mod types;

pub use compile::{compile, compile_node};
pub use drag::{
    resolve_target, select_candidate, Candidate, DragError, DragSession, DragState, DropOutcome,
    DropTarget,
};
pub use editor::{Access, RuleEditor};
pub use error::RuleTreeError;
pub use mutate::{insert_into, move_node, remove_at, update_at};
pub use resolve::{ancestors, find, resolve_live, Located};
pub use serial::{from_json, to_json, to_json_pretty, DumpError};
pub use settings::EditorSettings;
pub use types::{
    EditError, Field, Filter, Group, GroupBuilder, Logic, Node, NodeId, NodeKind, Nodes, Operator,
    Path, RuleTree, TreeError, Variant,
};
