use crate::types::Node;

/// Compile `node` into its boolean expression.
#[must_use]
pub fn compile_node(node: &Node) -> String {
    compile(node, false)
}

/// Recursive reducer behind [`compile_node`].
///
/// A node that is disabled, or sits under a disabled ancestor
/// (`inherited_disabled`), contributes nothing. Groups drop empty children,
/// return a single survivor unwrapped, and parenthesize two or more joined
/// by their logic keyword.
#[must_use]
pub fn compile(node: &Node, inherited_disabled: bool) -> String {
    if inherited_disabled || node.is_disabled() {
        return String::new();
    }
    match node {
        Node::Filter(filter) => filter.to_string(),
        Node::Group(group) => {
            let mut clauses: Vec<String> = group
                .children()
                .iter()
                .map(|child| compile(child, false))
                .filter(|expr| !expr.is_empty())
                .collect();
            match clauses.len() {
                0 => String::new(),
                1 => clauses.swap_remove(0),
                _ => format!("({})", clauses.join(&format!(" {} ", group.logic))),
            }
        }
    }
}
