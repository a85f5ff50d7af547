//! Variable definition flags.
//!
//! Universal variables outlive the script and leak into every fish session,
//! and fish only splits a variable on `:` when it is marked as a path
//! variable, which it does automatically for names ending in `PATH`.

use fishlint_types::ErrorCode;

use crate::syntax::{Field, Node, NodeKind};

use super::pass_state::PassState;
use super::rules::Finding;

/// Check the options given to `set` for the variable it defines.
pub fn check(node: Node<'_>, state: &mut PassState) -> Vec<Finding> {
    if node.kind() != NodeKind::VariableDefinition {
        return Vec::new();
    }

    let name = node.text();
    let flags = options_before(node);
    let mut findings = Vec::new();

    if let Some(flag) = flags.iter().find(|f| is_universal(f.text())) {
        findings.push(Finding::new(*flag, ErrorCode::UniversalVariable));
    }

    let path_flag = flags.iter().find(|f| matches!(f.text(), "--path" | "--unpath"));
    let path_name = name.ends_with("PATH");
    match path_flag {
        None if path_name => findings.push(Finding::new(node, ErrorCode::PathVariable)),
        Some(flag) if !path_name => findings.push(Finding::new(*flag, ErrorCode::PathFlag)),
        _ => {}
    }

    state.add_variable(name);
    findings
}

/// Option arguments between the command name and `node`, in source order.
fn options_before(node: Node<'_>) -> Vec<Node<'_>> {
    let mut options: Vec<Node<'_>> = std::iter::successors(node.prev_named_sibling(), |n| {
        n.prev_named_sibling()
    })
    .take_while(|n| n.field() != Some(Field::Name))
    .filter(|n| n.kind() == NodeKind::Option)
    .collect();
    options.reverse();
    options
}

fn is_universal(flag: &str) -> bool {
    match flag.strip_prefix("--") {
        Some(long) => long == "universal",
        None => flag.strip_prefix('-').is_some_and(|short| short.contains('U')),
    }
}
