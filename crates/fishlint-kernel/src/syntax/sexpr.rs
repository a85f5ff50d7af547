//! S-expression dump of a syntax tree, for tests and `--dump-tree`.
//!
//! Only named nodes are printed. Leaves carry their text, fields prefix the
//! child they label:
//!
//! ```text
//! (program (command name: (word "set") argument: (option "-U") argument: (variable_definition "X")))
//! ```

use super::Node;

/// Format the subtree rooted at `node`.
pub fn format(node: Node<'_>) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: Node<'_>, out: &mut String) {
    out.push('(');
    out.push_str(node.kind().name());

    let mut named = node.named_children().peekable();
    if named.peek().is_none() {
        out.push_str(&format!(" {:?}", node.text()));
    }

    for child in named {
        out.push(' ');
        if let Some(field) = child.field() {
            out.push_str(field.name());
            out.push_str(": ");
        }
        write_node(child, out);
    }

    out.push(')');
}
