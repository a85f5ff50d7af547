//! `end` balance on error nodes.
//!
//! The parser wraps anything it could not close or place in an error node.
//! These rules explain the most common causes: a block that never got its
//! `end`, and an `end` with no block to close.

use fishlint_types::ErrorCode;

use crate::parser::BLOCK_OPENERS;
use crate::syntax::{Node, NodeKind};

use super::pass_state::PassState;
use super::rules::Finding;

/// Classify an error node. Other nodes are none of this rule's business.
pub fn check(node: Node<'_>, _state: &mut PassState) -> Vec<Finding> {
    if !node.is_error() {
        return Vec::new();
    }

    if opens_block(node) && !ends_with_end(node) {
        return vec![Finding::new(node, ErrorCode::MissingEnd)];
    }
    if let Some(extra) = unmatched_end(node) {
        return vec![Finding::new(extra, ErrorCode::ExtraEnd)];
    }
    vec![Finding::new(node, ErrorCode::SyntaxError)]
}

/// The keyword that opened the block this error node stands for.
pub fn opener(node: Node<'_>) -> Option<&str> {
    node.children()
        .filter(|c| c.kind() == NodeKind::Keyword)
        .map(|c| c.text())
        .find(|word| BLOCK_OPENERS.contains(word))
}

fn opens_block(node: Node<'_>) -> bool {
    opener(node).is_some()
}

fn ends_with_end(node: Node<'_>) -> bool {
    [node.last_child(), node.last_named_child()]
        .into_iter()
        .flatten()
        .any(|n| n.is_keyword("end"))
}

/// First `end` keyword among the children with no opener before it.
fn unmatched_end(node: Node<'_>) -> Option<Node<'_>> {
    let mut depth = 0usize;
    for child in node.children().filter(|c| c.kind() == NodeKind::Keyword) {
        let word = child.text();
        if BLOCK_OPENERS.contains(&word) {
            depth += 1;
        } else if word == "end" {
            match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return Some(child),
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::syntax::{SyntaxTree, TreeBuilder};
    use fishlint_types::Span;

    fn run(tree: &SyntaxTree) -> Vec<(ErrorCode, String)> {
        let mut state = PassState::new();
        tree.root()
            .unwrap()
            .preorder()
            .flat_map(|n| check(n, &mut state))
            .map(|f| (f.code, tree.get(f.node).unwrap().text().to_string()))
            .collect()
    }

    #[test]
    fn unclosed_if_is_missing_end() {
        let tree = parse("if true; echo hi").unwrap();
        assert_eq!(run(&tree), [(ErrorCode::MissingEnd, "if true; echo hi".into())]);
    }

    #[test]
    fn unclosed_function_around_closed_if() {
        let tree = parse("function f\n  if x\n    echo\n  end\n").unwrap();
        let found = run(&tree);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, ErrorCode::MissingEnd);
        assert!(found[0].1.starts_with("function f"));
    }

    #[test]
    fn stray_end_is_extra() {
        let tree = parse("echo hi\nend\n").unwrap();
        assert_eq!(run(&tree), [(ErrorCode::ExtraEnd, "end".into())]);
    }

    #[test]
    fn stray_else_is_a_syntax_error() {
        let tree = parse("else\n").unwrap();
        assert_eq!(run(&tree), [(ErrorCode::SyntaxError, "else".into())]);
    }

    #[test]
    fn leading_connector_is_a_syntax_error() {
        let tree = parse("&& echo hi").unwrap();
        assert_eq!(run(&tree), [(ErrorCode::SyntaxError, "&& echo hi".into())]);
    }

    #[test]
    fn well_formed_source_is_quiet() {
        let tree = parse("function f; if a; echo; else; echo; end; end").unwrap();
        assert!(run(&tree).is_empty());
    }

    #[test]
    fn error_closed_by_end_with_extra() {
        // (ERROR begin end end): balanced pair, then one too many
        let mut b = TreeBuilder::new("begin end end");
        b.start_node(NodeKind::Program, None);
        b.start_node(NodeKind::Error, None);
        b.token(NodeKind::Keyword, None, Span::new(0, 5));
        b.token(NodeKind::Keyword, None, Span::new(6, 9));
        b.token(NodeKind::Keyword, None, Span::new(10, 13));
        b.finish_node();
        b.finish_node();
        let tree = b.finish().unwrap();

        let found = run(&tree);
        assert_eq!(found, [(ErrorCode::ExtraEnd, "end".into())]);
        let node = tree.root().unwrap().first_child().unwrap();
        let extra = unmatched_end(node).unwrap();
        assert_eq!(extra.span(), Span::new(10, 13));
    }

    #[test]
    fn opener_names_the_block() {
        let tree = parse("while true\n  echo").unwrap();
        let err = tree.root().unwrap().first_child().unwrap();
        assert_eq!(opener(err), Some("while"));
    }
}
