//! Unreachable code.
//!
//! Two independent rules report `unreachableCode`:
//!
//! - A function body statement that follows a statement which always
//!   returns: a bare `return`, or an `if` chain with an `else` where every
//!   branch always returns.
//! - Statements chained onto a command without `&&`/`||`/`and`/`or` before
//!   the next separator.
//!
//! `switch` never counts as always returning, even when every `case`
//! returns and a `'*'` case is present.

use fishlint_types::ErrorCode;

use crate::syntax::{Node, NodeKind};

use super::pass_state::PassState;
use super::rules::Finding;

/// Report a function body statement when an earlier one always returns.
pub fn after_exhaustive_return(node: Node<'_>, _state: &mut PassState) -> Vec<Finding> {
    let Some(function) = node.parent().filter(|p| p.kind() == NodeKind::FunctionDefinition)
    else {
        return Vec::new();
    };

    let mut returns_guaranteed = false;
    for statement in function.body_statements() {
        if statement == node {
            break;
        }
        returns_guaranteed |= always_returns(statement);
    }

    if returns_guaranteed && function.body_statements().any(|s| s == node) {
        vec![Finding::new(node, ErrorCode::UnreachableCode)]
    } else {
        Vec::new()
    }
}

/// Whether control never falls through `node`.
pub fn always_returns(node: Node<'_>) -> bool {
    match node.kind() {
        NodeKind::ReturnStatement => true,
        NodeKind::IfStatement => if_chain_returns(node),

        NodeKind::Program
        | NodeKind::Command
        | NodeKind::Pipeline
        | NodeKind::ConditionalExecution
        | NodeKind::FunctionDefinition
        | NodeKind::ElseIfClause
        | NodeKind::ElseClause
        | NodeKind::SwitchStatement
        | NodeKind::CaseClause
        | NodeKind::ForStatement
        | NodeKind::WhileStatement
        | NodeKind::BeginStatement
        | NodeKind::Word
        | NodeKind::Option
        | NodeKind::VariableDefinition
        | NodeKind::Keyword
        | NodeKind::Operator
        | NodeKind::Terminator
        | NodeKind::Comment
        | NodeKind::Error => false,
    }
}

/// `if` with an `else`, and a return in every branch.
fn if_chain_returns(node: Node<'_>) -> bool {
    let has_else = node
        .named_children()
        .any(|c| c.kind() == NodeKind::ElseClause);
    if !has_else {
        return false;
    }

    branch_returns(node)
        && node
            .named_children()
            .filter(|c| matches!(c.kind(), NodeKind::ElseIfClause | NodeKind::ElseClause))
            .all(branch_returns)
}

fn branch_returns(branch: Node<'_>) -> bool {
    branch.body_statements().any(always_returns)
}

/// Report what follows a command on the same statement without a connector.
pub fn trailing_chain(node: Node<'_>, _state: &mut PassState) -> Vec<Finding> {
    if !matches!(node.kind(), NodeKind::Command | NodeKind::Pipeline) {
        return Vec::new();
    }
    if !node.parent().is_some_and(|p| p.kind().holds_statements()) {
        return Vec::new();
    }

    let mut findings = Vec::new();
    let mut chaining = true;
    let mut next = node.next_sibling();
    while let Some(sibling) = next {
        next = sibling.next_sibling();
        match sibling.kind() {
            NodeKind::Terminator
            | NodeKind::ElseIfClause
            | NodeKind::ElseClause
            | NodeKind::CaseClause
            | NodeKind::Error => break,
            _ if !sibling.is_named() => continue,
            NodeKind::ConditionalExecution if chaining => continue,
            _ => {
                chaining = false;
                findings.push(Finding::new(sibling, ErrorCode::UnreachableCode));
            }
        }
    }
    findings
}
