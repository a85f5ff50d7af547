//! Function naming.
//!
//! Runs over every function name in the document before the main walk, so
//! duplicates are judged against all earlier definitions in source order.

use fishlint_types::ErrorCode;

use crate::document::SourceDocument;
use crate::syntax::{Field, Node, NodeKind};

use super::pass_state::PassState;
use super::rules::Finding;

/// Name nodes of all function definitions under `root`, in source order.
pub fn function_names<'t>(root: Node<'t>) -> impl Iterator<Item = Node<'t>> + 't {
    root.preorder()
        .filter(|n| n.kind() == NodeKind::FunctionDefinition)
        .filter_map(|f| f.child_by_field(Field::Name))
}

/// Check one function name and record it.
pub fn check(name: Node<'_>, document: &dyn SourceDocument, state: &mut PassState) -> Vec<Finding> {
    let text = name.text();
    let mut findings = Vec::new();

    if state.has_function(text) {
        findings.push(Finding::new(name, ErrorCode::DuplicateFunctionName));
    }

    let misnamed_autoload = document.is_autoloaded()
        && state.no_functions_yet()
        && text != document.autoload_name();
    if misnamed_autoload {
        findings.push(Finding::new(name, ErrorCode::MissingAutoloadedFunctionName));
    }

    if !text.starts_with('_') && !misnamed_autoload {
        findings.push(Finding::new(name, ErrorCode::PrivateHelperFunction));
    }

    state.add_function(text);
    findings
}
