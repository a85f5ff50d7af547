//! Turning findings into diagnostics.

use fishlint_types::{Diagnostic, ErrorCode};

use crate::document::SourceDocument;
use crate::syntax::{Node, NodeKind};

use super::block_balance;

/// Builds the diagnostic for a finding anchored on `node`.
///
/// The validator only decides *what* is wrong and *where*; the wording is up
/// to the factory, so embedders can supply their own.
pub trait DiagnosticFactory {
    fn create(&self, node: Node<'_>, code: ErrorCode, document: &dyn SourceDocument) -> Diagnostic;
}

/// Default messages, filled in with names from the tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeTable;

impl DiagnosticFactory for CodeTable {
    fn create(&self, node: Node<'_>, code: ErrorCode, document: &dyn SourceDocument) -> Diagnostic {
        let text = node.text();
        let message = match code {
            ErrorCode::MissingEnd => match block_balance::opener(node) {
                Some(opener) => format!("missing 'end' for this '{opener}' block"),
                None => code.message().to_string(),
            },
            ErrorCode::ExtraEnd => "'end' without a block to close".to_string(),
            ErrorCode::SyntaxError => {
                let first = text.lines().next().unwrap_or("");
                format!("unexpected '{first}'")
            }
            ErrorCode::UnreachableCode => code.message().to_string(),
            ErrorCode::DuplicateFunctionName => {
                format!("function '{text}' is already defined in this file")
            }
            ErrorCode::MissingAutoloadedFunctionName => format!(
                "autoloaded file should define '{}' first, found '{text}'",
                document.autoload_name()
            ),
            ErrorCode::PrivateHelperFunction => {
                format!("helper function '{text}' should be named '_{text}'")
            }
            ErrorCode::UniversalVariable => format!(
                "'{text}' makes '{}' universal, shared with every fish session",
                defined_name(node).unwrap_or("the variable")
            ),
            ErrorCode::PathVariable => {
                format!("'{text}' ends in PATH; define it with --path")
            }
            ErrorCode::PathFlag => format!(
                "'{text}' used on '{}', which does not end in PATH",
                defined_name(node).unwrap_or("a variable")
            ),
        };
        Diagnostic::new(code, node.span()).with_message(message)
    }
}

/// The variable defined by the command `flag` belongs to.
fn defined_name<'t>(flag: Node<'t>) -> Option<&'t str> {
    flag.parent()?
        .named_children()
        .find(|c| c.kind() == NodeKind::VariableDefinition)
        .map(|c| c.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::parser::parse;
    use fishlint_types::{Severity, Span};

    fn first_of(source: &str, kind: NodeKind, code: ErrorCode) -> Diagnostic {
        let tree = parse(source).unwrap();
        let node = tree
            .root()
            .unwrap()
            .preorder()
            .find(|n| n.kind() == kind)
            .unwrap();
        let doc = Document::anonymous().with_autoload_name("foo");
        CodeTable.create(node, code, &doc)
    }

    #[test]
    fn messages_name_the_offender() {
        let d = first_of("set -U EDITOR vim", NodeKind::Option, ErrorCode::UniversalVariable);
        assert_eq!(d.message, "'-U' makes 'EDITOR' universal, shared with every fish session");
        assert_eq!(d.span, Span::new(4, 6));
        assert_eq!(d.severity, Severity::Warning);

        let d = first_of("set --path X", NodeKind::Option, ErrorCode::PathFlag);
        assert_eq!(d.message, "'--path' used on 'X', which does not end in PATH");

        let d = first_of("function bar; end", NodeKind::Word, ErrorCode::MissingAutoloadedFunctionName);
        assert_eq!(d.message, "autoloaded file should define 'foo' first, found 'bar'");
    }

    #[test]
    fn missing_end_names_the_block() {
        let d = first_of("for x in a b\n echo $x", NodeKind::Error, ErrorCode::MissingEnd);
        assert_eq!(d.message, "missing 'end' for this 'for' block");
        assert_eq!(d.severity, Severity::Error);
    }

    #[test]
    fn syntax_error_quotes_first_line() {
        let d = first_of("else\necho", NodeKind::Error, ErrorCode::SyntaxError);
        assert_eq!(d.message, "unexpected 'else'");
    }
}
