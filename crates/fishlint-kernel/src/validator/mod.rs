//! Diagnostic rule engine for fish syntax trees.
//!
//! A pass runs a pre-pass over function names, then walks the tree once.
//! It reports:
//!
//! - **Block balance**: a block missing its `end`, an `end` too many, or any
//!   other malformed source the parser had to wrap in an error node
//! - **Function naming**: duplicates, autoloaded files not defining their
//!   own function first, helpers missing the `_` prefix
//! - **Variable flags**: universal variables, and `PATH` names vs `--path`
//! - **Reachability**: statements after a guaranteed `return`, or chained
//!   onto a command without a connector
//!
//! Each node gets diagnostics from at most one rule. Rules are tried in the
//! order above and the first with something to say wins. Naming runs in the
//! pre-pass, so its diagnostics come first.
//!
//! # Example
//!
//! ```
//! use fishlint_kernel::{diagnose, parse, Document, ErrorCode};
//!
//! let tree = parse("set -U EDITOR vim").unwrap();
//! let diagnostics = diagnose(&tree, &Document::anonymous()).unwrap();
//! assert_eq!(diagnostics[0].code, ErrorCode::UniversalVariable);
//! ```

mod block_balance;
mod issue;
mod naming;
mod pass_state;
mod reachability;
mod rules;
mod variables;
mod walker;

pub use issue::{CodeTable, DiagnosticFactory};
pub use pass_state::PassState;
pub use reachability::always_returns;
pub use rules::Finding;
pub use walker::Validator;

use fishlint_types::{AnalysisError, Diagnostic};

use crate::document::SourceDocument;
use crate::syntax::SyntaxTree;

/// Run one pass with the default messages.
pub fn diagnose(
    tree: &SyntaxTree,
    document: &dyn SourceDocument,
) -> Result<Vec<Diagnostic>, AnalysisError> {
    Validator::new(tree, document).validate()
}
