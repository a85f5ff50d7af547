//! Precondition failures.

use thiserror::Error;

/// Why a pass (or a tree build) refused to run.
///
/// These are caller bugs, never findings about the script: malformed
/// scripts are reported as diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The tree has no root node.
    #[error("syntax tree is empty")]
    EmptyTree,

    /// A node handle that does not belong to the tree.
    #[error("node {0} does not exist in this tree")]
    UnknownNode(usize),

    /// The tree builder was finished with nodes still open.
    #[error("tree builder finished with {0} unclosed node(s)")]
    UnclosedNodes(usize),

    /// `finish_node` without a matching `start_node`.
    #[error("finish_node called with no open node")]
    NoOpenNode,

    /// An autoloaded document that can't say which function it expects.
    #[error("document is autoloaded but has no autoload name")]
    MissingAutoloadName,
}
