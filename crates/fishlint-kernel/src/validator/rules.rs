//! Detector chain.
//!
//! A detector looks at one node and returns the findings it wants to report.
//! The walk asks each detector in order and keeps the first non-empty answer,
//! so a node gets diagnostics from at most one rule.

use fishlint_types::ErrorCode;

use crate::syntax::{Node, NodeId};

use super::pass_state::PassState;
use super::{block_balance, reachability, variables};

/// A problem found by a rule: what it is and where to anchor it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finding {
    pub node: NodeId,
    pub code: ErrorCode,
}

impl Finding {
    pub fn new(node: Node<'_>, code: ErrorCode) -> Self {
        Self {
            node: node.id(),
            code,
        }
    }
}

/// A rule evaluated on every node of the walk.
pub type Detector = fn(Node<'_>, &mut PassState) -> Vec<Finding>;

/// Rules applied during the walk, highest precedence first.
///
/// Function-name rules sit between block balance and variable flags. They
/// run in the pre-pass instead, since no rule below can match a name node.
pub const WALK_DETECTORS: &[(&str, Detector)] = &[
    ("block_balance", block_balance::check),
    ("variable_flags", variables::check),
    ("exhaustive_return", reachability::after_exhaustive_return),
    ("trailing_chain", reachability::trailing_chain),
];

/// Ask each detector in turn. The first one with something to say wins.
pub fn first_match(
    detectors: &[(&str, Detector)],
    node: Node<'_>,
    state: &mut PassState,
) -> Vec<Finding> {
    for (name, detect) in detectors {
        let findings = detect(node, state);
        if !findings.is_empty() {
            tracing::trace!(rule = *name, node = ?node, count = findings.len(), "rule matched");
            return findings;
        }
    }
    Vec::new()
}
