//! Tree walker for the diagnostic pass.

use fishlint_types::{AnalysisError, Diagnostic};

use crate::document::SourceDocument;
use crate::syntax::{Node, SyntaxTree};

use super::issue::{CodeTable, DiagnosticFactory};
use super::naming;
use super::pass_state::PassState;
use super::rules::{self, Finding};

/// Runs every rule over one tree.
pub struct Validator<'a> {
    /// Tree being checked.
    tree: &'a SyntaxTree,
    /// Document the tree was parsed from.
    document: &'a dyn SourceDocument,
    /// Wording of the emitted diagnostics.
    factory: &'a dyn DiagnosticFactory,
}

impl<'a> Validator<'a> {
    /// Create a validator with the default messages.
    pub fn new(tree: &'a SyntaxTree, document: &'a dyn SourceDocument) -> Self {
        Self {
            tree,
            document,
            factory: &CodeTable,
        }
    }

    /// Use another diagnostic factory.
    pub fn with_factory(mut self, factory: &'a dyn DiagnosticFactory) -> Self {
        self.factory = factory;
        self
    }

    /// Run a pass and return its diagnostics in encounter order.
    pub fn validate(&self) -> Result<Vec<Diagnostic>, AnalysisError> {
        self.validate_with_state().map(|(diagnostics, _)| diagnostics)
    }

    /// Run a pass, also handing back the names it collected.
    ///
    /// Each call starts from an empty [`PassState`], so two passes never
    /// see each other's names.
    pub fn validate_with_state(&self) -> Result<(Vec<Diagnostic>, PassState), AnalysisError> {
        self.document.check()?;
        let root = self.tree.require_root()?;

        let span = tracing::debug_span!("diagnostic_pass", nodes = self.tree.len());
        let _guard = span.enter();

        let mut state = PassState::new();
        let mut diagnostics = Vec::new();

        for name in naming::function_names(root) {
            let findings = naming::check(name, self.document, &mut state);
            self.emit(findings, &mut diagnostics)?;
        }

        let mut visited = 0usize;
        for node in root.preorder() {
            visited += 1;
            let findings = rules::first_match(rules::WALK_DETECTORS, node, &mut state);
            self.emit(findings, &mut diagnostics)?;
        }

        tracing::debug!(
            visited,
            diagnostics = diagnostics.len(),
            functions = state.function_names().len(),
            "diagnostic pass finished"
        );
        Ok((diagnostics, state))
    }

    fn emit(&self, findings: Vec<Finding>, out: &mut Vec<Diagnostic>) -> Result<(), AnalysisError> {
        for finding in findings {
            let node: Node<'_> = self.tree.get(finding.node)?;
            let diagnostic = self.factory.create(node, finding.code, self.document);
            tracing::trace!(
                code = finding.code.code(),
                start = diagnostic.span.start,
                end = diagnostic.span.end,
                "{}",
                diagnostic.message
            );
            out.push(diagnostic);
        }
        Ok(())
    }
}
