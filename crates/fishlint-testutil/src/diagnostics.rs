//! Diagnostic test files.
//!
//! Each expected line is a code name followed by the first line of the text
//! the diagnostic is anchored on, in emission order. An empty expected
//! section means the input is clean.
//!
//! ```text
//! # test: universal
//! ---
//! set -U EDITOR vim
//! ---
//! universalVariable -U
//! ===
//! ```
//!
//! `# autoload: name` checks the input as the autoloaded file for `name`.

use fishlint_kernel::{diagnose, parse, Document};

use crate::{parse_blocks, TestResult, TestSummary};

/// A single diagnostic test case.
#[derive(Debug, Clone)]
pub struct DiagnosticTestCase {
    pub name: String,
    pub line_number: usize,
    pub autoload: Option<String>,
    pub input: String,
    pub expected: String,
}

/// Parse a diagnostics `.test` file.
pub fn parse_diagnostic_tests(content: &str) -> Vec<DiagnosticTestCase> {
    parse_blocks(content)
        .into_iter()
        .map(|block| DiagnosticTestCase {
            autoload: block.header("autoload").map(str::to_string),
            name: block.name,
            line_number: block.line_number,
            input: block.input,
            expected: block.expected,
        })
        .collect()
}

impl DiagnosticTestCase {
    pub fn run(&self) -> TestResult {
        let document = match &self.autoload {
            Some(name) => Document::anonymous().with_autoload_name(name.as_str()),
            None => Document::anonymous(),
        };

        let tree = match parse(&self.input) {
            Ok(tree) => tree,
            Err(e) => return TestResult::Error { message: e.to_string() },
        };
        let diagnostics = match diagnose(&tree, &document) {
            Ok(diagnostics) => diagnostics,
            Err(e) => return TestResult::Error { message: e.to_string() },
        };

        let actual = diagnostics
            .iter()
            .map(|d| {
                let text = d.span.slice(tree.source()).unwrap_or("");
                let first_line = text.lines().next().unwrap_or("").trim();
                format!("{} {}", d.code.name(), first_line)
            })
            .collect::<Vec<_>>()
            .join("\n");
        TestResult::compare(&normalize(&self.expected), actual)
    }
}

/// Trim each expected line so files can be indented freely.
fn normalize(expected: &str) -> String {
    expected
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run every case and total the results.
pub fn run_diagnostic_tests(cases: &[DiagnosticTestCase]) -> TestSummary {
    let mut summary = TestSummary::new();
    for case in cases {
        summary.record(&case.name, case.line_number, case.run());
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_a_passing_case() {
        let cases = parse_diagnostic_tests(
            "# test: universal\n---\nset -U EDITOR vim\n---\nuniversalVariable -U\n===\n",
        );
        assert_eq!(cases.len(), 1);
        assert_eq!(cases[0].run(), TestResult::Pass);
    }

    #[test]
    fn reports_a_mismatch() {
        let cases = parse_diagnostic_tests("# test: clean\n---\nset -U X 1\n---\n===\n");
        assert!(matches!(cases[0].run(), TestResult::Fail { .. }));
    }

    #[test]
    fn autoload_header_sets_the_document() {
        let cases = parse_diagnostic_tests(
            "# test: auto\n# autoload: foo\n---\nfunction bar; end\n---\nmissingAutoloadedFunctionName bar\n===\n",
        );
        assert_eq!(cases[0].autoload.as_deref(), Some("foo"));
        assert_eq!(cases[0].run(), TestResult::Pass);
    }
}
