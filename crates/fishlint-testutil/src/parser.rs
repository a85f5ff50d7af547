//! Parser test files.
//!
//! The expected section is the tree as printed by
//! [`fishlint_kernel::syntax::sexpr::format`]. Whitespace is collapsed
//! before comparing, so long trees can be wrapped.

use fishlint_kernel::parse;
use fishlint_kernel::syntax::sexpr;

use crate::{parse_blocks, TestResult, TestSummary};

/// A single parser test case.
#[derive(Debug, Clone)]
pub struct ParserTestCase {
    pub name: String,
    pub line_number: usize,
    pub input: String,
    /// Expected tree as an S-expression.
    pub expected: String,
}

/// Parse a parser `.test` file.
pub fn parse_parser_tests(content: &str) -> Vec<ParserTestCase> {
    parse_blocks(content)
        .into_iter()
        .map(|block| ParserTestCase {
            name: block.name,
            line_number: block.line_number,
            input: block.input,
            expected: block.expected,
        })
        .collect()
}

impl ParserTestCase {
    pub fn run(&self) -> TestResult {
        let tree = match parse(&self.input) {
            Ok(tree) => tree,
            Err(e) => return TestResult::Error { message: e.to_string() },
        };
        let Some(root) = tree.root() else {
            return TestResult::Error {
                message: "parser produced no root".to_string(),
            };
        };
        TestResult::compare(
            &normalize_sexpr(&self.expected),
            normalize_sexpr(&sexpr::format(root)),
        )
    }
}

/// Collapse runs of whitespace outside quoted leaf text.
fn normalize_sexpr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_space = false;

    for c in s.trim().chars() {
        if in_string {
            out.push(c);
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space && !out.is_empty() && c != ')' {
            out.push(' ');
        }
        pending_space = false;
        if c == '"' {
            in_string = true;
        }
        out.push(c);
    }
    out
}

/// Run every case and total the results.
pub fn run_parser_tests(cases: &[ParserTestCase]) -> TestSummary {
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
    fn wrapped_expectations_match() {
        let cases = parse_parser_tests(
            "# test: set\n---\nset -U X 1\n---\n(program\n  (command name: (word \"set\")\n    argument: (option \"-U\")\n    argument: (variable_definition \"X\")\n    argument: (word \"1\")))\n===\n",
        );
        assert_eq!(cases[0].run(), TestResult::Pass);
    }

    #[test]
    fn whitespace_inside_strings_is_kept() {
        assert_eq!(normalize_sexpr("(word  \"a  b\"\n )"), "(word \"a  b\")");
    }
}
