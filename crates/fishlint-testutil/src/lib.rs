//! Test utilities for fishlint.
//!
//! Parsers and runners for the test file formats under `tests/`:
//! - `tests/parser/*.test`: fish source and the expected tree as an S-expression
//! - `tests/diagnostics/*.test`: fish source and the expected diagnostics
//!
//! Both share one layout:
//!
//! ```text
//! # test: name
//! # key: value        (optional headers)
//! ---
//! input
//! ---
//! expected
//! ===
//! ```

pub mod diagnostics;
pub mod parser;

use std::fmt;

/// Outcome of one test case.
#[derive(Debug, Clone, PartialEq)]
pub enum TestResult {
    Pass,
    /// Output differed from the expectation.
    Fail { expected: String, actual: String },
    /// The case could not be run at all.
    Error { message: String },
}

impl TestResult {
    pub fn is_pass(&self) -> bool {
        matches!(self, TestResult::Pass)
    }

    /// Pass when `actual` matches `expected`, fail otherwise.
    pub fn compare(expected: &str, actual: String) -> Self {
        if expected == actual {
            TestResult::Pass
        } else {
            TestResult::Fail {
                expected: expected.to_string(),
                actual,
            }
        }
    }
}

/// Totals over a test file.
#[derive(Debug, Default)]
pub struct TestSummary {
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub failures: Vec<TestFailure>,
}

/// A case that did not pass, with where to find it.
#[derive(Debug, Clone)]
pub struct TestFailure {
    pub name: String,
    pub line: usize,
    pub result: TestResult,
}

impl TestSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, name: impl Into<String>, line: usize, result: TestResult) {
        match result {
            TestResult::Pass => {
                self.passed += 1;
                return;
            }
            TestResult::Fail { .. } => self.failed += 1,
            TestResult::Error { .. } => self.errors += 1,
        }
        self.failures.push(TestFailure {
            name: name.into(),
            line,
            result,
        });
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.errors
    }

    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for TestSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n{}", "═".repeat(60))?;
        writeln!(
            f,
            "{} cases: {} passed, {} failed, {} errors",
            self.total(),
            self.passed,
            self.failed,
            self.errors
        )?;

        for failure in &self.failures {
            writeln!(f, "\n  {} (line {})", failure.name, failure.line)?;
            match &failure.result {
                TestResult::Fail { expected, actual } => {
                    writeln!(f, "    expected:\n{}", indent(expected))?;
                    writeln!(f, "    actual:\n{}", indent(actual))?;
                }
                TestResult::Error { message } => writeln!(f, "    error: {message}")?,
                TestResult::Pass => {}
            }
        }
        writeln!(f, "{}", "═".repeat(60))
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("      {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `# test:` block of a test file, before interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct TestBlock {
    pub name: String,
    /// Line of the `# test:` header (1-indexed).
    pub line_number: usize,
    /// `# key: value` lines following the name.
    pub headers: Vec<(String, String)>,
    pub input: String,
    /// Expected section, trimmed.
    pub expected: String,
}

impl TestBlock {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Split a test file into blocks.
pub fn parse_blocks(content: &str) -> Vec<TestBlock> {
    let lines: Vec<&str> = content.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let Some(name) = lines[i].trim().strip_prefix("# test:") else {
            i += 1;
            continue;
        };
        let name = name.trim().to_string();
        let line_number = i + 1;
        i += 1;

        let mut headers = Vec::new();
        while let Some(header) = lines.get(i).and_then(|l| l.trim().strip_prefix('#')) {
            if let Some((key, value)) = header.split_once(':') {
                headers.push((key.trim().to_string(), value.trim().to_string()));
            }
            i += 1;
        }

        // skip to the opening ---
        while i < lines.len() && lines[i].trim() != "---" {
            i += 1;
        }
        i += 1;

        let input = section(&lines, &mut i, "---");
        let expected = section(&lines, &mut i, "===");

        blocks.push(TestBlock {
            name,
            line_number,
            headers,
            input: input.join("\n"),
            expected: expected.join("\n").trim().to_string(),
        });
    }

    blocks
}

/// Lines up to (and consuming) `delimiter`.
fn section<'a>(lines: &[&'a str], i: &mut usize, delimiter: &str) -> Vec<&'a str> {
    let mut out = Vec::new();
    while *i < lines.len() && lines[*i].trim() != delimiter {
        out.push(lines[*i]);
        *i += 1;
    }
    *i += 1;
    out
}
