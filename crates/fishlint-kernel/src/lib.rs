//! fishlint-kernel: the core of fishlint.
//!
//! This crate provides:
//!
//! - **Syntax**: an immutable arena syntax tree with parent and sibling handles
//! - **Lexer / Parser**: a logos tokenizer and a recovering parser for fish
//! - **Document**: autoload status of the file being checked
//! - **Validator**: the diagnostic rule engine
//! - **Config**: which codes to report, and how loudly

pub mod config;
pub mod document;
pub mod lexer;
pub mod parser;
pub mod syntax;
pub mod validator;

pub use config::{ConfigError, LintConfig};
pub use document::{Document, SourceDocument};
pub use fishlint_types::{AnalysisError, Diagnostic, ErrorCode, Severity, Span};
pub use parser::parse;
pub use syntax::{Node, NodeId, NodeKind, SyntaxTree};
pub use validator::{diagnose, PassState, Validator};
