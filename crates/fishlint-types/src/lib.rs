//! fishlint-types: pure data types shared by the fishlint crates.
//!
//! - [`ErrorCode`]: the closed, stably numbered table of diagnostic codes
//! - [`Severity`]: how loudly a diagnostic is reported
//! - [`Span`] / [`Diagnostic`]: what a pass hands back to its caller
//! - [`AnalysisError`]: precondition failures, distinct from diagnostics

mod code;
mod diagnostic;
mod error;

pub use code::{ErrorCode, Severity, UnknownCode};
pub use diagnostic::{Diagnostic, Span};
pub use error::AnalysisError;
