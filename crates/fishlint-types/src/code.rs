//! The diagnostic code table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational hint, usually a style convention.
    Info,
    /// Probably a mistake, but the script still runs.
    Warning,
    /// The script is malformed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Categorizes diagnostics for filtering and tooling.
///
/// Downstream consumers key off these codes, so a code is never renumbered
/// or repurposed. New codes get new numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    /// Block opened with no closing `end`.
    MissingEnd,
    /// `end` with nothing to close.
    ExtraEnd,
    /// Any other malformed source.
    SyntaxError,
    /// Statement that can never run.
    UnreachableCode,
    /// Function defined twice in one document.
    DuplicateFunctionName,
    /// Autoloaded file whose first function is not the file's name.
    MissingAutoloadedFunctionName,
    /// Helper function without the `_` prefix.
    PrivateHelperFunction,
    /// `set -U`: the value outlives the session.
    UniversalVariable,
    /// `*PATH` variable set without `--path`.
    PathVariable,
    /// `--path` on a variable whose name doesn't end in `PATH`.
    PathFlag,
}

impl ErrorCode {
    /// Every code, in table order.
    pub const ALL: [ErrorCode; 10] = [
        ErrorCode::MissingEnd,
        ErrorCode::ExtraEnd,
        ErrorCode::SyntaxError,
        ErrorCode::UnreachableCode,
        ErrorCode::DuplicateFunctionName,
        ErrorCode::MissingAutoloadedFunctionName,
        ErrorCode::PrivateHelperFunction,
        ErrorCode::UniversalVariable,
        ErrorCode::PathVariable,
        ErrorCode::PathFlag,
    ];

    /// Stable numeric code. Thousands group the rule family.
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::MissingEnd => 1001,
            ErrorCode::ExtraEnd => 1002,
            ErrorCode::SyntaxError => 1003,
            ErrorCode::UnreachableCode => 2001,
            ErrorCode::DuplicateFunctionName => 3001,
            ErrorCode::MissingAutoloadedFunctionName => 3002,
            ErrorCode::PrivateHelperFunction => 3003,
            ErrorCode::UniversalVariable => 4001,
            ErrorCode::PathVariable => 4002,
            ErrorCode::PathFlag => 4003,
        }
    }

    /// The camelCase name used in config files and test expectations.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::MissingEnd => "missingEnd",
            ErrorCode::ExtraEnd => "extraEnd",
            ErrorCode::SyntaxError => "syntaxError",
            ErrorCode::UnreachableCode => "unreachableCode",
            ErrorCode::DuplicateFunctionName => "duplicateFunctionName",
            ErrorCode::MissingAutoloadedFunctionName => "missingAutoloadedFunctionName",
            ErrorCode::PrivateHelperFunction => "privateHelperFunction",
            ErrorCode::UniversalVariable => "universalVariable",
            ErrorCode::PathVariable => "pathVariable",
            ErrorCode::PathFlag => "pathFlag",
        }
    }

    /// Default severity for this code.
    pub fn default_severity(&self) -> Severity {
        match self {
            ErrorCode::MissingEnd | ErrorCode::ExtraEnd | ErrorCode::SyntaxError => Severity::Error,

            ErrorCode::UnreachableCode
            | ErrorCode::DuplicateFunctionName
            | ErrorCode::MissingAutoloadedFunctionName
            | ErrorCode::UniversalVariable
            | ErrorCode::PathVariable
            | ErrorCode::PathFlag => Severity::Warning,

            ErrorCode::PrivateHelperFunction => Severity::Info,
        }
    }

    /// Generic message, used when no node-specific detail is available.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::MissingEnd => "missing 'end' to close this block",
            ErrorCode::ExtraEnd => "'end' without a matching block",
            ErrorCode::SyntaxError => "syntax error",
            ErrorCode::UnreachableCode => "unreachable code",
            ErrorCode::DuplicateFunctionName => "function is defined more than once",
            ErrorCode::MissingAutoloadedFunctionName => {
                "autoloaded file must define a function matching its file name"
            }
            ErrorCode::PrivateHelperFunction => "helper functions should start with '_'",
            ErrorCode::UniversalVariable => "universal variables persist across all sessions",
            ErrorCode::PathVariable => "variables ending in PATH should be set with --path",
            ErrorCode::PathFlag => "--path is meant for variables ending in PATH",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Unknown code name or number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown diagnostic code: {0}")]
pub struct UnknownCode(pub String);

impl FromStr for ErrorCode {
    type Err = UnknownCode;

    /// Accepts either the camelCase name or the numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.name() == s || s.parse::<u16>().ok() == Some(code.code()))
            .ok_or_else(|| UnknownCode(s.to_string()))
    }
}
