//! Lint configuration.
//!
//! Looked up in order, first hit wins:
//!
//! 1. `fishlint.toml` in the directory being linted
//! 2. `$XDG_CONFIG_HOME/fishlint/config.toml`
//!
//! ```toml
//! # codes by name or number
//! disable = ["privateHelperFunction", 4002]
//!
//! [severity]
//! universalVariable = "error"
//! ```
//!
//! Configuration only filters and re-grades diagnostics after a pass. The
//! rules themselves always run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use fishlint_types::{Diagnostic, ErrorCode, Severity, UnknownCode};
use serde::Deserialize;

/// Name of the per-project config file.
pub const PROJECT_FILE: &str = "fishlint.toml";

/// Errors loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    UnknownCode(#[from] UnknownCode),
}

/// A code as written in the file: its name or its number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CodeRef {
    Number(u16),
    Name(String),
}

impl CodeRef {
    fn resolve(&self) -> Result<ErrorCode, UnknownCode> {
        match self {
            CodeRef::Number(n) => n.to_string().parse(),
            CodeRef::Name(name) => name.parse(),
        }
    }
}

/// On-disk layout.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    disable: Vec<CodeRef>,
    #[serde(default)]
    severity: BTreeMap<String, Severity>,
}

/// Which codes to report, and at what severity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintConfig {
    disabled: BTreeSet<ErrorCode>,
    severity: BTreeMap<ErrorCode, Severity>,
}

impl LintConfig {
    /// Parse a config file's contents.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;

        let disabled: BTreeSet<ErrorCode> = file
            .disable
            .iter()
            .map(CodeRef::resolve)
            .collect::<Result<_, _>>()?;
        let severity: BTreeMap<ErrorCode, Severity> = file
            .severity
            .iter()
            .map(|(code, severity)| Ok((code.parse::<ErrorCode>()?, *severity)))
            .collect::<Result<_, UnknownCode>>()?;

        Ok(Self { disabled, severity })
    }

    /// Load a specific file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loading config");
        Self::from_toml(&content)
    }

    /// Find and load the config that applies to `dir`.
    ///
    /// Defaults when no file exists.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [Some(dir.join(PROJECT_FILE)), user_config_path()];
        match candidates.into_iter().flatten().find(|p| p.is_file()) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::debug!(dir = %dir.display(), "no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Stop reporting `code`.
    pub fn with_disabled(mut self, code: ErrorCode) -> Self {
        self.disabled.insert(code);
        self
    }

    /// Report `code` at `severity` instead of its default.
    pub fn with_severity(mut self, code: ErrorCode, severity: Severity) -> Self {
        self.severity.insert(code, severity);
        self
    }

    /// Layer `other` on top of this config.
    pub fn merge(mut self, other: LintConfig) -> Self {
        self.disabled.extend(other.disabled);
        self.severity.extend(other.severity);
        self
    }

    pub fn is_enabled(&self, code: ErrorCode) -> bool {
        !self.disabled.contains(&code)
    }

    pub fn severity_of(&self, code: ErrorCode) -> Severity {
        self.severity
            .get(&code)
            .copied()
            .unwrap_or_else(|| code.default_severity())
    }

    /// Drop disabled codes and re-grade the rest. Order is kept.
    pub fn apply(&self, diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
        diagnostics
            .into_iter()
            .filter(|d| self.is_enabled(d.code))
            .map(|d| {
                let severity = self.severity_of(d.code);
                d.with_severity(severity)
            })
            .collect()
    }
}

/// `$XDG_CONFIG_HOME/fishlint/config.toml`, if there is a home to put it in.
pub fn user_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fishlint").map(|dirs| dirs.config_dir().join("config.toml"))
}
