//! The document being checked.
//!
//! fish autoloads `name` from `<dir>/functions/name.fish` the first time
//! `name` is called, so a file in a `functions` directory is expected to
//! define a function named after itself.

use std::path::{Path, PathBuf};

use fishlint_types::AnalysisError;

/// What the rule engine needs to know about a document.
pub trait SourceDocument {
    /// Whether fish loads this file on demand by function name.
    fn is_autoloaded(&self) -> bool;

    /// The function name the file is expected to define. Only meaningful
    /// when [`is_autoloaded`](Self::is_autoloaded) is true.
    fn autoload_name(&self) -> &str;

    /// Fail fast on a document the engine can't reason about.
    fn check(&self) -> Result<(), AnalysisError> {
        if self.is_autoloaded() && self.autoload_name().is_empty() {
            return Err(AnalysisError::MissingAutoloadName);
        }
        Ok(())
    }
}

/// A document identified by its (optional) path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    path: Option<PathBuf>,
    autoload_name: Option<String>,
}

impl Document {
    /// A document with no path, e.g. stdin or an unsaved buffer.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Derive autoload status from the file's location.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let autoload_name = autoload_name_for(&path);
        Self {
            path: Some(path),
            autoload_name,
        }
    }

    /// Treat the document as autoloaded under `name`, whatever its path.
    pub fn with_autoload_name(mut self, name: impl Into<String>) -> Self {
        self.autoload_name = Some(name.into());
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl SourceDocument for Document {
    fn is_autoloaded(&self) -> bool {
        self.autoload_name.is_some()
    }

    fn autoload_name(&self) -> &str {
        self.autoload_name.as_deref().unwrap_or("")
    }
}

/// `.../functions/foo.fish` autoloads `foo`.
fn autoload_name_for(path: &Path) -> Option<String> {
    let parent = path.parent()?.file_name()?;
    if parent != "functions" || path.extension()? != "fish" {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}
