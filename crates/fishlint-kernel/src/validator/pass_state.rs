//! Names collected during one diagnostic pass.
//!
//! Tracks which functions and variables a document defines. State lives for
//! exactly one pass: the validator creates it, threads it through every rule
//! by `&mut`, and hands it back to the caller when the pass is over.

use std::collections::HashSet;

/// Function and variable names seen so far in a pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassState {
    function_names: HashSet<String>,
    variable_names: HashSet<String>,
}

impl PassState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a function name. Returns false if it was already recorded.
    pub fn add_function(&mut self, name: impl Into<String>) -> bool {
        self.function_names.insert(name.into())
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.function_names.contains(name)
    }

    /// True until the first function name is recorded.
    pub fn no_functions_yet(&self) -> bool {
        self.function_names.is_empty()
    }

    /// Record a variable name. Returns false if it was already recorded.
    pub fn add_variable(&mut self, name: impl Into<String>) -> bool {
        self.variable_names.insert(name.into())
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.variable_names.contains(name)
    }

    /// Recorded function names, sorted.
    pub fn function_names(&self) -> Vec<&str> {
        sorted(&self.function_names)
    }

    /// Recorded variable names, sorted.
    pub fn variable_names(&self) -> Vec<&str> {
        sorted(&self.variable_names)
    }
}

fn sorted(names: &HashSet<String>) -> Vec<&str> {
    let mut names: Vec<&str> = names.iter().map(String::as_str).collect();
    names.sort_unstable();
    names
}
