pub mod error;
pub mod review;

pub use error::{ErrorCategory, ErrorClassifier, LlmError, Result, ReviewError};
pub use review::{DeveloperLevel, FileSet};

// =============================================================================
// Domain Newtypes
// =============================================================================

use std::fmt;

/// One opaque text produced by a single completion call
///
/// Analyses flow through the reducer unchanged; the only structure imposed on
/// them is that they can be joined with newline separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisUnit {
    text: String,
    failed: bool,
}

impl AnalysisUnit {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failed: false,
        }
    }

    /// Error text standing in for a call that returned `Err`
    pub fn failed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            failed: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_inner(self) -> String {
        self.text
    }

    /// Whether this analysis stands in for a failed call
    pub fn is_error(&self) -> bool {
        self.failed
    }

    /// Join analyses into one prompt section, one per line
    pub fn join(units: &[AnalysisUnit]) -> String {
        units
            .iter()
            .map(AnalysisUnit::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl fmt::Display for AnalysisUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for AnalysisUnit {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for AnalysisUnit {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for AnalysisUnit {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_uses_newlines() {
        let units = vec![AnalysisUnit::from("a"), AnalysisUnit::from("b")];
        assert_eq!(AnalysisUnit::join(&units), "a\nb");
        assert_eq!(AnalysisUnit::join(&[]), "");
    }

    #[test]
    fn test_failure_is_a_flag_not_a_prefix() {
        assert!(AnalysisUnit::failed("Error: provider down").is_error());
        assert!(!AnalysisUnit::from("Error: handling is missing in main.py").is_error());
        assert!(!AnalysisUnit::from("Clean code, minor issues").is_error());
    }
}
