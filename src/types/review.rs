//! Review input types shared by the pipeline, the server and the CLI.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Developer seniority the review is calibrated against
///
/// Threaded into every prompt; the pipeline never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeveloperLevel {
    #[default]
    Junior,
    Middle,
    Strong,
}

impl DeveloperLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeveloperLevel::Junior => "junior",
            DeveloperLevel::Middle => "middle",
            DeveloperLevel::Strong => "strong",
        }
    }
}

impl std::fmt::Display for DeveloperLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for DeveloperLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "junior" => Ok(DeveloperLevel::Junior),
            "middle" => Ok(DeveloperLevel::Middle),
            "strong" => Ok(DeveloperLevel::Strong),
            _ => Err(format!(
                "Unknown developer level: {}. Valid values: junior, middle, strong",
                s
            )),
        }
    }
}

/// Repository files keyed by path
///
/// `None` content marks a file that was listed but not retrieved (binary,
/// filtered by extension, or a failed download). Iteration is path-ordered,
/// so every stage sees the same stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    files: BTreeMap<String, Option<String>>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file; a later insert for the same path replaces the earlier one
    pub fn insert(&mut self, path: impl Into<String>, content: Option<String>) {
        self.files.insert(path.into(), content);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// All listed paths, including those without content
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Files that can be analyzed: content present and not blank
    pub fn analyzable(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files.iter().filter_map(|(path, content)| {
            content
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .map(|c| (path.as_str(), c))
        })
    }

    pub fn analyzable_count(&self) -> usize {
        self.analyzable().count()
    }

    pub fn get(&self, path: &str) -> Option<Option<&str>> {
        self.files.get(path).map(|c| c.as_deref())
    }
}

impl<P: Into<String>> FromIterator<(P, Option<String>)> for FileSet {
    fn from_iter<I: IntoIterator<Item = (P, Option<String>)>>(iter: I) -> Self {
        let mut set = FileSet::new();
        for (path, content) in iter {
            set.insert(path, content);
        }
        set
    }
}

impl Extend<(String, Option<String>)> for FileSet {
    fn extend<I: IntoIterator<Item = (String, Option<String>)>>(&mut self, iter: I) {
        for (path, content) in iter {
            self.insert(path, content);
        }
    }
}
