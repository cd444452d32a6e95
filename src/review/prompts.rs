//! Prompt Rendering
//!
//! Fills the configured templates with per-call values. Templates are opaque:
//! nothing here inspects their wording.

use crate::config::PromptTemplates;
use crate::constants::review::{ANALYSES_PLACEHOLDER, LEVEL_PLACEHOLDER};
use crate::types::{AnalysisUnit, DeveloperLevel};

/// System message shared by every call
pub fn render_system(templates: &PromptTemplates, description: &str) -> String {
    format!("{}{}", templates.system, description)
}

/// User message for the project structure call
pub fn render_structure<'a>(
    templates: &PromptTemplates,
    paths: impl IntoIterator<Item = &'a str>,
) -> String {
    let listing = paths.into_iter().collect::<Vec<_>>().join(", ");
    format!("Project structure:{}\n{}", listing, templates.structure)
}

/// User message for a single file call
pub fn render_file(
    templates: &PromptTemplates,
    path: &str,
    content: &str,
    level: DeveloperLevel,
) -> String {
    format!(
        "File name: {}\n{}\n{}{}",
        path, content, templates.file_analyze, level
    )
}

/// User message for a reduce or summary call
///
/// `{level}` is substituted before `{analyses}` so placeholder-like text
/// inside model output is never expanded.
pub fn render_fold(template: &str, units: &[AnalysisUnit], level: DeveloperLevel) -> String {
    template
        .replace(LEVEL_PLACEHOLDER, level.as_str())
        .replace(ANALYSES_PLACEHOLDER, &AnalysisUnit::join(units))
}
