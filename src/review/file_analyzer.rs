//! File Analyzer
//!
//! One completion per file, one for the project structure. Each call goes
//! through [`call_and_stringify_errors`], so a failure comes back as an
//! `Error: …` analysis instead of an `Err`.

use std::sync::Arc;

use crate::ai::provider::{CompletionRequest, SharedClient};
use crate::config::{PromptTemplates, ReviewSettings};
use crate::types::{AnalysisUnit, DeveloperLevel};

use super::call_and_stringify_errors;
use super::prompts::{render_file, render_structure, render_system};

/// Stateless analyzer, shared across concurrent file tasks via `Arc`
pub struct FileAnalyzer {
    client: SharedClient,
    templates: Arc<PromptTemplates>,
    max_tokens: u32,
    temperature: f32,
}

impl FileAnalyzer {
    pub fn new(
        client: SharedClient,
        templates: Arc<PromptTemplates>,
        settings: &ReviewSettings,
    ) -> Self {
        Self {
            client,
            templates,
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        }
    }

    /// Analyze the full listing of repository paths
    ///
    /// Paths without content are listed too.
    pub async fn analyze_structure<'a>(
        &self,
        paths: impl IntoIterator<Item = &'a str>,
        description: &str,
    ) -> AnalysisUnit {
        let request = CompletionRequest::new(
            render_system(&self.templates, description),
            render_structure(&self.templates, paths),
            self.max_tokens,
            self.temperature,
        );

        call_and_stringify_errors("analyze_structure", self.client.analyze(&request)).await
    }

    /// Analyze one file's content
    pub async fn analyze_file(
        &self,
        path: &str,
        content: &str,
        level: DeveloperLevel,
        description: &str,
    ) -> AnalysisUnit {
        tracing::debug!("Analyzing file: {}", path);

        let request = CompletionRequest::new(
            render_system(&self.templates, description),
            render_file(&self.templates, path, content, level),
            self.max_tokens,
            self.temperature,
        );

        call_and_stringify_errors("analyze_file", self.client.analyze(&request)).await
    }
}
