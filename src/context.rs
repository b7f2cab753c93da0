//! Shared per-run analysis context.

use crate::detect::RepoFindings;

/// Project facts shared by every engine.
///
/// The orchestrator owns the original. Each engine receives its own clone, so
/// context appended by one engine never leaks into another engine's prompts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisContext {
    pub project_name: String,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub package_manager: Option<String>,
    /// Rendered directory tree
    pub tree: String,
    additional: String,
}

impl AnalysisContext {
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            ..Default::default()
        }
    }

    pub fn from_findings(project_name: impl Into<String>, findings: &RepoFindings, tree: String) -> Self {
        Self {
            project_name: project_name.into(),
            languages: findings.language_names(),
            frameworks: findings.frameworks.clone(),
            package_manager: findings.package_manager.clone(),
            tree,
            additional: String::new(),
        }
    }

    /// Append a block of free-text context, separated by a blank line.
    pub fn append_context(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.additional.is_empty() {
            self.additional.push_str("\n\n");
        }
        self.additional.push_str(text);
    }

    pub fn additional_context(&self) -> &str {
        &self.additional
    }

    /// Project description placed at the top of every prompt.
    pub fn preamble(&self) -> String {
        let list = |items: &[String]| {
            if items.is_empty() {
                "unknown".to_string()
            } else {
                items.join(", ")
            }
        };

        let mut out = format!("Project: {}\n", self.project_name);
        out.push_str(&format!("Languages: {}\n", list(&self.languages)));
        out.push_str(&format!("Frameworks: {}\n", list(&self.frameworks)));
        out.push_str(&format!(
            "Package manager: {}\n",
            self.package_manager.as_deref().unwrap_or("unknown")
        ));
        if !self.tree.is_empty() {
            out.push_str("\nDirectory structure:\n");
            out.push_str(&self.tree);
            if !self.tree.ends_with('\n') {
                out.push('\n');
            }
        }
        if !self.additional.is_empty() {
            out.push_str("\nFindings:\n");
            out.push_str(&self.additional);
            out.push('\n');
        }
        out
    }

    /// Full prompt: the task as the leading paragraph, then the preamble.
    pub fn prompt(&self, task: &str) -> String {
        format!("{}\n\n{}", task.trim(), self.preamble())
    }
}
