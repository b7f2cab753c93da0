//! Documentation engine.

use async_trait::async_trait;

use super::{bullet_list, Engine, EngineError, EngineInput};
use crate::detect::RepoFindings;
use crate::score::{categories, CategoryResult, ScoreCard};
use crate::store::ArtifactStore;

const OVERVIEW_TASK: &str = "Write a project overview in markdown: purpose, main components, \
and how they fit together. Use only what the findings and directory structure support.";

const SETUP_TASK: &str = "Write setup instructions in markdown: prerequisites, installation, \
configuration and how to run the project locally and its tests.";

const API_TASK: &str = "Write API reference documentation in markdown for the HTTP routes \
listed in the findings. Group by resource and describe each endpoint.";

pub struct DocsEngine;

/// Score documentation from project files and comment density.
pub fn score(findings: &RepoFindings) -> CategoryResult {
    let config = &findings.config;
    let mut card = ScoreCard::new(0);

    if config.readme {
        card.add(30, "README present");
    } else {
        card.add(0, "no README");
    }
    if config.license {
        card.add(15, "license present");
    }
    if config.contributing {
        card.add(10, "contributing guide");
    }
    if config.changelog {
        card.add(10, "changelog");
    }
    if config.docs_dir {
        card.add(15, "docs directory");
    }

    let ratio = findings.comment_ratio();
    let percent = (ratio * 100.0).round() as i32;
    if ratio >= 0.10 {
        card.add(20, format!("comment density {}%", percent));
    } else if ratio >= 0.05 {
        card.add(10, format!("comment density {}%", percent));
    } else {
        card.add(0, format!("low comment density {}%", percent));
    }

    card.finish(categories::DOCUMENTATION)
}

#[async_trait]
impl Engine for DocsEngine {
    fn name(&self) -> &'static str {
        "docs"
    }

    fn category(&self) -> &'static str {
        categories::DOCUMENTATION
    }

    async fn run(
        &self,
        mut input: EngineInput<'_>,
        store: &mut ArtifactStore,
    ) -> Result<CategoryResult, EngineError> {
        let findings = input.findings;
        let config = &findings.config;

        let mut present = Vec::new();
        let mut missing = Vec::new();
        for (name, found) in [
            ("README", config.readme),
            ("LICENSE", config.license),
            ("CONTRIBUTING", config.contributing),
            ("CHANGELOG", config.changelog),
            ("docs/", config.docs_dir),
        ] {
            if found {
                present.push(name);
            } else {
                missing.push(name);
            }
        }
        input.context.append_context(&format!(
            "Documentation present:\n{}\nDocumentation missing:\n{}",
            bullet_list(&present, "none"),
            bullet_list(&missing, "none")
        ));

        input.generate_into(store, "docs/OVERVIEW.md", OVERVIEW_TASK).await?;
        input.generate_into(store, "docs/SETUP.md", SETUP_TASK).await?;

        if !findings.routes.is_empty() {
            let routes = findings
                .routes
                .iter()
                .map(|r| format!("{} {} ({})", r.method, r.path, r.file));
            input
                .context
                .append_context(&format!("HTTP routes:\n{}", bullet_list(routes, "none")));
            input.generate_into(store, "docs/API.md", API_TASK).await?;
        }

        Ok(score(findings))
    }
}
