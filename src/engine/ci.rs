//! CI/CD engine: pipeline and container suggestions.

use async_trait::async_trait;

use super::{Engine, EngineError, EngineInput};
use crate::detect::RepoFindings;
use crate::score::{categories, CategoryResult, ScoreCard};
use crate::store::ArtifactStore;

const PIPELINE_TASK: &str = "Write a GitHub Actions workflow YAML file for this project that \
installs dependencies, lints, builds and runs the tests. Output only the YAML file.";

const DOCKERFILE_TASK: &str = "Write a production multi-stage Dockerfile for this project. \
Output only the Dockerfile.";

pub struct CiEngine;

pub fn score(findings: &RepoFindings) -> CategoryResult {
    let config = &findings.config;
    let mut card = ScoreCard::new(0);

    if config.ci_config {
        card.add(40, "CI pipeline configured");
    } else {
        card.add(0, "no CI pipeline");
    }
    if config.dockerfile {
        card.add(15, "Dockerfile");
    }
    if config.docker_compose {
        card.add(5, "compose file");
    }
    if findings.test_files > 0 {
        card.add(20, format!("{} test files", findings.test_files));
    }
    if config.lint_config {
        card.add(20, "lint configuration");
    }

    card.finish(categories::CI)
}

#[async_trait]
impl Engine for CiEngine {
    fn name(&self) -> &'static str {
        "ci"
    }

    fn category(&self) -> &'static str {
        categories::CI
    }

    async fn run(
        &self,
        mut input: EngineInput<'_>,
        store: &mut ArtifactStore,
    ) -> Result<CategoryResult, EngineError> {
        let findings = input.findings;
        let config = &findings.config;

        let mut existing = Vec::new();
        if config.ci_config {
            existing.push("CI pipeline");
        }
        if config.dockerfile {
            existing.push("Dockerfile");
        }
        if config.docker_compose {
            existing.push("docker compose");
        }
        if config.lint_config {
            existing.push("lint configuration");
        }
        let existing = if existing.is_empty() {
            "none".to_string()
        } else {
            existing.join(", ")
        };
        input.context.append_context(&format!(
            "Existing CI/CD setup: {}\nTest files: {}",
            existing, findings.test_files
        ));

        input.generate_into(store, "ci/ci.yml", PIPELINE_TASK).await?;
        input.generate_into(store, "ci/Dockerfile", DOCKERFILE_TASK).await?;

        Ok(score(findings))
    }
}
