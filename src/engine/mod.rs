//! Analysis engines.
//!
//! An engine scores one category from repository findings and writes its
//! generated artifacts through the [`ArtifactStore`]. Scores come only from
//! observable facts; backend text goes into artifacts and never into scores,
//! so a degraded backend leaves every score unchanged.
//!
//! Engines are independent of each other except the health engine, which
//! aggregates the results of every engine that ran before it.

mod architecture;
mod ci;
mod docs;
mod health;
mod performance;
mod security;
mod team;

pub use api_tests::ApiTestsEngine;
pub use architecture::ArchitectureEngine;
pub use ci::CiEngine;
pub use docs::DocsEngine;
pub use health::{HealthEngine, ANALYSIS_FILE, HEALTH_REPORT};
pub use performance::PerformanceEngine;
pub use security::SecurityEngine;
pub use team::TeamEngine;

use async_trait::async_trait;
use thiserror::Error;

use crate::backend::TextGenerator;
use crate::context::AnalysisContext;
use crate::detect::RepoFindings;
use crate::history::HistoryError;
use crate::score::CategoryResult;
use crate::store::{ArtifactStore, StoreError};

/// Errors that stop a single engine. Backend failures are not errors: the
/// generator always returns text.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error("failed to serialize summary: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything an engine reads during a run.
pub struct EngineInput<'a> {
    /// The engine's own copy of the shared context
    pub context: AnalysisContext,
    pub findings: &'a RepoFindings,
    pub generator: &'a dyn TextGenerator,
    /// Results of the engines that already ran
    pub prior_results: &'a [CategoryResult],
}

impl EngineInput<'_> {
    /// Generate one artifact from a task description and write it.
    pub async fn generate_into(
        &self,
        store: &mut ArtifactStore,
        path: &str,
        task: &str,
    ) -> Result<(), EngineError> {
        let text = self.generator.generate(&self.context.prompt(task)).await;
        store.write(path, &text)?;
        Ok(())
    }
}

#[async_trait]
pub trait Engine: Send + Sync {
    /// Selection name, e.g. `api-tests`.
    fn name(&self) -> &'static str;

    /// Category the result is reported under.
    fn category(&self) -> &'static str;

    /// Aggregate engines consume every other result and always run last.
    fn is_aggregate(&self) -> bool {
        false
    }

    async fn run(
        &self,
        input: EngineInput<'_>,
        store: &mut ArtifactStore,
    ) -> Result<CategoryResult, EngineError>;
}

/// Markdown bullet list, or `fallback` when empty.
pub(crate) fn bullet_list<I, S>(items: I, fallback: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = items
        .into_iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect();
    if lines.is_empty() {
        format!("- {}", fallback)
    } else {
        lines.join("\n")
    }
}

/// Selection names of the built-in engines, in run order.
pub const ENGINE_NAMES: &[&str] = &[
    "docs",
    "architecture",
    "security",
    "ci",
    "api-tests",
    "performance",
    "team",
    "health",
];
