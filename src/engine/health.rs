//! Health engine: the weighted aggregate of every other engine.

use async_trait::async_trait;
use chrono::Utc;

use super::{Engine, EngineError, EngineInput};
use crate::history::{Ledger, RunHistoryEntry};
use crate::report::{self, AnalysisSummary};
use crate::score::{categories, letter_grade, overall_score, CategoryResult, Weights};
use crate::store::ArtifactStore;

/// Health report path inside the output directory.
pub const HEALTH_REPORT: &str = "health/HEALTH_REPORT.md";

/// Aggregate summary path inside the output directory.
pub const ANALYSIS_FILE: &str = "analysis.json";

const RECOMMENDATIONS_TASK: &str = "Write prioritized recommendations in markdown to improve this \
project's health, based on the category scores and their details below. Start with the lowest \
weighted scores.";

pub struct HealthEngine {
    weights: Weights,
}

impl HealthEngine {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }
}

impl Default for HealthEngine {
    fn default() -> Self {
        Self::new(Weights::default())
    }
}

#[async_trait]
impl Engine for HealthEngine {
    fn name(&self) -> &'static str {
        "health"
    }

    fn category(&self) -> &'static str {
        categories::OVERALL
    }

    fn is_aggregate(&self) -> bool {
        true
    }

    async fn run(
        &self,
        mut input: EngineInput<'_>,
        store: &mut ArtifactStore,
    ) -> Result<CategoryResult, EngineError> {
        let results: Vec<CategoryResult> = input
            .prior_results
            .iter()
            .filter(|c| c.name != categories::OVERALL)
            .cloned()
            .collect();

        let overall = overall_score(&results, &self.weights);
        let grade = letter_grade(overall);
        let entry = RunHistoryEntry {
            analyzed_at: Utc::now(),
            overall_score: overall,
            overall_grade: grade.to_string(),
            categories: results.clone(),
        };

        let ledger = Ledger::in_dir(store.root());
        let previous = ledger.latest();

        let scores = results
            .iter()
            .map(|c| format!("- {}: {} ({}) {}", c.name, c.score, c.grade, c.details))
            .collect::<Vec<_>>()
            .join("\n");
        input
            .context
            .append_context(&format!("Overall score: {} ({})\nCategory scores:\n{}", overall, grade, scores));
        let recommendations = input
            .generator
            .generate(&input.context.prompt(RECOMMENDATIONS_TASK))
            .await;

        let markdown = report::health_markdown(
            &input.context.project_name,
            &entry,
            previous.as_ref(),
            &self.weights,
            &recommendations,
        );
        store.write(HEALTH_REPORT, &markdown)?;

        let summary = AnalysisSummary::new(&input.context, input.findings, &entry, grade, store.file_count());
        store.write(ANALYSIS_FILE, &serde_json::to_string_pretty(&summary)?)?;

        ledger.append(entry)?;
        tracing::info!(score = overall, grade = %grade, categories = results.len(), "health aggregated");

        Ok(CategoryResult::new(
            categories::OVERALL,
            overall,
            format!("weighted across {} categories", results.len()),
        ))
    }
}
