//! Performance engine.

use async_trait::async_trait;

use super::{bullet_list, Engine, EngineError, EngineInput};
use crate::detect::RepoFindings;
use crate::score::{categories, CategoryResult, ScoreCard};
use crate::store::ArtifactStore;

const REPORT_TASK: &str = "Write a performance review in markdown: likely hot paths, database \
access patterns for the listed models, caching opportunities, and the large files listed in \
the findings that should be split.";

/// Files longer than this are penalized twice.
const VERY_LONG_FILE_LINES: usize = 1500;

pub struct PerformanceEngine;

pub fn score(findings: &RepoFindings) -> CategoryResult {
    let mut card = ScoreCard::new(100);

    let large = findings.large_files.len() as i32;
    if large > 0 {
        card.deduct((large * 5).min(30), format!("{} large files", large));
    }
    let very_long = findings
        .large_files
        .iter()
        .filter(|f| f.lines > VERY_LONG_FILE_LINES)
        .count() as i32;
    if very_long > 0 {
        card.deduct(
            (very_long * 10).min(30),
            format!("{} files over {} lines", very_long, VERY_LONG_FILE_LINES),
        );
    }
    if !findings.config.lockfile {
        card.deduct(10, "unpinned dependencies");
    }

    card.finish(categories::PERFORMANCE)
}

#[async_trait]
impl Engine for PerformanceEngine {
    fn name(&self) -> &'static str {
        "performance"
    }

    fn category(&self) -> &'static str {
        categories::PERFORMANCE
    }

    async fn run(
        &self,
        mut input: EngineInput<'_>,
        store: &mut ArtifactStore,
    ) -> Result<CategoryResult, EngineError> {
        let findings = input.findings;

        let large = findings
            .large_files
            .iter()
            .map(|f| format!("{} ({} lines)", f.path, f.lines));
        let models = findings.models.iter().map(|m| m.name.as_str());
        input.context.append_context(&format!(
            "Large files:\n{}\nData models:\n{}\nTotal source lines: {}",
            bullet_list(large, "none"),
            bullet_list(models, "none detected"),
            findings.total_lines
        ));

        input
            .generate_into(store, "performance/PERFORMANCE.md", REPORT_TASK)
            .await?;

        Ok(score(findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{ConfigPresence, LargeFile};

    #[test]
    fn test_score() {
        let findings = RepoFindings {
            large_files: vec![
                LargeFile {
                    path: "a.rs".into(),
                    lines: 2000,
                },
                LargeFile {
                    path: "b.rs".into(),
                    lines: 600,
                },
            ],
            config: ConfigPresence {
                lockfile: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = score(&findings);
        assert_eq!(result.score, 80);
        assert_eq!(result.details, "-10 2 large files; -10 1 files over 1500 lines");
    }

    #[test]
    fn test_penalties_are_capped() {
        let findings = RepoFindings {
            large_files: (0..10)
                .map(|i| LargeFile {
                    path: format!("f{}.rs", i),
                    lines: 5000,
                })
                .collect(),
            ..Default::default()
        };
        assert_eq!(score(&findings).score, 30);
    }
}
