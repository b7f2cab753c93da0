//! Architecture engine: structure overview and component diagram.

use async_trait::async_trait;

use super::{bullet_list, Engine, EngineError, EngineInput};
use crate::detect::{RepoFindings, LARGE_FILE_LINES};
use crate::score::{categories, CategoryResult, ScoreCard};
use crate::store::ArtifactStore;

const ARCHITECTURE_TASK: &str = "Write an architecture document in markdown: layers, modules, \
data flow, external dependencies and the data models listed in the findings.";

// "mermaid" selects the diagram-only output format
const DIAGRAM_TASK: &str = "Produce a mermaid flowchart of the main components of this project \
and how they depend on each other.";

pub struct ArchitectureEngine;

pub fn score(findings: &RepoFindings) -> CategoryResult {
    let mut card = ScoreCard::new(60);

    let dirs = findings.directories.len();
    if dirs >= 3 {
        card.add(10, format!("{} top-level directories", dirs));
    } else if dirs == 0 && findings.file_count > 10 {
        card.deduct(10, "flat layout");
    }

    let large = findings.large_files.len();
    let ratio = if findings.source_files == 0 {
        0.0
    } else {
        large as f64 / findings.source_files as f64
    };
    if large == 0 {
        card.add(20, format!("no files over {} lines", LARGE_FILE_LINES));
    } else if ratio <= 0.05 {
        card.add(10, format!("{} large files", large));
    } else if ratio > 0.15 {
        card.deduct(15, format!("{} large files ({:.0}% of sources)", large, ratio * 100.0));
    }

    let languages = findings.languages.len();
    if (1..=3).contains(&languages) {
        card.add(10, format!("{} languages", languages));
    } else if languages > 5 {
        card.deduct(10, format!("{} languages", languages));
    }

    card.finish(categories::ARCHITECTURE)
}

#[async_trait]
impl Engine for ArchitectureEngine {
    fn name(&self) -> &'static str {
        "architecture"
    }

    fn category(&self) -> &'static str {
        categories::ARCHITECTURE
    }

    async fn run(
        &self,
        mut input: EngineInput<'_>,
        store: &mut ArtifactStore,
    ) -> Result<CategoryResult, EngineError> {
        let findings = input.findings;

        let models = findings
            .models
            .iter()
            .map(|m| format!("{} ({}, {})", m.name, m.kind, m.file));
        let large = findings
            .large_files
            .iter()
            .map(|f| format!("{} ({} lines)", f.path, f.lines));
        input.context.append_context(&format!(
            "Top-level directories: {}\nData models:\n{}\nLarge files:\n{}",
            findings.directories.join(", "),
            bullet_list(models, "none detected"),
            bullet_list(large, "none")
        ));

        input
            .generate_into(store, "architecture/ARCHITECTURE.md", ARCHITECTURE_TASK)
            .await?;
        input
            .generate_into(store, "architecture/diagram.mmd", DIAGRAM_TASK)
            .await?;

        Ok(score(findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::OutputHint;
    use crate::detect::{LanguageStat, LargeFile};

    fn language(name: &str) -> LanguageStat {
        LanguageStat {
            name: name.to_string(),
            files: 1,
            lines: 10,
        }
    }

    #[test]
    fn test_well_structured_project() {
        let findings = RepoFindings {
            directories: vec!["src".into(), "tests".into(), "docs".into()],
            languages: vec![language("Rust")],
            source_files: 20,
            ..Default::default()
        };
        assert_eq!(score(&findings).score, 100);
    }

    #[test]
    fn test_many_large_files() {
        let large = (0..5)
            .map(|i| LargeFile {
                path: format!("src/f{}.rs", i),
                lines: 900,
            })
            .collect();
        let findings = RepoFindings {
            large_files: large,
            source_files: 10,
            languages: (0..6).map(|i| language(&format!("L{}", i))).collect(),
            ..Default::default()
        };
        let result = score(&findings);
        assert_eq!(result.score, 35);
        assert!(result.details.contains("-15 5 large files (50% of sources)"));
        assert!(result.details.contains("-10 6 languages"));
    }

    #[test]
    fn test_diagram_prompt_selects_diagram_format() {
        assert_eq!(OutputHint::detect(DIAGRAM_TASK), OutputHint::Diagram);
    }
}
