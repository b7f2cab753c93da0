//! Team and collaboration engine.

use async_trait::async_trait;

use super::{bullet_list, Engine, EngineError, EngineInput};
use crate::detect::RepoFindings;
use crate::score::{categories, CategoryResult, ScoreCard};
use crate::store::ArtifactStore;

const REPORT_TASK: &str = "Write a team and collaboration report in markdown: ownership and \
knowledge concentration based on the contributor statistics, onboarding gaps, and concrete \
process improvements.";

/// Contributors listed in the prompt context.
const MAX_LISTED_CONTRIBUTORS: usize = 10;

pub struct TeamEngine;

pub fn score(findings: &RepoFindings) -> CategoryResult {
    let git = &findings.git;
    let config = &findings.config;
    let mut card = ScoreCard::new(0);

    if git.is_empty() {
        card.add(0, "no git history");
    } else {
        let contributors = git.contributors.len();
        match contributors {
            0 => {}
            1 => {
                card.add(10, "1 contributor");
            }
            2..=4 => {
                card.add(20, format!("{} contributors", contributors));
            }
            _ => {
                card.add(30, format!("{} contributors", contributors));
            }
        }

        let bus_factor = git.bus_factor();
        match bus_factor {
            0 | 1 => {
                card.add(0, format!("bus factor {}", bus_factor));
            }
            2 => {
                card.add(10, "bus factor 2");
            }
            n => {
                card.add(20, format!("bus factor {}", n));
            }
        }

        if git.recent_commits >= 10 {
            card.add(20, format!("{} commits in 90 days", git.recent_commits));
        } else if git.recent_commits > 0 {
            card.add(10, format!("{} commits in 90 days", git.recent_commits));
        } else {
            card.add(0, "no commits in 90 days");
        }
    }

    if config.codeowners {
        card.add(10, "CODEOWNERS");
    }
    if config.contributing {
        card.add(10, "contributing guide");
    }
    if config.code_of_conduct {
        card.add(10, "code of conduct");
    }

    card.finish(categories::COLLABORATION)
}

#[async_trait]
impl Engine for TeamEngine {
    fn name(&self) -> &'static str {
        "team"
    }

    fn category(&self) -> &'static str {
        categories::COLLABORATION
    }

    async fn run(
        &self,
        mut input: EngineInput<'_>,
        store: &mut ArtifactStore,
    ) -> Result<CategoryResult, EngineError> {
        let findings = input.findings;
        let git = &findings.git;

        let contributors = git
            .contributors
            .iter()
            .take(MAX_LISTED_CONTRIBUTORS)
            .map(|c| format!("{}: {} commits", c.name, c.commits));
        input.context.append_context(&format!(
            "Contributors:\n{}\nTotal commits: {}\nCommits in the last 90 days: {}\nBus factor: {}\nLast commit: {}",
            bullet_list(contributors, "no git history"),
            git.total_commits,
            git.recent_commits,
            git.bus_factor(),
            git.last_commit.as_deref().unwrap_or("unknown")
        ));

        input.generate_into(store, "team/TEAM.md", REPORT_TASK).await?;

        Ok(score(findings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{ConfigPresence, Contributor, GitSummary};

    fn contributor(name: &str, commits: usize) -> Contributor {
        Contributor {
            name: name.into(),
            commits,
        }
    }

    #[test]
    fn test_no_history() {
        let result = score(&RepoFindings::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.details, "+0 no git history");
    }

    #[test]
    fn test_healthy_team() {
        let findings = RepoFindings {
            git: GitSummary {
                contributors: (0..6).map(|i| contributor(&format!("dev{}", i), 10)).collect(),
                total_commits: 60,
                recent_commits: 25,
                last_commit: None,
            },
            config: ConfigPresence {
                codeowners: true,
                contributing: true,
                code_of_conduct: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = score(&findings);
        assert_eq!(result.score, 100);
        assert!(result.details.contains("+20 bus factor 3"));
    }

    #[test]
    fn test_single_maintainer() {
        let findings = RepoFindings {
            git: GitSummary {
                contributors: vec![contributor("solo", 40)],
                total_commits: 40,
                recent_commits: 3,
                last_commit: None,
            },
            ..Default::default()
        };
        assert_eq!(score(&findings).score, 20);
    }
}
