//! Finding types produced by the detectors.

use serde::{Deserialize, Serialize};

/// Files and lines attributed to one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageStat {
    pub name: String,
    pub files: usize,
    pub lines: usize,
}

/// An HTTP route found in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub method: String,
    pub path: String,
    pub file: String,
}

/// A persisted data model (ORM entity, schema model).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataModel {
    pub name: String,
    pub kind: String,
    pub file: String,
}

/// A string that looks like a committed credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretHit {
    pub kind: String,
    pub file: String,
    pub line: usize,
}

/// A file over the large-file line threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeFile {
    pub path: String,
    pub lines: usize,
}

/// Presence of well-known project files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigPresence {
    pub readme: bool,
    pub license: bool,
    pub contributing: bool,
    pub changelog: bool,
    pub code_of_conduct: bool,
    pub security_policy: bool,
    pub codeowners: bool,
    pub docs_dir: bool,
    pub gitignore: bool,
    /// A real `.env` file is committed
    pub env_file: bool,
    pub env_example: bool,
    pub dockerfile: bool,
    pub docker_compose: bool,
    pub ci_config: bool,
    pub lint_config: bool,
    pub lockfile: bool,
}

/// One contributor from git history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contributor {
    pub name: String,
    pub commits: usize,
}

/// Summary of git history. Empty when the project is not a git checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitSummary {
    pub contributors: Vec<Contributor>,
    pub total_commits: usize,
    pub recent_commits: usize,
    pub last_commit: Option<String>,
}

impl GitSummary {
    pub fn is_empty(&self) -> bool {
        self.total_commits == 0 && self.contributors.is_empty()
    }

    /// Smallest number of contributors that together account for at least
    /// half of all commits.
    pub fn bus_factor(&self) -> usize {
        let total: usize = self.contributors.iter().map(|c| c.commits).sum();
        if total == 0 {
            return 0;
        }
        let mut sorted: Vec<usize> = self.contributors.iter().map(|c| c.commits).collect();
        sorted.sort_unstable_by(|a, b| b.cmp(a));

        let mut covered = 0;
        for (i, commits) in sorted.iter().enumerate() {
            covered += commits;
            if covered * 2 >= total {
                return i + 1;
            }
        }
        sorted.len()
    }
}

/// Everything the detectors learned about a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepoFindings {
    /// Sorted by line count, largest first
    pub languages: Vec<LanguageStat>,
    pub frameworks: Vec<String>,
    pub package_manager: Option<String>,
    pub routes: Vec<Route>,
    pub models: Vec<DataModel>,
    pub config: ConfigPresence,
    pub secrets: Vec<SecretHit>,
    pub large_files: Vec<LargeFile>,
    /// Top-level directories
    pub directories: Vec<String>,
    pub file_count: usize,
    pub source_files: usize,
    pub test_files: usize,
    pub total_lines: usize,
    pub comment_lines: usize,
    pub git: GitSummary,
}

impl RepoFindings {
    pub fn language_names(&self) -> Vec<String> {
        self.languages.iter().map(|l| l.name.clone()).collect()
    }

    /// Share of source lines that are comments, 0.0 - 1.0.
    pub fn comment_ratio(&self) -> f64 {
        if self.total_lines == 0 {
            return 0.0;
        }
        self.comment_lines as f64 / self.total_lines as f64
    }

    /// Test files per source file.
    pub fn test_ratio(&self) -> f64 {
        if self.source_files == 0 {
            return 0.0;
        }
        self.test_files as f64 / self.source_files as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contributor(name: &str, commits: usize) -> Contributor {
        Contributor {
            name: name.to_string(),
            commits,
        }
    }

    #[test]
    fn test_bus_factor() {
        let git = GitSummary {
            contributors: vec![contributor("a", 90), contributor("b", 5), contributor("c", 5)],
            total_commits: 100,
            ..Default::default()
        };
        assert_eq!(git.bus_factor(), 1);

        let git = GitSummary {
            contributors: vec![contributor("a", 30), contributor("b", 30), contributor("c", 40)],
            total_commits: 100,
            ..Default::default()
        };
        assert_eq!(git.bus_factor(), 2);

        assert_eq!(GitSummary::default().bus_factor(), 0);
        assert!(GitSummary::default().is_empty());
    }

    #[test]
    fn test_ratios() {
        let findings = RepoFindings {
            source_files: 10,
            test_files: 4,
            total_lines: 200,
            comment_lines: 30,
            ..Default::default()
        };
        assert!((findings.test_ratio() - 0.4).abs() < f64::EPSILON);
        assert!((findings.comment_ratio() - 0.15).abs() < f64::EPSILON);
        assert_eq!(RepoFindings::default().test_ratio(), 0.0);
    }
}
