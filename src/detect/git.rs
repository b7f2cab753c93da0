//! Git history summary.
//!
//! Shells out to `git`. Any failure (no git binary, not a repository, empty
//! history) yields an empty summary.

use std::path::Path;
use std::process::Command;

use super::{Contributor, GitSummary};

/// Commits newer than this count as recent activity.
const RECENT_WINDOW: &str = "90 days ago";

fn git(root: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .ok()?;
    if !output.status.success() {
        tracing::debug!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `git shortlog -sn` output (`<count>\t<name>` per line).
pub fn parse_shortlog(output: &str) -> Vec<Contributor> {
    output
        .lines()
        .filter_map(|line| {
            let (count, name) = line.trim().split_once(char::is_whitespace)?;
            Some(Contributor {
                name: name.trim().to_string(),
                commits: count.parse().ok()?,
            })
        })
        .collect()
}

/// Summarize the history of the repository containing `root`.
pub fn git_summary(root: &Path) -> GitSummary {
    let Some(shortlog) = git(root, &["shortlog", "-sn", "--no-merges", "HEAD"]) else {
        return GitSummary::default();
    };
    let contributors = parse_shortlog(&shortlog);

    let count = |args: &[&str]| -> usize {
        git(root, args)
            .and_then(|out| out.trim().parse().ok())
            .unwrap_or(0)
    };
    let since = format!("--since={}", RECENT_WINDOW);
    let total_commits = count(&["rev-list", "--count", "HEAD"]);
    let recent_commits = count(&["rev-list", "--count", &since, "HEAD"]);

    let last_commit = git(root, &["log", "-1", "--format=%cI"])
        .map(|out| out.trim().to_string())
        .filter(|s| !s.is_empty());

    GitSummary {
        contributors,
        total_commits,
        recent_commits,
        last_commit,
    }
}
