//! Security engine.

use async_trait::async_trait;

use super::{bullet_list, Engine, EngineError, EngineInput};
use crate::detect::RepoFindings;
use crate::score::{categories, CategoryResult, ScoreCard};
use crate::store::ArtifactStore;

const REPORT_TASK: &str = "Write a security review in markdown. Cover the potential secrets and \
configuration issues listed in the findings, authentication and input handling risks you can \
see in the code, and a prioritized remediation list. Never repeat secret values.";

/// Points deducted per secret hit, and the cap on that deduction.
const SECRET_PENALTY: i32 = 10;
const SECRET_PENALTY_CAP: i32 = 40;

pub struct SecurityEngine;

pub fn score(findings: &RepoFindings) -> CategoryResult {
    let config = &findings.config;
    let mut card = ScoreCard::new(100);

    if config.env_file {
        card.deduct(25, ".env file committed");
    }
    let hits = findings.secrets.len() as i32;
    if hits > 0 {
        card.deduct(
            (hits * SECRET_PENALTY).min(SECRET_PENALTY_CAP),
            format!("{} potential secrets", hits),
        );
    }
    if !config.lockfile {
        card.deduct(10, "no dependency lockfile");
    }
    if !config.gitignore {
        card.deduct(10, "no .gitignore");
    }
    if !config.security_policy {
        card.deduct(5, "no security policy");
    }

    card.finish(categories::SECURITY)
}

#[async_trait]
impl Engine for SecurityEngine {
    fn name(&self) -> &'static str {
        "security"
    }

    fn category(&self) -> &'static str {
        categories::SECURITY
    }

    async fn run(
        &self,
        mut input: EngineInput<'_>,
        store: &mut ArtifactStore,
    ) -> Result<CategoryResult, EngineError> {
        let findings = input.findings;
        let config = &findings.config;

        // locations and kinds only
        let hits = findings
            .secrets
            .iter()
            .map(|s| format!("{} at {}:{}", s.kind, s.file, s.line));
        input.context.append_context(&format!(
            "Potential secrets:\n{}\n.env committed: {}\n.env example: {}\nLockfile: {}\n.gitignore: {}\nSecurity policy: {}",
            bullet_list(hits, "none found"),
            yes_no(config.env_file),
            yes_no(config.env_example),
            yes_no(config.lockfile),
            yes_no(config.gitignore),
            yes_no(config.security_policy),
        ));

        input
            .generate_into(store, "security/SECURITY_REPORT.md", REPORT_TASK)
            .await?;

        Ok(score(findings))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{ConfigPresence, SecretHit};

    fn hit(line: usize) -> SecretHit {
        SecretHit {
            kind: "aws-access-key".into(),
            file: "config.js".into(),
            line,
        }
    }

    #[test]
    fn test_clean_project() {
        let findings = RepoFindings {
            config: ConfigPresence {
                lockfile: true,
                gitignore: true,
                security_policy: true,
                ..Default::default()
            },
            ..Default::default()
        };
        let result = score(&findings);
        assert_eq!(result.score, 100);
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_secret_penalty_is_capped() {
        let findings = RepoFindings {
            config: ConfigPresence {
                env_file: true,
                lockfile: true,
                gitignore: true,
                security_policy: true,
                ..Default::default()
            },
            secrets: (1..=7).map(hit).collect(),
            ..Default::default()
        };
        let result = score(&findings);
        assert_eq!(result.score, 35);
        assert_eq!(result.details, "-25 .env file committed; -40 7 potential secrets");
    }
}
