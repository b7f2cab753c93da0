//! Repository detectors.
//!
//! Detectors gather plain facts about the analyzed project (languages,
//! manifests, routes, models, config files, secrets, git history). Engines
//! score those facts and fold them into prompt context. Detector failures
//! never abort a run: unreadable files and failed git queries are skipped.

mod files;
mod frameworks;
mod git;
mod languages;
mod patterns;
mod tree;
mod types;

pub use files::{collect_files, relative_path, IgnoreSet};
pub use frameworks::{frameworks, package_manager, LOCKFILES};
pub use git::{git_summary, parse_shortlog};
pub use languages::{comment_prefix, language_for_extension};
pub use patterns::{find_models, find_routes, find_secrets};
pub use tree::render_tree;
pub use types::{
    ConfigPresence, Contributor, DataModel, GitSummary, LanguageStat, LargeFile, RepoFindings,
    Route, SecretHit,
};

use rayon::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

/// Source files longer than this are reported as large.
pub const LARGE_FILE_LINES: usize = 500;

/// Files bigger than this are not read.
const MAX_READ_BYTES: u64 = 1024 * 1024;

/// Per-file scan result.
#[derive(Debug, Default)]
struct FileScan {
    path: String,
    language: Option<&'static str>,
    lines: usize,
    comment_lines: usize,
    is_test: bool,
    routes: Vec<Route>,
    models: Vec<DataModel>,
    secrets: Vec<SecretHit>,
}

/// Whether a relative path looks like a test file.
pub fn is_test_file(rel: &str) -> bool {
    let lower = rel.to_ascii_lowercase();
    let name = lower.rsplit('/').next().unwrap_or(&lower);
    let in_test_dir = lower
        .split('/')
        .rev()
        .skip(1)
        .any(|dir| matches!(dir, "test" | "tests" | "__tests__" | "spec" | "e2e"));

    in_test_dir
        || name.starts_with("test_")
        || name.contains("_test.")
        || name.contains(".test.")
        || name.contains(".spec.")
        || name.contains("_spec.")
        || (name.ends_with("test.java") && name != "test.java")
}

fn scan_file(root: &Path, path: &Path) -> Option<FileScan> {
    let rel = relative_path(root, path);
    let size = fs::metadata(path).ok()?.len();
    if size > MAX_READ_BYTES {
        return Some(FileScan {
            path: rel,
            ..Default::default()
        });
    }
    // non-UTF-8 content is treated as binary and skipped
    let content = fs::read_to_string(path).ok()?;

    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    let language = language_for_extension(ext);
    let mut scan = FileScan {
        path: rel.clone(),
        language,
        secrets: find_secrets(&rel, &content),
        ..Default::default()
    };

    if let Some(language) = language {
        let prefix = comment_prefix(language);
        for line in content.lines() {
            let trimmed = line.trim_start();
            scan.lines += 1;
            if trimmed.starts_with(prefix) || trimmed.starts_with("/*") || trimmed.starts_with('*') {
                scan.comment_lines += 1;
            }
        }
        scan.is_test = is_test_file(&rel);
        if !scan.is_test {
            scan.routes = find_routes(&rel, &content);
        }
        scan.models = find_models(&rel, &content);
    }

    Some(scan)
}

/// Presence flags for well-known files at the project root.
pub fn config_presence(root: &Path) -> ConfigPresence {
    let names: HashSet<String> = fs::read_dir(root)
        .map(|read| {
            read.flatten()
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    let lower: Vec<String> = names.iter().map(|n| n.to_ascii_lowercase()).collect();

    let starts = |prefix: &str| lower.iter().any(|n| n.starts_with(prefix));
    let has = |name: &str| names.contains(name);
    let exists = |rel: &str| root.join(rel).exists();

    ConfigPresence {
        readme: starts("readme"),
        license: starts("license") || starts("licence") || starts("copying"),
        contributing: starts("contributing") || exists(".github/CONTRIBUTING.md"),
        changelog: starts("changelog") || starts("changes") || has("HISTORY.md"),
        code_of_conduct: starts("code_of_conduct") || exists(".github/CODE_OF_CONDUCT.md"),
        security_policy: starts("security") || exists(".github/SECURITY.md"),
        codeowners: has("CODEOWNERS")
            || exists(".github/CODEOWNERS")
            || exists("docs/CODEOWNERS"),
        docs_dir: root.join("docs").is_dir() || root.join("doc").is_dir(),
        gitignore: has(".gitignore"),
        env_file: [".env", ".env.local", ".env.production"]
            .iter()
            .any(|n| has(n)),
        env_example: [".env.example", ".env.sample", ".env.template"]
            .iter()
            .any(|n| has(n)),
        dockerfile: has("Dockerfile") || has("Containerfile"),
        docker_compose: ["docker-compose.yml", "docker-compose.yaml", "compose.yml", "compose.yaml"]
            .iter()
            .any(|n| has(n)),
        ci_config: root.join(".github/workflows").is_dir()
            || [
                ".gitlab-ci.yml",
                ".circleci",
                "Jenkinsfile",
                "azure-pipelines.yml",
                ".travis.yml",
                "bitbucket-pipelines.yml",
            ]
            .iter()
            .any(|n| has(n)),
        lint_config: starts(".eslintrc")
            || starts("eslint.config")
            || starts(".prettierrc")
            || starts(".golangci")
            || [
                "ruff.toml",
                ".flake8",
                "rustfmt.toml",
                ".rustfmt.toml",
                "clippy.toml",
                ".editorconfig",
                "biome.json",
                ".rubocop.yml",
            ]
            .iter()
            .any(|n| has(n)),
        lockfile: LOCKFILES.iter().any(|(n, _)| has(n)),
    }
}

/// Scan the project at `root`. Git history is gathered separately by
/// [`git_summary`].
pub fn scan(root: &Path, ignore: &IgnoreSet) -> RepoFindings {
    let files = collect_files(root, ignore);
    let scans: Vec<FileScan> = files
        .par_iter()
        .filter_map(|path| scan_file(root, path))
        .collect();

    let mut findings = RepoFindings {
        file_count: files.len(),
        frameworks: frameworks(root),
        package_manager: package_manager(root),
        config: config_presence(root),
        ..Default::default()
    };

    let mut languages: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();
    for scan in scans {
        if let Some(language) = scan.language {
            let stat = languages.entry(language).or_default();
            stat.0 += 1;
            stat.1 += scan.lines;
            findings.total_lines += scan.lines;
            findings.comment_lines += scan.comment_lines;
            if scan.is_test {
                findings.test_files += 1;
            } else {
                findings.source_files += 1;
            }
            if scan.lines > LARGE_FILE_LINES {
                findings.large_files.push(LargeFile {
                    path: scan.path.clone(),
                    lines: scan.lines,
                });
            }
        }
        findings.routes.extend(scan.routes);
        findings.models.extend(scan.models);
        findings.secrets.extend(scan.secrets);
    }

    findings.languages = languages
        .into_iter()
        .map(|(name, (files, lines))| LanguageStat {
            name: name.to_string(),
            files,
            lines,
        })
        .collect();
    findings
        .languages
        .sort_by(|a, b| b.lines.cmp(&a.lines).then_with(|| a.name.cmp(&b.name)));
    findings.large_files.sort_by(|a, b| b.lines.cmp(&a.lines));

    findings.directories = fs::read_dir(root)
        .map(|read| {
            let mut dirs: Vec<String> = read
                .flatten()
                .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|name| !files::is_skipped_dir(name))
                .filter(|name| !ignore.is_ignored(root, &root.join(name)))
                .collect();
            dirs.sort();
            dirs
        })
        .unwrap_or_default();

    tracing::debug!(
        files = findings.file_count,
        languages = findings.languages.len(),
        routes = findings.routes.len(),
        "repository scanned"
    );

    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_is_test_file() {
        assert!(is_test_file("tests/integration.rs"));
        assert!(is_test_file("src/__tests__/app.js"));
        assert!(is_test_file("pkg/server_test.go"));
        assert!(is_test_file("src/app.spec.ts"));
        assert!(is_test_file("test_models.py"));
        assert!(is_test_file("src/main/java/UserServiceTest.java"));
        assert!(!is_test_file("src/contest.rs"));
        assert!(!is_test_file("src/main.rs"));
    }

    #[test]
    fn test_scan_project() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "README.md", "# Demo\n");
        write(root, ".gitignore", "target\n");
        write(root, ".env", "SECRET=1\n");
        write(root, "Cargo.toml", "[dependencies]\naxum = \"0.7\"\n");
        write(root, "Cargo.lock", "");
        write(
            root,
            "src/main.rs",
            "// entry point\nfn main() {\n    let app = Router::new().route(\"/health\", get(health));\n}\n",
        );
        write(root, "tests/api.rs", "#[test]\nfn works() {}\n");
        write(root, ".github/workflows/ci.yml", "on: push\n");
        write(root, "node_modules/x/index.js", "app.get('/hidden', h)\n");

        let findings = scan(root, &IgnoreSet::default());

        assert_eq!(findings.languages.len(), 1);
        assert_eq!(findings.languages[0].name, "Rust");
        assert_eq!(findings.languages[0].files, 2);
        assert_eq!(findings.source_files, 1);
        assert_eq!(findings.test_files, 1);
        assert_eq!(findings.total_lines, 6);
        assert_eq!(findings.comment_lines, 1);
        assert_eq!(findings.routes.len(), 1);
        assert_eq!(findings.routes[0].path, "/health");
        assert_eq!(findings.frameworks, vec!["Axum"]);
        assert_eq!(findings.package_manager.as_deref(), Some("cargo"));
        assert_eq!(findings.directories, vec!["src", "tests"]);

        let config = findings.config;
        assert!(config.readme);
        assert!(config.gitignore);
        assert!(config.env_file);
        assert!(config.ci_config);
        assert!(config.lockfile);
        assert!(!config.license);
        assert!(!config.dockerfile);
    }

    #[test]
    fn test_large_and_binary_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "src/big.py", &"x = 1\n".repeat(LARGE_FILE_LINES + 10));
        fs::write(root.join("logo.png"), [0xff_u8, 0xfe, 0x00, 0x9f]).unwrap();

        let findings = scan(root, &IgnoreSet::default());
        assert_eq!(findings.file_count, 2);
        assert_eq!(findings.large_files.len(), 1);
        assert_eq!(findings.large_files[0].path, "src/big.py");
        assert_eq!(findings.large_files[0].lines, LARGE_FILE_LINES + 10);
    }
}
