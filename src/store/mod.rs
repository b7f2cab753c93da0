//! Artifact store: the output directory of a run.
//!
//! The store owns the output directory for the duration of a run. It
//! initializes (or, with `force`, wipes) the directory, normalizes and writes
//! every artifact an engine produces, keeps count of what was written, and
//! performs the format-specific export step at the end of the run.

pub mod html;
pub mod normalize;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::StoreConfig;

/// File name of the consolidated JSON export.
pub const BUNDLE_FILE: &str = "repolens-bundle.json";

/// File name of the HTML index page.
pub const INDEX_FILE: &str = "index.html";

const TOOL_NAME: &str = "repolens";

/// Errors from the artifact store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("output directory {0} is not empty (use --force to overwrite)")]
    NotEmpty(PathBuf),
    #[error("output path {0} exists and is not a directory")]
    NotADirectory(PathBuf),
    #[error("artifact {0} was already written in this run")]
    AlreadyWritten(String),
    #[error("invalid artifact path {0:?}: must be relative and stay inside the output directory")]
    InvalidPath(String),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Output format of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Markdown,
    Html,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An artifact persisted during this run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WrittenArtifact {
    pub path: String,
    pub content: String,
}

/// Consolidated JSON export document.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonBundle {
    pub tool: String,
    pub version: String,
    pub generated_at: String,
    pub files: Vec<WrittenArtifact>,
}

/// Manages one run's output directory.
pub struct ArtifactStore {
    root: PathBuf,
    format: OutputFormat,
    force: bool,
    policy: StoreConfig,
    written: Vec<WrittenArtifact>,
    exported: Vec<PathBuf>,
    file_count: usize,
}

impl ArtifactStore {
    pub fn new<P: AsRef<Path>>(root: P, format: OutputFormat, policy: StoreConfig) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            format,
            force: false,
            policy,
            written: Vec::new(),
            exported: Vec::new(),
            file_count: 0,
        }
    }

    /// Allow `initialize` to wipe a non-empty directory.
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Number of artifacts written in this run.
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    pub fn written(&self) -> &[WrittenArtifact] {
        &self.written
    }

    /// Files produced by `finalize`.
    pub fn exported(&self) -> &[PathBuf] {
        &self.exported
    }

    /// Prepare the output directory.
    ///
    /// A missing directory is created. A non-empty one is an error unless
    /// `force` is set, in which case it is wiped and the preserved files
    /// (the history ledger) are restored byte for byte.
    pub fn initialize(&mut self) -> Result<(), StoreError> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;
            debug!(path = %self.root.display(), "created output directory");
            return Ok(());
        }

        if !self.root.is_dir() {
            return Err(StoreError::NotADirectory(self.root.clone()));
        }

        let is_empty = fs::read_dir(&self.root)
            .map_err(io_err(&self.root))?
            .next()
            .is_none();
        if is_empty {
            return Ok(());
        }

        if !self.force {
            return Err(StoreError::NotEmpty(self.root.clone()));
        }

        let mut preserved: Vec<(PathBuf, Vec<u8>)> = Vec::new();
        for name in &self.policy.preserved_files {
            let path = self.root.join(name);
            if path.is_file() {
                let bytes = fs::read(&path).map_err(io_err(&path))?;
                preserved.push((path, bytes));
            }
        }

        fs::remove_dir_all(&self.root).map_err(io_err(&self.root))?;
        fs::create_dir_all(&self.root).map_err(io_err(&self.root))?;

        for (path, bytes) in preserved {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(io_err(parent))?;
            }
            fs::write(&path, bytes).map_err(io_err(&path))?;
        }

        info!(path = %self.root.display(), "wiped output directory");
        Ok(())
    }

    /// Normalize and persist one artifact. Returns the absolute path.
    ///
    /// A path may only be written once per run. On failure nothing is
    /// recorded and the file count is unchanged.
    pub fn write(&mut self, relative: &str, content: &str) -> Result<PathBuf, StoreError> {
        let key = artifact_key(relative)?;
        let rel = PathBuf::from(&key);

        if self.written.iter().any(|a| a.path == key) {
            return Err(StoreError::AlreadyWritten(key));
        }

        let normalized = normalize::normalize(&rel, content, &self.policy);
        let target = self.root.join(&rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        fs::write(&target, &normalized).map_err(io_err(&target))?;

        debug!(path = %key, bytes = normalized.len(), "wrote artifact");
        self.written.push(WrittenArtifact {
            path: key,
            content: normalized,
        });
        self.file_count += 1;
        Ok(target)
    }

    /// Run the format-specific export. Markdown output needs no export.
    pub fn finalize(&mut self, title: &str) -> Result<&[PathBuf], StoreError> {
        match self.format {
            OutputFormat::Markdown => {}
            OutputFormat::Json => self.export_json()?,
            OutputFormat::Html => self.export_html(title)?,
        }
        Ok(&self.exported)
    }

    fn export_json(&mut self) -> Result<(), StoreError> {
        let bundle = JsonBundle {
            tool: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Utc::now().to_rfc3339(),
            files: self.written.clone(),
        };
        let json = serde_json::to_string_pretty(&bundle)?;
        let path = self.root.join(BUNDLE_FILE);
        fs::write(&path, json).map_err(io_err(&path))?;
        self.exported.push(path);
        Ok(())
    }

    fn export_html(&mut self, title: &str) -> Result<(), StoreError> {
        let mut links: Vec<(String, String)> = Vec::new();
        let mut used: Vec<String> = Vec::new();

        for artifact in &self.written {
            let source = Path::new(&artifact.path);
            let body = if normalize::is_markdown(source) {
                html::render_markdown(&artifact.content)
            } else if normalize::is_diagram(source) {
                html::diagram_block(&artifact.content)
            } else {
                html::preformatted(&artifact.content)
            };

            let href = html_path(&artifact.path, &used);
            let target = self.root.join(&href);
            fs::write(&target, html::page(&artifact.path, &body)).map_err(io_err(&target))?;

            used.push(href.clone());
            links.push((href, artifact.path.clone()));
            self.exported.push(target);
        }

        let index = self.root.join(INDEX_FILE);
        fs::write(&index, html::index_page(title, &links)).map_err(io_err(&index))?;
        self.exported.push(index);
        Ok(())
    }
}

/// HTML name for an artifact: the extension becomes `.html`. If that name is
/// already taken, `.html` is appended to the full name instead.
fn html_path(path: &str, used: &[String]) -> String {
    let swapped = Path::new(path)
        .with_extension("html")
        .to_string_lossy()
        .replace('\\', "/");
    if swapped == INDEX_FILE || used.contains(&swapped) || swapped == path {
        format!("{}.html", path)
    } else {
        swapped
    }
}

/// Canonical `/`-joined key for an artifact path. `.` segments and repeated
/// separators collapse, so aliases of one file share a key.
fn artifact_key(relative: &str) -> Result<String, StoreError> {
    let mut parts: Vec<&str> = Vec::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => match part.to_str() {
                Some(part) => parts.push(part),
                None => return Err(StoreError::InvalidPath(relative.to_string())),
            },
            Component::CurDir => {}
            _ => return Err(StoreError::InvalidPath(relative.to_string())),
        }
    }
    if parts.is_empty() {
        return Err(StoreError::InvalidPath(relative.to_string()));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(root: &Path, format: OutputFormat) -> ArtifactStore {
        ArtifactStore::new(root, format, StoreConfig::default())
    }

    #[test]
    fn test_initialize_creates_missing_dir() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("out");
        store(&root, OutputFormat::Markdown).initialize().unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn test_initialize_empty_dir_ok() {
        let temp = TempDir::new().unwrap();
        store(temp.path(), OutputFormat::Markdown).initialize().unwrap();
    }

    #[test]
    fn test_initialize_not_empty_without_force() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("old.md"), "old").unwrap();

        let err = store(temp.path(), OutputFormat::Markdown)
            .initialize()
            .unwrap_err();
        assert!(matches!(err, StoreError::NotEmpty(_)));
        assert!(err.to_string().contains("not empty"));
        // nothing was touched
        assert!(temp.path().join("old.md").exists());
    }

    #[test]
    fn test_initialize_force_preserves_history() {
        let temp = TempDir::new().unwrap();
        let history = b"[{\"overallScore\": 71}]\n";
        fs::write(temp.path().join(crate::history::HISTORY_FILE), history).unwrap();
        fs::write(temp.path().join("stale.md"), "stale").unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/OVERVIEW.md"), "old").unwrap();

        store(temp.path(), OutputFormat::Markdown)
            .force(true)
            .initialize()
            .unwrap();

        assert_eq!(
            fs::read(temp.path().join(crate::history::HISTORY_FILE)).unwrap(),
            history
        );
        assert!(!temp.path().join("stale.md").exists());
        assert!(!temp.path().join("docs").exists());
    }

    #[test]
    fn test_write_counts_and_normalizes() {
        let temp = TempDir::new().unwrap();
        let mut store = store(temp.path(), OutputFormat::Markdown);
        store.initialize().unwrap();

        let path = store
            .write("ci/ci.yml", "```yaml\nname: CI\non: push\n```")
            .unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "name: CI\non: push\n");

        store.write("docs/OVERVIEW.md", "# Overview").unwrap();
        assert_eq!(store.file_count(), 2);
        assert_eq!(store.written()[1].path, "docs/OVERVIEW.md");
    }

    #[test]
    fn test_write_same_path_twice_rejected() {
        let temp = TempDir::new().unwrap();
        let mut store = store(temp.path(), OutputFormat::Markdown);
        store.write("a.md", "first").unwrap();

        let err = store.write("a.md", "second").unwrap_err();
        assert!(matches!(err, StoreError::AlreadyWritten(_)));
        assert_eq!(store.file_count(), 1);
        assert_eq!(fs::read_to_string(temp.path().join("a.md")).unwrap(), "first\n");
    }

    #[test]
    fn test_write_alias_of_same_path_rejected() {
        let temp = TempDir::new().unwrap();
        let mut store = store(temp.path(), OutputFormat::Markdown);
        store.write("docs/a.md", "first").unwrap();

        for alias in ["docs/./a.md", "docs//a.md", "./docs/a.md"] {
            let err = store.write(alias, "again").unwrap_err();
            assert!(matches!(err, StoreError::AlreadyWritten(ref key) if key == "docs/a.md"));
        }
        assert_eq!(store.file_count(), 1);
        assert_eq!(store.written().len(), 1);
        assert_eq!(fs::read_to_string(temp.path().join("docs/a.md")).unwrap(), "first\n");
    }

    #[test]
    fn test_write_key_is_normalized() {
        let temp = TempDir::new().unwrap();
        let mut store = store(temp.path(), OutputFormat::Markdown);
        store.write("./docs//b.md", "text").unwrap();
        assert_eq!(store.written()[0].path, "docs/b.md");
        assert!(matches!(store.write(".", "x"), Err(StoreError::InvalidPath(_))));
    }

    #[test]
    fn test_write_rejects_escaping_paths() {
        let temp = TempDir::new().unwrap();
        let mut store = store(temp.path(), OutputFormat::Markdown);
        assert!(matches!(
            store.write("../escape.md", "x"),
            Err(StoreError::InvalidPath(_))
        ));
        assert!(matches!(
            store.write("/etc/passwd", "x"),
            Err(StoreError::InvalidPath(_))
        ));
        assert_eq!(store.file_count(), 0);
    }

    #[test]
    fn test_finalize_json_bundle() {
        let temp = TempDir::new().unwrap();
        let mut store = store(temp.path(), OutputFormat::Json);
        store.write("docs/OVERVIEW.md", "# Overview").unwrap();
        store.write("ci/ci.yml", "name: CI").unwrap();

        let exported = store.finalize("demo").unwrap().to_vec();
        assert_eq!(exported, vec![temp.path().join(BUNDLE_FILE)]);

        let bundle: JsonBundle =
            serde_json::from_str(&fs::read_to_string(&exported[0]).unwrap()).unwrap();
        assert_eq!(bundle.tool, "repolens");
        assert_eq!(bundle.files.len(), 2);
        assert_eq!(bundle.files[0].path, "docs/OVERVIEW.md");
        assert_eq!(bundle.files[1].content, "name: CI\n");
    }

    #[test]
    fn test_finalize_html_export() {
        let temp = TempDir::new().unwrap();
        let mut store = store(temp.path(), OutputFormat::Html);
        store
            .write("docs/OVERVIEW.md", "# Overview\n\n<img src=x onerror=alert(1)>\n\n```mermaid\ngraph TD\nA-->B\n```")
            .unwrap();
        store.write("architecture/diagram.mmd", "graph LR\nX-->Y").unwrap();
        store.write("ci/ci.yml", "name: <CI>").unwrap();

        let exported = store.finalize("demo").unwrap().to_vec();
        assert_eq!(exported.len(), 4);

        let overview = fs::read_to_string(temp.path().join("docs/OVERVIEW.html")).unwrap();
        assert!(overview.contains("<h1>Overview</h1>"));
        assert!(!overview.contains("<img"));
        assert!(overview.contains("<div class=\"mermaid\">"));

        let diagram = fs::read_to_string(temp.path().join("architecture/diagram.html")).unwrap();
        assert!(diagram.contains("<div class=\"mermaid\">\ngraph LR\nX--&gt;Y\n</div>"));

        let ci = fs::read_to_string(temp.path().join("ci/ci.html")).unwrap();
        assert!(ci.contains("<pre><code>name: &lt;CI&gt;"));

        let index = fs::read_to_string(temp.path().join(INDEX_FILE)).unwrap();
        assert!(index.contains("href=\"docs/OVERVIEW.html\""));
        assert!(index.contains("href=\"architecture/diagram.html\""));
        assert!(index.contains("href=\"ci/ci.html\""));
        // the markdown sources remain alongside the export
        assert!(temp.path().join("docs/OVERVIEW.md").exists());
    }

    #[test]
    fn test_finalize_markdown_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut store = store(temp.path(), OutputFormat::Markdown);
        store.write("a.md", "a").unwrap();
        assert!(store.finalize("demo").unwrap().is_empty());
    }

    #[test]
    fn test_html_path_collisions() {
        assert_eq!(html_path("docs/A.md", &[]), "docs/A.html");
        assert_eq!(html_path("Dockerfile", &[]), "Dockerfile.html");
        assert_eq!(
            html_path("ci/ci.yml", &["ci/ci.html".to_string()]),
            "ci/ci.yml.html"
        );
        assert_eq!(html_path("index.md", &[]), "index.md.html");
    }
}
