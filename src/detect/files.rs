//! Project file collection.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never worth scanning.
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "vendor",
    "target",
    "dist",
    "build",
    "out",
    "coverage",
    "__pycache__",
    "venv",
    "env",
    "bower_components",
];

/// User ignore globs plus directories excluded by path (the output directory).
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    globs: GlobSet,
    excluded: Vec<PathBuf>,
}

impl Default for IgnoreSet {
    fn default() -> Self {
        Self {
            globs: GlobSet::empty(),
            excluded: Vec::new(),
        }
    }
}

impl IgnoreSet {
    /// Compile ignore patterns. Patterns match paths relative to the project
    /// root, using `/` separators.
    pub fn new(patterns: &[String]) -> anyhow::Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern)
                .map_err(|e| anyhow::anyhow!("invalid ignore pattern {:?}: {}", pattern, e))?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .map_err(|e| anyhow::anyhow!("building ignore set: {}", e))?;
        Ok(Self {
            globs,
            excluded: Vec::new(),
        })
    }

    /// Never descend into `dir`.
    pub fn exclude_dir(mut self, dir: &Path) -> Self {
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        self.excluded.push(dir);
        self
    }

    /// Whether `path` (absolute, under `root`) should be skipped.
    pub fn is_ignored(&self, root: &Path, path: &Path) -> bool {
        if !self.excluded.is_empty() {
            let absolute = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
            if self.excluded.iter().any(|dir| absolute.starts_with(dir)) {
                return true;
            }
        }
        if self.globs.is_empty() {
            return false;
        }
        let rel = relative_path(root, path);
        !rel.is_empty() && self.globs.is_match(&rel)
    }
}

/// `path` relative to `root`, with `/` separators.
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether a directory name is skipped by default.
pub fn is_skipped_dir(name: &str) -> bool {
    name.starts_with('.') || SKIP_DIRS.contains(&name)
}

/// Every regular file under `root`, skipping hidden and build directories and
/// anything matched by `ignore`. Unreadable entries are dropped.
pub fn collect_files(root: &Path, ignore: &IgnoreSet) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            if e.depth() == 0 {
                return true;
            }
            if e.file_type().is_dir() && is_skipped_dir(&e.file_name().to_string_lossy()) {
                return false;
            }
            !ignore.is_ignored(root, e.path())
        })
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files
}
