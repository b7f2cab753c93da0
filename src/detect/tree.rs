//! Bounded directory tree rendering for prompt context.

use std::fs;
use std::path::Path;

use super::files::{is_skipped_dir, IgnoreSet};

/// Entries listed per directory before eliding the rest.
const MAX_ENTRIES: usize = 25;

/// Render the tree under `root` to `depth` levels. Directories are listed
/// before files, each group sorted by name.
pub fn render_tree(root: &Path, ignore: &IgnoreSet, depth: usize) -> String {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| ".".to_string());
    let mut out = format!("{}/\n", name);
    render_dir(root, root, ignore, depth, "", &mut out);
    out
}

fn render_dir(root: &Path, dir: &Path, ignore: &IgnoreSet, depth: usize, prefix: &str, out: &mut String) {
    if depth == 0 {
        return;
    }
    let Ok(read) = fs::read_dir(dir) else {
        return;
    };

    let mut dirs = Vec::new();
    let mut files = Vec::new();
    for entry in read.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            if is_skipped_dir(&name) || ignore.is_ignored(root, &path) {
                continue;
            }
            dirs.push((name, path));
        } else if !ignore.is_ignored(root, &path) {
            files.push((name, path));
        }
    }
    dirs.sort();
    files.sort();

    let total = dirs.len() + files.len();
    let entries: Vec<(String, bool, std::path::PathBuf)> = dirs
        .into_iter()
        .map(|(n, p)| (n, true, p))
        .chain(files.into_iter().map(|(n, p)| (n, false, p)))
        .take(MAX_ENTRIES)
        .collect();
    let shown = entries.len();

    for (i, (name, is_dir, path)) in entries.into_iter().enumerate() {
        let last = i + 1 == shown && shown == total;
        let (branch, indent) = if last { ("└── ", "    ") } else { ("├── ", "│   ") };
        if is_dir {
            out.push_str(&format!("{}{}{}/\n", prefix, branch, name));
            render_dir(root, &path, ignore, depth - 1, &format!("{}{}", prefix, indent), out);
        } else {
            out.push_str(&format!("{}{}{}\n", prefix, branch, name));
        }
    }

    if shown < total {
        out.push_str(&format!("{}└── ... ({} more)\n", prefix, total - shown));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_render_tree() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/nested")).unwrap();
        fs::create_dir_all(temp.path().join("node_modules/x")).unwrap();
        fs::write(temp.path().join("src/main.rs"), "").unwrap();
        fs::write(temp.path().join("src/nested/deep.rs"), "").unwrap();
        fs::write(temp.path().join("README.md"), "").unwrap();

        let tree = render_tree(temp.path(), &IgnoreSet::default(), 2);
        let body: Vec<&str> = tree.lines().skip(1).collect();
        assert_eq!(
            body,
            vec![
                "├── src/",
                "│   ├── nested/",
                "│   └── main.rs",
                "└── README.md",
            ]
        );
        assert!(!tree.contains("node_modules"));
        assert!(!tree.contains("deep.rs"));
    }

    #[test]
    fn test_elides_long_directories() {
        let temp = TempDir::new().unwrap();
        for i in 0..30 {
            fs::write(temp.path().join(format!("f{:02}.txt", i)), "").unwrap();
        }
        let tree = render_tree(temp.path(), &IgnoreSet::default(), 1);
        assert!(tree.contains("f24.txt"));
        assert!(!tree.contains("f25.txt"));
        assert!(tree.contains("... (5 more)"));
    }
}
