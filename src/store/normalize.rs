//! Content normalization for raw (non-prose) artifacts.
//!
//! Backends often wrap config files in markdown fences and surround them
//! with explanations. For raw file types the largest fenced block is taken as
//! the payload and everything else is discarded.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use crate::config::StoreConfig;

lazy_static! {
    /// A markdown heading line. Lines with `=` are left alone so Dockerfile
    /// parser directives like `# syntax=docker/dockerfile:1` survive.
    static ref MARKDOWN_TITLE: Regex = Regex::new(r"^#{1,6}\s+[^=]+$").unwrap();
}

/// Whether a path names a raw (non-prose) file type.
pub fn is_raw(path: &Path, policy: &StoreConfig) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if policy.raw_file_names.iter().any(|n| n == name) {
        return true;
    }
    let ext = extension(path);
    !ext.is_empty() && policy.raw_extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
}

/// Whether a stray leading `# Title` should be dropped (YAML and Dockerfiles).
pub fn strips_title(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    matches!(extension(path).as_str(), "yml" | "yaml" | "dockerfile")
        || name == "Dockerfile"
        || name == "Containerfile"
}

/// Whether a path is a diagram-only file.
pub fn is_diagram(path: &Path) -> bool {
    matches!(extension(path).as_str(), "mmd" | "mermaid")
}

pub fn is_markdown(path: &Path) -> bool {
    matches!(extension(path).as_str(), "md" | "markdown")
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

fn fence_marker(trimmed: &str) -> Option<&'static str> {
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

/// Inner text of every fenced block, in order. An unclosed block runs to the
/// end of the input.
pub fn fenced_blocks(content: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut current: Option<(&str, Vec<&str>)> = None;

    for line in content.lines() {
        let trimmed = line.trim();
        match current.as_mut() {
            None => {
                if let Some(marker) = fence_marker(trimmed) {
                    current = Some((marker, Vec::new()));
                }
            }
            Some((marker, lines)) => {
                if trimmed.starts_with(*marker) {
                    blocks.push(lines.join("\n"));
                    current = None;
                } else {
                    lines.push(line);
                }
            }
        }
    }

    if let Some((_, lines)) = current {
        blocks.push(lines.join("\n"));
    }

    blocks
}

/// The largest non-empty fenced block, if any. Ties go to the earlier block.
pub fn largest_fenced_block(content: &str) -> Option<String> {
    let mut best: Option<String> = None;
    for block in fenced_blocks(content) {
        if block.trim().is_empty() {
            continue;
        }
        let bigger = best
            .as_ref()
            .map(|b| block.chars().count() > b.chars().count())
            .unwrap_or(true);
        if bigger {
            best = Some(block);
        }
    }
    best
}

/// Drop any line that is only a fence marker.
pub fn strip_fence_markers(content: &str) -> String {
    content
        .lines()
        .filter(|line| fence_marker(line.trim()).is_none())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Drop a markdown `# Title` line if it comes before any real content.
pub fn strip_leading_title(content: &str) -> String {
    let mut lines: Vec<&str> = content.lines().collect();
    if let Some(first) = lines.iter().position(|l| !l.trim().is_empty()) {
        if MARKDOWN_TITLE.is_match(lines[first].trim()) {
            lines.remove(first);
        }
    }
    lines.join("\n")
}

/// Normalize artifact content before it is persisted.
///
/// Raw files get their fenced payload extracted and fence markers removed;
/// YAML and Dockerfiles also lose a leading markdown title. Every file ends
/// with exactly one newline.
pub fn normalize(path: &Path, content: &str, policy: &StoreConfig) -> String {
    let mut body = content.to_string();

    if is_raw(path, policy) {
        if let Some(block) = largest_fenced_block(&body) {
            body = block;
        }
        body = strip_fence_markers(&body);
        if strips_title(path) {
            body = strip_leading_title(&body);
        }
        body = body.trim().to_string();
    } else {
        body = body.trim_end().to_string();
    }

    body.push('\n');
    body
}
