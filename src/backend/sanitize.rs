//! Cleanup of free-text backend output.
//!
//! Backends tend to narrate what they are doing ("I'll start by reading the
//! README...") around the content we actually asked for. Narration lines are
//! dropped; structural markdown (headings, list items, table rows, quotes and
//! anything inside a fenced block) is always kept verbatim.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// First-person and meta-commentary openers.
    static ref NARRATION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)^(i['’]ll|i will|i['’]m going to|i am going to|let me|let['’]s|i['’]ve|i have|i need to|i can see|i notice|i found|now i|now let me|first,? i|next,? i)\b").unwrap(),
        Regex::new(r"(?i)^(here['’]s|here is|here are)\b.*:\s*$").unwrap(),
        Regex::new(r"(?i)^(sure|certainly|okay|ok|great|alright|absolutely|perfect)[,.!]").unwrap(),
        Regex::new(r"(?i)^based on (my|the|your) (analysis|review|exploration|investigation)\b").unwrap(),
        Regex::new(r"(?i)^(looking at|reading|analyzing|checking|exploring|examining|scanning) (the|this|your)\b").unwrap(),
        Regex::new(r"(?i)^(done|finished|complete)[.!]?$").unwrap(),
        Regex::new(r"(?i)^(this|the) (document|report|file|diagram) (has been|was|is now) (generated|created|written|saved)\b").unwrap(),
        Regex::new(r"(?i)^(i hope this helps|let me know|feel free to)\b").unwrap(),
    ];

    static ref ORDERED_ITEM: Regex = Regex::new(r"^\d+[.)]\s").unwrap();
}

/// Whether a trimmed line is structural markdown that must survive cleanup.
fn is_structural(trimmed: &str) -> bool {
    trimmed.starts_with('#')
        || trimmed.starts_with("- ")
        || trimmed.starts_with("* ")
        || trimmed.starts_with("+ ")
        || trimmed.starts_with('|')
        || trimmed.starts_with('>')
        || ORDERED_ITEM.is_match(trimmed)
}

fn is_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

fn is_narration(trimmed: &str) -> bool {
    NARRATION_PATTERNS.iter().any(|re| re.is_match(trimmed))
}

/// Clean raw backend output.
///
/// Drops narration lines outside fenced blocks, collapses runs of three or
/// more blank lines into one, and trims the result.
pub fn clean(raw: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut blank_run = 0usize;
    // blanks seen before a dropped line; the run after it replaces rather than adds
    let mut held = 0usize;

    for line in raw.lines() {
        let trimmed = line.trim();

        if is_fence(trimmed) {
            flush_blanks(&mut out, &mut blank_run, &mut held);
            in_fence = !in_fence;
            out.push(line);
            continue;
        }

        if in_fence {
            out.push(line);
            continue;
        }

        if trimmed.is_empty() {
            blank_run += 1;
            continue;
        }

        if !is_structural(trimmed) && is_narration(trimmed) {
            held = held.max(blank_run);
            blank_run = 0;
            continue;
        }

        flush_blanks(&mut out, &mut blank_run, &mut held);
        out.push(line);
    }

    out.join("\n").trim().to_string()
}

fn flush_blanks(out: &mut Vec<&str>, blank_run: &mut usize, held: &mut usize) {
    let run = (*blank_run).max(*held);
    let keep = if run >= 3 { 1 } else { run };
    for _ in 0..keep {
        out.push("");
    }
    *blank_run = 0;
    *held = 0;
}
