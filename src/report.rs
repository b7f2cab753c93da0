//! Output formatting for repolens results.
//!
//! - Aggregate summary (`analysis.json`) and health report markdown, both
//!   written into the output directory by the health engine
//! - Pretty: colored terminal output for humans

use chrono::{DateTime, Utc};
use colored::*;
use serde::{Deserialize, Serialize};

use crate::context::AnalysisContext;
use crate::detect::RepoFindings;
use crate::history::{self, HistoryComparison, RunHistoryEntry};
use crate::orchestrator::RunOutcome;
use crate::score::{CategoryResult, Grade, Weights};

const TOOL_NAME: &str = "repolens";

// =============================================================================
// Aggregate summary
// =============================================================================

/// One run's aggregate summary. Does not roll up history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub project: String,
    pub analyzed_at: DateTime<Utc>,
    pub overall_score: i32,
    pub overall_grade: Grade,
    pub languages: Vec<String>,
    pub frameworks: Vec<String>,
    pub package_manager: Option<String>,
    pub file_count: usize,
    pub total_lines: usize,
    /// Artifacts written before the summary itself
    pub artifact_count: usize,
    pub categories: Vec<CategoryResult>,
}

impl AnalysisSummary {
    pub fn new(
        context: &AnalysisContext,
        findings: &RepoFindings,
        entry: &RunHistoryEntry,
        overall_grade: Grade,
        artifact_count: usize,
    ) -> Self {
        Self {
            project: context.project_name.clone(),
            analyzed_at: entry.analyzed_at,
            overall_score: entry.overall_score,
            overall_grade,
            languages: context.languages.clone(),
            frameworks: context.frameworks.clone(),
            package_manager: context.package_manager.clone(),
            file_count: findings.file_count,
            total_lines: findings.total_lines,
            artifact_count,
            categories: entry.categories.clone(),
        }
    }
}

// =============================================================================
// Health report markdown
// =============================================================================

fn table_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn signed(delta: i32) -> String {
    if delta > 0 {
        format!("+{}", delta)
    } else {
        delta.to_string()
    }
}

/// Render the health report. Everything but the recommendations section is
/// derived from scores, so it is identical for identical inputs.
pub fn health_markdown(
    project: &str,
    entry: &RunHistoryEntry,
    previous: Option<&RunHistoryEntry>,
    weights: &Weights,
    recommendations: &str,
) -> String {
    let mut out = format!("# Health Report: {}\n\n", project);
    out.push_str(&format!(
        "Generated: {}\n\n",
        entry.analyzed_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    out.push_str(&format!(
        "**Overall score: {}/100 ({})**\n\n",
        entry.overall_score, entry.overall_grade
    ));

    out.push_str("## Category Scores\n\n");
    if entry.categories.is_empty() {
        out.push_str("No categories were analyzed.\n\n");
    } else {
        out.push_str("| Category | Score | Grade | Weight | Details |\n");
        out.push_str("|---|---|---|---|---|\n");
        for c in &entry.categories {
            out.push_str(&format!(
                "| {} | {} | {} | {:.1} | {} |\n",
                c.name,
                c.score,
                c.grade,
                weights.weight(&c.name),
                table_cell(&c.details)
            ));
        }
        out.push('\n');
    }

    out.push_str("## Trend\n\n");
    match previous {
        None => out.push_str("No previous run recorded.\n\n"),
        Some(prev) => {
            let cmp = history::compare(prev, entry);
            out.push_str(&format!(
                "Compared with the run on {}: overall {} -> {} ({}).\n\n",
                cmp.from_at.format("%Y-%m-%d %H:%M UTC"),
                cmp.from_score,
                cmp.to_score,
                signed(cmp.overall_delta)
            ));
            out.push_str("| Category | Previous | Current | Change |\n");
            out.push_str("|---|---|---|---|\n");
            for d in &cmp.categories {
                let show = |v: Option<i32>| v.map(|s| s.to_string()).unwrap_or_else(|| "-".into());
                out.push_str(&format!(
                    "| {} | {} | {} | {} |\n",
                    d.name,
                    show(d.from),
                    show(d.to),
                    d.delta.map(signed).unwrap_or_else(|| "-".into())
                ));
            }
            out.push('\n');
        }
    }

    out.push_str("## Recommendations\n\n");
    out.push_str(recommendations.trim());
    out.push('\n');
    out
}

// =============================================================================
// Pretty format
// =============================================================================

/// Print the run summary.
pub fn write_pretty(project_path: &str, output_dir: &str, outcome: &RunOutcome, min_score: Option<i32>) {
    println!();
    print!("  ");
    print!("{}", TOOL_NAME.cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Project: ".dimmed());
    println!("{}", project_path);
    print!("  {}", "Output:  ".dimmed());
    println!("{}", output_dir);
    println!();

    if !outcome.results.is_empty() {
        println!("  {}", "Categories:".bold());
        for c in &outcome.results {
            print!("    {:<16}", c.name);
            write_colored_score(c.score);
            print!("  ");
            write_colored_grade(c.grade);
            println!();
            if !c.details.is_empty() {
                println!("      {}", c.details.dimmed());
            }
        }
        println!();
    }

    if !outcome.failures.is_empty() {
        println!("  {} ({}):", "Failed engines".red().bold(), outcome.failures.len());
        for f in &outcome.failures {
            println!("    {:<16}{}", f.engine.red(), f.error);
        }
        println!();
    }

    if !outcome.degraded.is_empty() {
        println!(
            "  {} ({}): no generated content, placeholders written",
            "Degraded artifacts".yellow().bold(),
            outcome.degraded.len()
        );
        for path in &outcome.degraded {
            println!("    {}", path.yellow());
        }
        println!();
    }

    print!("  {}", format!("Artifacts: {}", outcome.files_written).dimmed());
    if !outcome.exported.is_empty() {
        print!("  {}", format!("Exported: {}", outcome.exported.len()).dimmed());
    }
    println!();

    if let Some(overall) = &outcome.overall {
        print!("  Overall: ");
        write_colored_score(overall.score);
        print!("  Grade: ");
        write_colored_grade(overall.grade);
        if let Some(min) = min_score {
            print!("  {}", format!("Minimum: {}", min).dimmed());
            print!("  ");
            if overall.score >= min {
                print!("{}", "PASSED".green());
            } else {
                print!("{}", "FAILED".red());
            }
        }
        println!();
    }
    println!();
}

fn write_colored_score(s: i32) {
    let text = format!("{:>3}", s);
    match s {
        s if s >= 90 => print!("{}", text.green().bold()),
        s if s >= 80 => print!("{}", text.green()),
        s if s >= 70 => print!("{}", text.yellow()),
        s if s >= 60 => print!("{}", text.yellow().bold()),
        _ => print!("{}", text.red()),
    }
}

fn write_colored_grade(grade: Grade) {
    let text = format!("{:<2}", grade.as_str());
    match grade {
        Grade::APlus | Grade::A | Grade::AMinus => print!("{}", text.green().bold()),
        Grade::BPlus | Grade::B | Grade::BMinus => print!("{}", text.green()),
        Grade::CPlus | Grade::C | Grade::CMinus => print!("{}", text.yellow()),
        Grade::DPlus | Grade::D | Grade::DMinus => print!("{}", text.yellow().bold()),
        Grade::F => print!("{}", text.red()),
    }
}

/// Print every ledger entry, oldest first.
pub fn write_history(entries: &[RunHistoryEntry]) {
    if entries.is_empty() {
        println!("No runs recorded.");
        return;
    }
    println!("  {} ({}):", "History".bold(), entries.len());
    for (i, e) in entries.iter().enumerate() {
        print!(
            "    {:>3}  {}  ",
            i,
            e.analyzed_at.format("%Y-%m-%d %H:%M:%S").to_string().dimmed()
        );
        write_colored_score(e.overall_score);
        println!("  {}", e.overall_grade);
    }
}

/// Print a comparison between two runs.
pub fn write_comparison(cmp: &HistoryComparison) {
    println!(
        "  {} {} -> {}",
        "Comparing".bold(),
        cmp.from_at.format("%Y-%m-%d %H:%M"),
        cmp.to_at.format("%Y-%m-%d %H:%M")
    );
    println!();
    print!("    {:<16}{:>3} -> {:>3}  ", "overall", cmp.from_score, cmp.to_score);
    write_delta(Some(cmp.overall_delta));
    println!();

    for d in &cmp.categories {
        let show = |v: Option<i32>| v.map(|s| format!("{:>3}", s)).unwrap_or_else(|| "  -".into());
        print!("    {:<16}{} -> {}  ", d.name, show(d.from), show(d.to));
        write_delta(d.delta);
        println!();
    }
}

fn write_delta(delta: Option<i32>) {
    match delta {
        Some(d) if d > 0 => print!("{}", signed(d).green()),
        Some(d) if d < 0 => print!("{}", signed(d).red()),
        Some(d) => print!("{}", signed(d).dimmed()),
        None => print!("{}", "new/removed".dimmed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(day: u32, overall: i32, categories: Vec<CategoryResult>) -> RunHistoryEntry {
        RunHistoryEntry {
            analyzed_at: Utc.with_ymd_and_hms(2026, 3, day, 12, 0, 0).unwrap(),
            overall_score: overall,
            overall_grade: crate::score::letter_grade(overall).to_string(),
            categories,
        }
    }

    #[test]
    fn test_health_markdown_first_run() {
        let current = entry(
            2,
            80,
            vec![CategoryResult::new("security", 80, "-10 no lockfile; -10 a|b")],
        );
        let md = health_markdown("demo", &current, None, &Weights::default(), "\n- Add a lockfile\n");

        assert!(md.starts_with("# Health Report: demo\n\nGenerated: 2026-03-02 12:00:00 UTC\n"));
        assert!(md.contains("**Overall score: 80/100 (B-)**"));
        assert!(md.contains("| security | 80 | B- | 1.5 | -10 no lockfile; -10 a\\|b |"));
        assert!(md.contains("No previous run recorded."));
        assert!(md.ends_with("## Recommendations\n\n- Add a lockfile\n"));
    }

    #[test]
    fn test_health_markdown_trend() {
        let previous = entry(1, 70, vec![CategoryResult::new("ci", 40, ""), CategoryResult::new("team", 50, "")]);
        let current = entry(2, 75, vec![CategoryResult::new("ci", 60, ""), CategoryResult::new("security", 90, "")]);
        let md = health_markdown("demo", &current, Some(&previous), &Weights::default(), "none");

        assert!(md.contains("overall 70 -> 75 (+5)"));
        assert!(md.contains("| ci | 40 | 60 | +20 |"));
        assert!(md.contains("| security | - | 90 | - |"));
        assert!(md.contains("| team | 50 | - | - |"));
    }

    #[test]
    fn test_summary_field_names() {
        let current = entry(2, 64, vec![CategoryResult::new("ci", 64, "")]);
        let mut context = AnalysisContext::new("demo");
        context.languages = vec!["Rust".into()];
        let findings = RepoFindings {
            file_count: 12,
            total_lines: 340,
            ..Default::default()
        };
        let summary = AnalysisSummary::new(&context, &findings, &current, Grade::D, 5);
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["project"], "demo");
        assert_eq!(json["overallScore"], 64);
        assert_eq!(json["overallGrade"], "D");
        assert_eq!(json["languages"][0], "Rust");
        assert_eq!(json["packageManager"], serde_json::Value::Null);
        assert_eq!(json["fileCount"], 12);
        assert_eq!(json["totalLines"], 340);
        assert_eq!(json["artifactCount"], 5);
        assert_eq!(json["categories"][0]["name"], "ci");
        assert!(json["analyzedAt"].is_string());
    }
}
