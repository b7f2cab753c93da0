//! Command-line interface for repolens.

use clap::{Parser, Subcommand};
use colored::*;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::backend::GenerationBackend;
use crate::config::{self, Config};
use crate::context::AnalysisContext;
use crate::detect::{self, IgnoreSet};
use crate::history::Ledger;
use crate::orchestrator::{Orchestrator, Selection};
use crate::report;
use crate::score::{overall_score, Weights};
use crate::store::{ArtifactStore, OutputFormat};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Depth of the directory tree included in prompts.
const TREE_DEPTH: usize = 3;

/// Repository health analysis with generated documentation.
///
/// Repolens scans a repository, scores it across documentation,
/// architecture, security, CI, testing, performance and collaboration, and
/// writes generated reports, diagrams and CI config to an output directory.
#[derive(Parser)]
#[command(name = "repolens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors and skip the summary
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a repository
    #[command(visible_alias = "scan")]
    Analyze(AnalyzeArgs),
    /// Create a repolens config file from a template
    Init(InitArgs),
    /// List recorded runs
    History(HistoryArgs),
    /// Compare a recorded run with the latest one
    Compare(CompareArgs),
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Repository to analyze
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output directory (default: repolens-output)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Glob pattern to ignore (repeatable)
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Overwrite a non-empty output directory (run history is kept)
    #[arg(long)]
    pub force: bool,

    /// Path to config YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Model passed to the generation backend
    #[arg(short, long)]
    pub model: Option<String>,

    /// Exit non-zero if the overall score is below this
    #[arg(long)]
    pub min_score: Option<i32>,

    /// Run the documentation engine
    #[arg(long)]
    pub docs: bool,
    /// Run the architecture engine
    #[arg(long)]
    pub architecture: bool,
    /// Run the security engine
    #[arg(long)]
    pub security: bool,
    /// Run the CI/CD engine
    #[arg(long)]
    pub ci: bool,
    /// Run the API test engine
    #[arg(long)]
    pub api_tests: bool,
    /// Run the performance engine
    #[arg(long)]
    pub performance: bool,
    /// Run the team engine
    #[arg(long)]
    pub team: bool,
    /// Run the health engine
    #[arg(long)]
    pub health: bool,
}

impl AnalyzeArgs {
    /// Engines picked by flag. No flags means a full analysis.
    pub fn selection(&self) -> Selection {
        let flags = [
            ("docs", self.docs),
            ("architecture", self.architecture),
            ("security", self.security),
            ("ci", self.ci),
            ("api-tests", self.api_tests),
            ("performance", self.performance),
            ("team", self.team),
            ("health", self.health),
        ];
        Selection::only(flags.iter().filter(|(_, on)| *on).map(|(name, _)| *name))
    }
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "repolens.yaml")]
    pub output: PathBuf,

    /// Template to use
    #[arg(short, long, default_value = "default")]
    pub template: String,

    /// List available templates
    #[arg(short, long)]
    pub list: bool,
}

/// Arguments for the history command.
#[derive(Parser)]
pub struct HistoryArgs {
    /// Output directory holding the history (default: from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the compare command.
#[derive(Parser)]
pub struct CompareArgs {
    /// Output directory holding the history (default: from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Index of the earlier run (default: the run before the latest)
    #[arg(long)]
    pub from: Option<usize>,
}

/// Available config templates.
struct Template {
    name: &'static str,
    description: &'static str,
    content: &'static str,
}

/// All available templates.
static TEMPLATES: &[Template] = &[
    Template {
        name: "default",
        description: "All engines, markdown output, auto-detected backend",
        content: include_str!("templates/default.yaml"),
    },
    Template {
        name: "offline",
        description: "No generation backend: scores only, placeholder artifacts",
        content: include_str!("templates/offline.yaml"),
    },
];

/// Initialize the tracing subscriber. `REPOLENS_LOG` overrides the level.
pub fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("REPOLENS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Apply command-line overrides on top of the loaded config.
pub fn apply_overrides(config: &mut Config, args: &AnalyzeArgs) {
    if let Some(output) = &args.output {
        config.output_dir = output.clone();
    }
    if let Some(format) = args.format {
        config.format = format;
    }
    config.ignore.extend(args.ignore.iter().cloned());
    if args.min_score.is_some() {
        config.min_score = args.min_score;
    }
    if args.model.is_some() {
        config.backend.model = args.model.clone();
    }
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string())
}

/// Run the analyze command.
pub async fn run_analyze(args: &AnalyzeArgs, quiet: bool) -> anyhow::Result<i32> {
    // Resolve path
    let root = match args.path.canonicalize() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: cannot access path {:?}: {}", args.path, e);
            return Ok(EXIT_ERROR);
        }
    };
    if !root.is_dir() {
        eprintln!("Error: {} is not a directory", root.display());
        return Ok(EXIT_ERROR);
    }

    // Load and validate config
    let (mut config, source) = match Config::load(&root, args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    if let Some(source) = &source {
        tracing::debug!(path = %source.display(), "loaded config");
    }
    apply_overrides(&mut config, args);
    if let Err(e) = config::validate(&config) {
        eprintln!("Error: invalid config: {}", e);
        return Ok(EXIT_ERROR);
    }

    let ignore = IgnoreSet::new(&config.ignore)?.exclude_dir(&config.output_dir);

    // Detectors are blocking file system and git work
    let scan_root = root.clone();
    let scan_ignore = ignore.clone();
    let findings = tokio::task::spawn_blocking(move || {
        let mut findings = detect::scan(&scan_root, &scan_ignore);
        findings.git = detect::git_summary(&scan_root);
        findings
    })
    .await
    .map_err(|e| anyhow::anyhow!("repository scan failed: {}", e))?;

    let tree = detect::render_tree(&root, &ignore, TREE_DEPTH);
    let context = AnalysisContext::from_findings(project_name(&root), &findings, tree);

    let backend = GenerationBackend::new(config.backend.clone(), &root);
    if !backend.is_available() && !quiet {
        let names: Vec<&str> = config.backend.backends.iter().map(|b| b.as_str()).collect();
        eprintln!(
            "Note: no generation backend available (tried: {}); artifacts will contain placeholders",
            if names.is_empty() { "none".to_string() } else { names.join(", ") }
        );
    }

    let weights = Weights::with_overrides(&config.weights);
    let show_progress = !quiet && std::io::stderr().is_terminal();
    let orchestrator = Orchestrator::with_defaults(&args.selection(), weights.clone())
        .show_progress(show_progress);
    tracing::debug!(engines = ?orchestrator.planned(), "planned engines");

    if args.force && output_covers_project(&config.output_dir, &root) {
        eprintln!(
            "Error: refusing to wipe {}: it contains the analyzed project",
            config.output_dir.display()
        );
        return Ok(EXIT_ERROR);
    }

    let mut store = ArtifactStore::new(&config.output_dir, config.format, config.store.clone())
        .force(args.force);
    let outcome = match orchestrator.run(&context, &findings, &backend, &mut store).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    if !quiet {
        report::write_pretty(
            &args.path.to_string_lossy(),
            &config.output_dir.to_string_lossy(),
            &outcome,
            config.min_score,
        );
    }

    if let Some(min) = config.min_score {
        let overall = outcome
            .overall_score()
            .unwrap_or_else(|| overall_score(&outcome.results, &weights));
        if overall < min {
            return Ok(EXIT_FAILED);
        }
    }

    Ok(EXIT_SUCCESS)
}

/// Output directory for history commands: the flag, else the config in the
/// current directory, else the default.
fn history_dir(output: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(output) = output {
        return Ok(output.to_path_buf());
    }
    let (config, _) = Config::load(Path::new("."), None)?;
    Ok(config.output_dir)
}

/// Run the history command.
pub fn run_history(args: &HistoryArgs) -> anyhow::Result<i32> {
    let dir = history_dir(args.output.as_deref())?;
    let entries = Ledger::in_dir(&dir).load();
    report::write_history(&entries);
    Ok(EXIT_SUCCESS)
}

/// Run the compare command.
pub fn run_compare(args: &CompareArgs) -> anyhow::Result<i32> {
    let dir = history_dir(args.output.as_deref())?;
    let ledger = Ledger::in_dir(&dir);

    match ledger.compare(args.from) {
        Some(comparison) => report::write_comparison(&comparison),
        None => {
            let count = ledger.load().len();
            if count < 2 {
                println!("Need at least two recorded runs to compare ({} found).", count);
            } else {
                println!(
                    "Run {} is not earlier than the latest run (valid: 0..{}).",
                    args.from.unwrap_or_default(),
                    count - 1
                );
            }
        }
    }
    Ok(EXIT_SUCCESS)
}

/// Whether wiping `output` would also delete the project at `root`
/// (`root` must be canonical). A missing output directory covers nothing.
fn output_covers_project(output: &Path, root: &Path) -> bool {
    output
        .canonicalize()
        .map(|output| root.starts_with(output))
        .unwrap_or(false)
}

/// Run the init command: write an embedded config template to disk.
///
/// The template is parsed and validated before anything is written, and an
/// existing file is never replaced.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    if args.list {
        list_templates();
        return Ok(EXIT_SUCCESS);
    }

    let Some(template) = TEMPLATES.iter().find(|t| t.name == args.template) else {
        let names: Vec<&str> = TEMPLATES.iter().map(|t| t.name).collect();
        eprintln!(
            "Error: no config template named {:?} (available: {})",
            args.template,
            names.join(", ")
        );
        return Ok(EXIT_ERROR);
    };

    let config = Config::parse_str(template.content)
        .and_then(|parsed| config::validate(&parsed).map(|_| parsed))
        .map_err(|e| anyhow::anyhow!("built-in template {} is invalid: {}", template.name, e))?;

    if args.output.exists() {
        eprintln!(
            "Error: {} already exists; pass --output to write the config elsewhere",
            args.output.display()
        );
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| anyhow::anyhow!("cannot create {}: {}", parent.display(), e))?;
    }
    std::fs::write(&args.output, template.content)
        .map_err(|e| anyhow::anyhow!("cannot write {}: {}", args.output.display(), e))?;

    println!("Wrote {} ({} template)", args.output.display(), template.name);
    println!(
        "  output: {}  format: {}  backends: {}",
        config.output_dir.display(),
        config.format,
        if config.backend.backends.is_empty() {
            "none".to_string()
        } else {
            config
                .backend
                .backends
                .iter()
                .map(|b| b.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        }
    );
    println!("Analyze with: repolens analyze --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

fn list_templates() {
    println!("{}", "Config templates:".bold());
    for template in TEMPLATES {
        let marker = if template.name == "default" { "*" } else { " " };
        println!("  {} {:<12} {}", marker, template.name, template.description);
    }
    println!("{}", "(* used when --template is omitted)".dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_parse_and_validate() {
        for template in TEMPLATES {
            let config = Config::parse_str(template.content)
                .unwrap_or_else(|e| panic!("template {} does not parse: {}", template.name, e));
            config::validate(&config)
                .unwrap_or_else(|e| panic!("template {} is invalid: {}", template.name, e));
        }
        let offline = Config::parse_str(TEMPLATES[1].content).unwrap();
        assert!(offline.backend.backends.is_empty());
    }

    #[test]
    fn test_engine_flags_select_subset() {
        let cli = Cli::parse_from(["repolens", "analyze", ".", "--security", "--health"]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let selection = args.selection();
        assert!(selection.includes("security"));
        assert!(selection.includes("health"));
        assert!(!selection.includes("docs"));

        let cli = Cli::parse_from(["repolens", "analyze"]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert!(args.selection().is_full());
        assert_eq!(args.path, PathBuf::from("."));
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "repolens", "analyze", "--output", "out", "--format", "html", "--ignore", "gen/**",
            "--model", "sonnet", "--min-score", "70",
        ]);
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        let mut config = Config::parse_str("ignore: [\"dist/**\"]").unwrap();
        apply_overrides(&mut config, &args);

        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.format, OutputFormat::Html);
        assert_eq!(config.ignore, vec!["dist/**", "gen/**"]);
        assert_eq!(config.backend.model.as_deref(), Some("sonnet"));
        assert_eq!(config.min_score, Some(70));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = tempfile::TempDir::new().unwrap();
        let output = temp.path().join("repolens.yaml");
        let args = InitArgs {
            output: output.clone(),
            template: "offline".to_string(),
            list: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert!(output.exists());
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);

        let args = InitArgs {
            output: temp.path().join("other.yaml"),
            template: "nope".to_string(),
            list: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
        assert!(!temp.path().join("other.yaml").exists());
    }

    #[test]
    fn test_init_creates_parent_dirs() {
        let temp = tempfile::TempDir::new().unwrap();
        let output = temp.path().join("config/repolens.yaml");
        let args = InitArgs {
            output: output.clone(),
            template: "default".to_string(),
            list: false,
        };
        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        let written = Config::parse_file(&output).unwrap();
        assert_eq!(written.output_dir, PathBuf::from("repolens-output"));
    }

    #[test]
    fn test_force_guard_protects_project() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().join("project");
        std::fs::create_dir_all(root.join("src")).unwrap();
        let root = root.canonicalize().unwrap();

        // the project itself and any ancestor are refused
        assert!(output_covers_project(&root, &root));
        assert!(output_covers_project(temp.path(), &root));
        assert!(output_covers_project(&root.join("src/.."), &root));

        // a subdirectory, a sibling or a missing directory is fine
        assert!(!output_covers_project(&root.join("src"), &root));
        assert!(!output_covers_project(&temp.path().join("out"), &root));
        std::fs::create_dir_all(temp.path().join("out")).unwrap();
        assert!(!output_covers_project(&temp.path().join("out"), &root));
    }
}
