//! Repolens - repository health analysis.
//!
//! Repolens scans a repository, scores it across several categories
//! (documentation, architecture, security, CI, testing, performance and
//! collaboration) and writes generated reports, diagrams and CI config into
//! an output directory. Generated prose comes from an external generation
//! CLI; scores come only from detected facts, so they are reproducible.
//!
//! # Architecture
//!
//! - `detect`: File walk and detectors producing [`RepoFindings`]
//! - `context`: Shared prompt context built from the findings
//! - `backend`: Adapter over the generation CLI (discovery, retry, cleanup)
//! - `engine`: One engine per category, each writing artifacts and a score
//! - `orchestrator`: Engine selection and sequencing
//! - `store`: Output directory, format normalization and export
//! - `history`: Run ledger and run comparison
//! - `score`: Grades, weights and the weighted overall score
//! - `report`: Health report, `analysis.json` and terminal output
//! - `config`: YAML configuration schema

pub mod backend;
pub mod cli;
pub mod config;
pub mod context;
pub mod detect;
pub mod engine;
pub mod history;
pub mod orchestrator;
pub mod progress;
pub mod report;
pub mod score;
pub mod store;

pub use backend::{GenerationBackend, TextGenerator};
pub use config::Config;
pub use context::AnalysisContext;
pub use detect::{IgnoreSet, RepoFindings};
pub use engine::{Engine, EngineError, EngineInput};
pub use history::{Ledger, RunHistoryEntry};
pub use orchestrator::{Orchestrator, RunOutcome, Selection};
pub use score::{CategoryResult, Grade, Weights};
pub use store::{ArtifactStore, OutputFormat};
