//! Run orchestration: engine selection and sequencing.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::backend::{is_placeholder, TextGenerator};
use crate::context::AnalysisContext;
use crate::detect::RepoFindings;
use crate::engine::{
    ApiTestsEngine, ArchitectureEngine, CiEngine, DocsEngine, Engine, EngineInput, HealthEngine,
    PerformanceEngine, SecurityEngine, TeamEngine,
};
use crate::progress::Progress;
use crate::score::{CategoryResult, Weights};
use crate::store::{ArtifactStore, StoreError};

/// Engines requested for a run. An empty selection means a full analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    requested: HashSet<String>,
}

impl Selection {
    /// Run every engine.
    pub fn full() -> Self {
        Self::default()
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            requested: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.requested.is_empty()
    }

    pub fn includes(&self, name: &str) -> bool {
        self.is_full() || self.requested.contains(name)
    }
}

/// An engine that failed; its category is left out of scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineFailure {
    pub engine: String,
    pub error: String,
}

/// Result of one run.
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// Category results in run order, excluding the aggregate
    pub results: Vec<CategoryResult>,
    /// Aggregate result, when the health engine ran
    pub overall: Option<CategoryResult>,
    pub failures: Vec<EngineFailure>,
    pub files_written: usize,
    /// Artifacts whose content is a backend placeholder
    pub degraded: Vec<String>,
    pub exported: Vec<PathBuf>,
}

impl RunOutcome {
    pub fn overall_score(&self) -> Option<i32> {
        self.overall.as_ref().map(|o| o.score)
    }
}

struct Registered {
    selected: bool,
    engine: Box<dyn Engine>,
}

/// Runs the selected engines one at a time, aggregate engines last.
pub struct Orchestrator {
    engines: Vec<Registered>,
    show_progress: bool,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    /// An orchestrator with no engines.
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
            show_progress: false,
        }
    }

    /// Every built-in engine, selected per `selection`.
    pub fn with_defaults(selection: &Selection, weights: Weights) -> Self {
        let engines: Vec<Box<dyn Engine>> = vec![
            Box::new(DocsEngine),
            Box::new(ArchitectureEngine),
            Box::new(SecurityEngine),
            Box::new(CiEngine),
            Box::new(ApiTestsEngine),
            Box::new(PerformanceEngine),
            Box::new(TeamEngine),
            Box::new(HealthEngine::new(weights)),
        ];
        let mut orchestrator = Self::new();
        for engine in engines {
            let selected = selection.includes(engine.name());
            orchestrator = orchestrator.register(engine, selected);
        }
        orchestrator
    }

    pub fn register(mut self, engine: Box<dyn Engine>, selected: bool) -> Self {
        self.engines.push(Registered { selected, engine });
        self
    }

    /// Show a spinner per engine.
    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Names of the engines that will run, in run order.
    pub fn planned(&self) -> Vec<&'static str> {
        self.run_order().map(|r| r.engine.name()).collect()
    }

    fn run_order(&self) -> impl Iterator<Item = &Registered> + '_ {
        let regular = self
            .engines
            .iter()
            .filter(|r| r.selected && !r.engine.is_aggregate());
        let aggregate = self
            .engines
            .iter()
            .filter(|r| r.selected && r.engine.is_aggregate());
        regular.chain(aggregate)
    }

    /// Initialize the store, run every selected engine and finalize the
    /// export.
    ///
    /// Store initialization failure aborts before any engine runs. An engine
    /// error is logged and recorded in [`RunOutcome::failures`]; the remaining
    /// engines still run.
    pub async fn run(
        &self,
        context: &AnalysisContext,
        findings: &RepoFindings,
        generator: &dyn TextGenerator,
        store: &mut ArtifactStore,
    ) -> Result<RunOutcome, StoreError> {
        store.initialize()?;

        let mut outcome = RunOutcome::default();
        for registered in self.run_order() {
            let engine = &registered.engine;
            let name = engine.name();
            let progress = Progress::spinner(self.show_progress, &format!("Running {} analysis...", name));
            tracing::info!(engine = name, "engine started");

            let input = EngineInput {
                context: context.clone(),
                findings,
                generator,
                prior_results: &outcome.results,
            };

            let result = engine.run(input, store).await;
            match result {
                Ok(result) => {
                    tracing::info!(engine = name, score = result.score, grade = %result.grade, "engine finished");
                    progress.finish_ok(&format!("{} {} ({})", name, result.score, result.grade));
                    if engine.is_aggregate() {
                        outcome.overall = Some(result);
                    } else {
                        outcome.results.push(result);
                    }
                }
                Err(e) => {
                    tracing::error!(engine = name, error = %e, "engine failed");
                    progress.finish_err(&format!("{} failed: {}", name, e));
                    outcome.failures.push(EngineFailure {
                        engine: name.to_string(),
                        error: e.to_string(),
                    });
                }
            }
        }

        outcome.files_written = store.file_count();
        outcome.degraded = store
            .written()
            .iter()
            .filter(|a| is_placeholder(a.content.trim()))
            .map(|a| a.path.clone())
            .collect();
        if !outcome.degraded.is_empty() {
            tracing::warn!(count = outcome.degraded.len(), "artifacts contain placeholder content");
        }
        outcome.exported = store.finalize(&context.project_name)?.to_vec();
        Ok(outcome)
    }
}
