//! Generation backend adapter.
//!
//! Engines ask for prose, diagrams and config files through [`TextGenerator`].
//! The production implementation, [`GenerationBackend`], shells out to one of
//! several compatible CLI backends (claude, gemini, codex):
//!
//! - the first executable found on `PATH` wins, and the probe runs once per
//!   adapter
//! - every prompt is prefixed with an output-format hint and truncated to a
//!   bounded length
//! - failed calls are retried with exponential backoff
//! - output is sanitized before it is returned
//!
//! `generate` never fails. A missing backend yields [`UNAVAILABLE_MARKER`]
//! and exhausted retries yield a bracketed failure marker, so one bad call
//! cannot abort an engine or the run.

mod process;
pub mod sanitize;

pub use process::{BackendInvoker, Invocation, ProcessInvoker, RawOutput};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::BackendConfig;

/// Returned by `generate` when no backend executable could be found.
pub const UNAVAILABLE_MARKER: &str =
    "[Generation backend unavailable: install the claude, gemini or codex CLI to enable generated content]";

/// Appended to prompts that were cut to fit the argument size limit.
pub const TRUNCATION_MARKER: &str = "\n\n[... prompt truncated ...]";

/// Longest error excerpt embedded in a failure marker.
const MAX_ERROR_EXCERPT: usize = 200;

/// Errors from a single backend call. These never escape `generate`.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("backend executable not found: {0}")]
    NotFound(String),
    #[error("backend timed out after {secs:.1}s")]
    Timeout { secs: f64 },
    #[error("failed to run backend: {0}")]
    Spawn(String),
    #[error("backend exited with code {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },
    #[error("backend returned an empty response")]
    EmptyResponse,
}

/// The supported backend CLIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Claude,
    Gemini,
    Codex,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Claude => "claude",
            BackendKind::Gemini => "gemini",
            BackendKind::Codex => "codex",
        }
    }

    /// Executable name probed on `PATH`.
    pub fn executable(&self) -> &'static str {
        self.as_str()
    }

    /// Command-line arguments for a one-shot, read-only generation call.
    ///
    /// Each backend may read the project directory but is denied any
    /// file-writing capability.
    pub fn build_args(&self, prompt: &str, model: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = Vec::new();
        match self {
            BackendKind::Claude => {
                args.extend(["-p".to_string(), prompt.to_string()]);
                args.extend([
                    "--disallowedTools".to_string(),
                    "Edit,Write,MultiEdit,NotebookEdit".to_string(),
                ]);
                if let Some(m) = model {
                    args.extend(["--model".to_string(), m.to_string()]);
                }
            }
            BackendKind::Gemini => {
                args.extend(["-p".to_string(), prompt.to_string()]);
                args.extend(["--approval-mode".to_string(), "default".to_string()]);
                if let Some(m) = model {
                    args.extend(["-m".to_string(), m.to_string()]);
                }
            }
            BackendKind::Codex => {
                args.extend([
                    "exec".to_string(),
                    "--sandbox".to_string(),
                    "read-only".to_string(),
                ]);
                if let Some(m) = model {
                    args.extend(["-m".to_string(), m.to_string()]);
                }
                args.push(prompt.to_string());
            }
        }
        args
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A backend found during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovered {
    pub kind: BackendKind,
    pub path: PathBuf,
}

/// Probe `PATH` for the first available backend, in priority order.
pub fn discover(candidates: &[BackendKind]) -> Option<Discovered> {
    candidates.iter().find_map(|kind| {
        which::which(kind.executable())
            .ok()
            .map(|path| Discovered { kind: *kind, path })
    })
}

/// Output format requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputHint {
    Diagram,
    Json,
    Markdown,
}

impl OutputHint {
    /// Pick a hint by sniffing the prompt's leading paragraph, which holds
    /// the task. Project context after it often names files like
    /// `package.json` and must not change the format. Diagram wins over
    /// JSON, JSON over markdown.
    pub fn detect(prompt: &str) -> Self {
        let task = prompt.trim_start().split("\n\n").next().unwrap_or("");
        let lower = task.to_lowercase();
        if lower.contains("mermaid") || lower.contains("diagram") {
            OutputHint::Diagram
        } else if lower.contains("json") {
            OutputHint::Json
        } else {
            OutputHint::Markdown
        }
    }

    pub fn instructions(&self) -> &'static str {
        match self {
            OutputHint::Diagram => {
                "OUTPUT FORMAT: Respond with only the Mermaid diagram source. \
                 No prose, no explanations, no markdown fences."
            }
            OutputHint::Json => {
                "OUTPUT FORMAT: Respond with only valid JSON. \
                 No prose, no explanations, no markdown fences."
            }
            OutputHint::Markdown => {
                "OUTPUT FORMAT: Respond with only the final markdown document. \
                 Do not describe what you are doing or narrate your steps."
            }
        }
    }
}

/// Prefix a prompt with its format hint and bound its length.
pub fn shape_prompt(prompt: &str, max_chars: usize) -> String {
    let hint = OutputHint::detect(prompt);
    let body = if prompt.chars().count() > max_chars {
        let cut: String = prompt.chars().take(max_chars).collect();
        format!("{}{}", cut, TRUNCATION_MARKER)
    } else {
        prompt.to_string()
    };
    format!("{}\n\n{}", hint.instructions(), body)
}

/// Backoff before the attempt following `attempt` (1-based):
/// `base * 2^(attempt-1)`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    base.saturating_mul(factor)
}

/// Bracketed marker returned once every attempt has failed.
pub fn failure_marker(attempts: u32, error: &str) -> String {
    let excerpt: String = error.chars().take(MAX_ERROR_EXCERPT).collect();
    format!("[Generation failed after {} attempts: {}]", attempts, excerpt.trim())
}

/// Whether a string is one of the adapter's placeholder markers.
pub fn is_placeholder(text: &str) -> bool {
    text == UNAVAILABLE_MARKER || text.starts_with("[Generation failed after ")
}

/// Text generation as consumed by engines. Implementations must not fail:
/// problems are reported inside the returned text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> String;
}

/// Adapter over an external generation CLI.
pub struct GenerationBackend {
    config: BackendConfig,
    working_dir: PathBuf,
    invoker: Arc<dyn BackendInvoker>,
    discovery: OnceCell<Option<Discovered>>,
    model: Option<String>,
}

impl GenerationBackend {
    /// Create an adapter that spawns real backend processes in `working_dir`.
    pub fn new<P: AsRef<Path>>(config: BackendConfig, working_dir: P) -> Self {
        let model = config.model.clone();
        Self {
            config,
            working_dir: working_dir.as_ref().to_path_buf(),
            invoker: Arc::new(ProcessInvoker),
            discovery: OnceCell::new(),
            model,
        }
    }

    /// Replace the process invoker.
    pub fn with_invoker(mut self, invoker: Arc<dyn BackendInvoker>) -> Self {
        self.invoker = invoker;
        self
    }

    /// Skip probing and use the given discovery result.
    pub fn with_discovered(self, discovered: Option<Discovered>) -> Self {
        Self {
            discovery: OnceCell::with_value(discovered),
            ..self
        }
    }

    /// Set the model identifier used by every subsequent call.
    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model;
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// The discovered backend, probing on first use.
    pub fn backend(&self) -> Option<&Discovered> {
        self.discovery
            .get_or_init(|| {
                let found = discover(&self.config.backends);
                match &found {
                    Some(d) => info!(backend = %d.kind, path = %d.path.display(), "generation backend found"),
                    None => warn!("no generation backend found; generated content will be placeholders"),
                }
                found
            })
            .as_ref()
    }

    pub fn is_available(&self) -> bool {
        self.backend().is_some()
    }

    /// Run several prompts one after another with a fixed pause between
    /// calls. Keys map to their generated text.
    pub async fn generate_batch(&self, requests: Vec<(String, String)>) -> HashMap<String, String> {
        let delay = Duration::from_millis(self.config.inter_call_delay_ms);
        let mut results = HashMap::with_capacity(requests.len());

        for (index, (key, prompt)) in requests.into_iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(delay).await;
            }
            let text = self.generate(&prompt).await;
            results.insert(key, text);
        }

        results
    }

    /// One call: invoke, then classify and clean the output.
    async fn attempt(&self, backend: &Discovered, prompt: &str) -> Result<String, BackendError> {
        let invocation = Invocation {
            program: backend.path.clone(),
            args: backend.kind.build_args(prompt, self.model.as_deref()),
            working_dir: self.working_dir.clone(),
            timeout: Duration::from_secs(self.config.timeout_secs),
        };

        let output = self.invoker.invoke(&invocation).await?;

        if !output.success && output.stdout.trim().is_empty() {
            return Err(BackendError::Failed {
                code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let cleaned = sanitize::clean(&output.stdout);
        if cleaned.is_empty() {
            return Err(BackendError::EmptyResponse);
        }

        Ok(cleaned)
    }
}

#[async_trait]
impl TextGenerator for GenerationBackend {
    async fn generate(&self, prompt: &str) -> String {
        let backend = match self.backend() {
            Some(b) => b.clone(),
            None => return UNAVAILABLE_MARKER.to_string(),
        };

        let shaped = shape_prompt(prompt, self.config.max_prompt_chars);
        let max_attempts = self.config.max_attempts.max(1);
        let base = Duration::from_millis(self.config.base_delay_ms);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.attempt(&backend, &shaped).await {
                Ok(text) => {
                    debug!(attempt, chars = text.len(), "backend call succeeded");
                    return text;
                }
                Err(e) => {
                    warn!(attempt, max_attempts, error = %e, "backend call failed");
                    last_error = e.to_string();
                }
            }

            if attempt < max_attempts {
                tokio::time::sleep(backoff_delay(base, attempt)).await;
            }
        }

        failure_marker(max_attempts, &last_error)
    }
}
