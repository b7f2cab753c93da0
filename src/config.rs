//! Configuration schema for repolens.
//!
//! Configuration is optional. Every field has a default, so an empty file (or
//! no file at all) yields a usable setup.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::BackendKind;
use crate::store::OutputFormat;

/// Configuration file names looked up in the analyzed project root.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["repolens.yaml", ".repolens.yaml"];

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Where artifacts are written, relative to the working directory
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    /// Glob patterns for paths to leave out of the analysis
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Exit non-zero when the overall score falls below this
    #[serde(default)]
    pub min_score: Option<i32>,
    #[serde(default)]
    pub backend: BackendConfig,
    /// Category weight overrides, merged over the built-in table
    #[serde(default)]
    pub weights: HashMap<String, f64>,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: OutputFormat::default(),
            ignore: Vec::new(),
            min_score: None,
            backend: BackendConfig::default(),
            weights: HashMap::new(),
            store: StoreConfig::default(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("repolens-output")
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::parse_str(&content)
    }

    /// Parse a configuration from YAML text. Blank text yields the defaults.
    pub fn parse_str(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load the configuration for a project.
    ///
    /// An explicit path must exist. Otherwise the project root is searched,
    /// then the user-level config directory; if nothing is found the
    /// defaults are returned.
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> anyhow::Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            let config = Self::parse_file(path)
                .map_err(|e| anyhow::anyhow!("failed to parse config {}: {}", path.display(), e))?;
            return Ok((config, Some(path.to_path_buf())));
        }

        let user_config = ProjectDirs::from("", "", "repolens")
            .map(|dirs| dirs.config_dir().join("config.yaml"));

        let candidates = DEFAULT_CONFIG_NAMES
            .iter()
            .map(|name| project_root.join(name))
            .chain(user_config);

        for path in candidates {
            if path.is_file() {
                let config = Self::parse_file(&path).map_err(|e| {
                    anyhow::anyhow!("failed to parse config {}: {}", path.display(), e)
                })?;
                return Ok((config, Some(path)));
            }
        }

        Ok((Self::default(), None))
    }
}

/// Settings for the generation backend adapter.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backends to probe, in priority order
    #[serde(default = "default_backends")]
    pub backends: Vec<BackendKind>,
    /// Model identifier passed to the backend (backend default when unset)
    #[serde(default)]
    pub model: Option<String>,
    /// Attempts per request before giving up (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay for exponential backoff in milliseconds (default: 2000)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Hard wall-clock limit per backend call in seconds (default: 180)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Prompts longer than this are truncated (default: 12000 chars)
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
    /// Pause between sequential batch calls in milliseconds (default: 1000)
    #[serde(default = "default_inter_call_delay_ms")]
    pub inter_call_delay_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backends: default_backends(),
            model: None,
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
            max_prompt_chars: default_max_prompt_chars(),
            inter_call_delay_ms: default_inter_call_delay_ms(),
        }
    }
}

fn default_backends() -> Vec<BackendKind> {
    vec![BackendKind::Claude, BackendKind::Gemini, BackendKind::Codex]
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    180
}

fn default_max_prompt_chars() -> usize {
    12_000
}

fn default_inter_call_delay_ms() -> u64 {
    1000
}

/// Artifact store policy data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Extensions treated as raw (non-prose) payloads
    #[serde(default = "default_raw_extensions")]
    pub raw_extensions: Vec<String>,
    /// Exact file names treated as raw payloads
    #[serde(default = "default_raw_file_names")]
    pub raw_file_names: Vec<String>,
    /// Files kept across a forced wipe of the output directory
    #[serde(default = "default_preserved_files")]
    pub preserved_files: Vec<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            raw_extensions: default_raw_extensions(),
            raw_file_names: default_raw_file_names(),
            preserved_files: default_preserved_files(),
        }
    }
}

fn default_raw_extensions() -> Vec<String> {
    [
        "yml", "yaml", "sh", "bash", "env", "toml", "ini", "cfg", "conf", "json", "dockerfile",
        "mmd", "http",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_raw_file_names() -> Vec<String> {
    ["Dockerfile", "Containerfile", ".env.example", "Makefile"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_preserved_files() -> Vec<String> {
    vec![crate::history::HISTORY_FILE.to_string()]
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.backend.max_attempts == 0 {
        anyhow::bail!("backend.max_attempts must be at least 1");
    }

    if config.backend.timeout_secs == 0 {
        anyhow::bail!("backend.timeout_secs must be at least 1");
    }

    if config.backend.max_prompt_chars < 256 {
        anyhow::bail!(
            "backend.max_prompt_chars must be at least 256, got {}",
            config.backend.max_prompt_chars
        );
    }

    for (name, weight) in &config.weights {
        if !weight.is_finite() || *weight <= 0.0 {
            anyhow::bail!("weight for category {:?} must be positive, got {}", name, weight);
        }
    }

    if let Some(min) = config.min_score {
        if !(0..=100).contains(&min) {
            anyhow::bail!("min_score must be between 0 and 100, got {}", min);
        }
    }

    for pattern in &config.ignore {
        globset::Glob::new(pattern)
            .map_err(|e| anyhow::anyhow!("invalid ignore pattern {:?}: {}", pattern, e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
output_dir: "reports"
format: html
ignore:
  - "**/fixtures/**"
backend:
  backends: [gemini]
  model: "gemini-2.5-pro"
  max_attempts: 5
weights:
  security: 3.0
"#;
        let config = Config::parse_str(yaml).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("reports"));
        assert_eq!(config.format, OutputFormat::Html);
        assert_eq!(config.ignore.len(), 1);
        assert_eq!(config.backend.backends, vec![BackendKind::Gemini]);
        assert_eq!(config.backend.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.backend.max_attempts, 5);
        // unspecified fields keep their defaults
        assert_eq!(config.backend.base_delay_ms, 2000);
        assert_eq!(config.weights.get("security"), Some(&3.0));
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = Config::parse_str("").unwrap();
        assert_eq!(config.output_dir, PathBuf::from("repolens-output"));
        assert_eq!(config.format, OutputFormat::Markdown);
        assert_eq!(config.backend.max_attempts, 3);
        assert!(config
            .store
            .preserved_files
            .contains(&crate::history::HISTORY_FILE.to_string()));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let yaml = "backend:\n  backends: [notepad]\n";
        assert!(Config::parse_str(yaml).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.backend.max_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.weights.insert("security".to_string(), -1.0);
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.ignore.push("[".to_string());
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.min_score = Some(120);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_load_discovers_project_config() {
        let temp = tempfile::TempDir::new().unwrap();
        fs::write(temp.path().join("repolens.yaml"), "format: json\n").unwrap();

        let (config, path) = Config::load(temp.path(), None).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(path, Some(temp.path().join("repolens.yaml")));
    }

    #[test]
    fn test_load_explicit_missing_fails() {
        let temp = tempfile::TempDir::new().unwrap();
        let missing = temp.path().join("nope.yaml");
        assert!(Config::load(temp.path(), Some(&missing)).is_err());
    }
}
